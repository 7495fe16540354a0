/*
    Gatesim
    https://github.com/gatesim/gatesim

    Copyright 2023-2025 The Gatesim Authors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    names.rs

    String interning table. Maps device, port and keyword names to small,
    stable integer IDs so the rest of the core can compare names by equality.

*/

use std::ops::Range;

use fxhash::FxHashMap;

/// Interned name identifier. IDs are assigned in insertion order, starting
/// at 0, and are never reused for the lifetime of the table.
pub type NameId = usize;

#[derive(Debug, Default)]
pub struct NameTable {
    names: Vec<String>,
    index: FxHashMap<String, NameId>,
    error_code_count: usize,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the ID for `name`, adding it to the table if absent.
    pub fn intern(&mut self, name: &str) -> NameId {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), id);
        id
    }

    /// Return the ID for `name` if it has been interned before.
    pub fn query(&self, name: &str) -> Option<NameId> {
        self.index.get(name).copied()
    }

    /// Return the string for `id`, or None if no such ID has been issued.
    pub fn get(&self, id: NameId) -> Option<&str> {
        self.names.get(id).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Hand out a batch of `n` integer codes, contiguous and disjoint from
    /// every batch issued before. Front ends that need stable numeric
    /// diagnostic codes reserve a batch once and keep the base.
    pub fn reserve_error_codes(&mut self, n: usize) -> Range<usize> {
        let base = self.error_code_count;
        self.error_code_count += n;
        base..self.error_code_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_stable() {
        let mut names = NameTable::new();
        let a = names.intern("SW1");
        let b = names.intern("CK");
        assert_ne!(a, b);
        assert_eq!(names.intern("SW1"), a);
        assert_eq!(names.intern("CK"), b);
        assert_eq!(names.get(a), Some("SW1"));
        assert_eq!(names.get(b), Some("CK"));
    }

    #[test]
    fn ids_are_insertion_ordered() {
        let mut names = NameTable::new();
        for (i, s) in ["a", "b", "c", "d"].iter().enumerate() {
            assert_eq!(names.intern(s), i);
        }
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn query_does_not_intern() {
        let mut names = NameTable::new();
        assert_eq!(names.query("missing"), None);
        assert_eq!(names.len(), 0);
        let id = names.intern("present");
        assert_eq!(names.query("present"), Some(id));
    }

    #[test]
    fn get_past_end_is_none() {
        let mut names = NameTable::new();
        names.intern("only");
        assert_eq!(names.get(1), None);
        assert_eq!(names.get(usize::MAX), None);
    }

    #[test]
    fn error_code_batches_are_disjoint() {
        let mut names = NameTable::new();
        let a = names.reserve_error_codes(6);
        let b = names.reserve_error_codes(5);
        let c = names.reserve_error_codes(3);
        assert_eq!(a, 0..6);
        assert_eq!(b, 6..11);
        assert_eq!(c, 11..14);
    }
}
