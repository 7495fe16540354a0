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

    scanner.rs

    Reads a circuit definition source and translates it into a stream of
    tagged symbols, skipping whitespace and comments. Also renders the
    line-plus-caret reports used by the parser's diagnostics.

*/

use std::{
    fs::File,
    io::{self, BufReader, Cursor, Read, Seek, SeekFrom},
    path::Path,
};

use crate::names::{NameId, NameTable};

/// Any seekable byte stream can back a scanner. Files are wrapped in a
/// BufReader; tests use an in-memory cursor.
pub trait SourceStream: Read + Seek {}
impl<T: Read + Seek> SourceStream for T {}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SymbolKind {
    Name,
    Keyword,
    Number,
    Comma,
    Semicolon,
    Arrow,
    Equals,
    Period,
    Eof,
    Invalid,
}

/// A token, carrying enough source position to reprint its line.
///
/// `position` is the absolute byte offset just past the symbol;
/// `column` is `position - line_start`. The literal text is preserved
/// verbatim, which matters for NUMBER tokens used as signal generator
/// waveforms where a leading zero is significant.
#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub kind: SymbolKind,
    pub id: Option<NameId>,
    pub value: Option<u64>,
    pub literal: String,
    pub line: usize,
    pub line_start: u64,
    pub position: u64,
    pub column: usize,
}

impl Symbol {
    pub fn is(&self, kind: SymbolKind) -> bool {
        self.kind == kind
    }

    pub fn is_keyword(&self, id: NameId) -> bool {
        self.kind == SymbolKind::Keyword && self.id == Some(id)
    }

    pub fn is_eof(&self) -> bool {
        self.kind == SymbolKind::Eof
    }

    /// Column of the symbol's first character, used for caret placement.
    fn start_column(&self) -> usize {
        self.column.saturating_sub(self.literal.len())
    }
}

/// IDs of all reserved words, pre-interned at scanner construction so the
/// parser can compare keywords by equality.
pub struct Keywords {
    pub start: NameId,
    pub end: NameId,
    pub devices: NameId,
    pub connections: NameId,
    pub monitors: NameId,
    pub ip: NameId,
    pub init: NameId,
    pub cycles: NameId,
    pub sig: NameId,
    pub clock: NameId,
    pub switch: NameId,
    pub and: NameId,
    pub nand: NameId,
    pub or: NameId,
    pub nor: NameId,
    pub dtype: NameId,
    pub xor: NameId,
    pub siggen: NameId,
    pub q: NameId,
    pub qbar: NameId,
    pub data: NameId,
    pub clk: NameId,
    pub set: NameId,
    pub clear: NameId,
    all: Vec<NameId>,
}

impl Keywords {
    fn new(names: &mut NameTable) -> Self {
        let mut all = Vec::with_capacity(24);
        let mut intern = |s: &str| {
            let id = names.intern(s);
            all.push(id);
            id
        };
        let start = intern("START");
        let end = intern("END");
        let devices = intern("DEVICES");
        let connections = intern("CONNECTIONS");
        let monitors = intern("MONITORS");
        let ip = intern("ip");
        let init = intern("init");
        let cycles = intern("cycles");
        let sig = intern("sig");
        let clock = intern("CLOCK");
        let switch = intern("SWITCH");
        let and = intern("AND");
        let nand = intern("NAND");
        let or = intern("OR");
        let nor = intern("NOR");
        let dtype = intern("DTYPE");
        let xor = intern("XOR");
        let siggen = intern("SIGGEN");
        let q = intern("Q");
        let qbar = intern("QBAR");
        let data = intern("DATA");
        let clk = intern("CLK");
        let set = intern("SET");
        let clear = intern("CLEAR");
        Self {
            start,
            end,
            devices,
            connections,
            monitors,
            ip,
            init,
            cycles,
            sig,
            clock,
            switch,
            and,
            nand,
            or,
            nor,
            dtype,
            xor,
            siggen,
            q,
            qbar,
            data,
            clk,
            set,
            clear,
            all,
        }
    }

    pub fn contains(&self, id: NameId) -> bool {
        self.all.contains(&id)
    }
}

pub struct Scanner {
    source: Box<dyn SourceStream>,
    /// Absolute byte offset of the next unread byte.
    offset: u64,
    /// Current 1-based line number.
    line: usize,
    /// Byte offset of the start of the current line.
    line_start: u64,
    pub keywords: Keywords,
}

impl Scanner {
    pub fn from_path<P: AsRef<Path>>(path: P, names: &mut NameTable) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(Box::new(BufReader::new(file)), names))
    }

    pub fn from_source(text: &str, names: &mut NameTable) -> Self {
        Self::new(Box::new(Cursor::new(text.as_bytes().to_vec())), names)
    }

    fn new(source: Box<dyn SourceStream>, names: &mut NameTable) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            line_start: 0,
            keywords: Keywords::new(names),
        }
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        if self.source.read(&mut buf)? == 0 {
            return Ok(None);
        }
        self.offset += 1;
        Ok(Some(buf[0]))
    }

    fn unread_byte(&mut self) -> io::Result<()> {
        self.source.seek(SeekFrom::Current(-1))?;
        self.offset -= 1;
        Ok(())
    }

    fn newline(&mut self) {
        self.line += 1;
        self.line_start = self.offset;
    }

    /// Skip whitespace and comments. Returns the first byte of the next
    /// token, consumed, or None at end of input.
    fn skip_to_token(&mut self) -> io::Result<Option<u8>> {
        loop {
            let b = match self.read_byte()? {
                Some(b) => b,
                None => return Ok(None),
            };
            match b {
                b'\n' => self.newline(),
                b if b.is_ascii_whitespace() => {}
                b'/' => match self.read_byte()? {
                    Some(b'/') => self.skip_line_comment()?,
                    Some(b'*') => {
                        if !self.skip_block_comment()? {
                            return Ok(None);
                        }
                    }
                    Some(_) => {
                        // A lone slash is not a comment opener.
                        self.unread_byte()?;
                        return Ok(Some(b'/'));
                    }
                    None => return Ok(Some(b'/')),
                },
                b => return Ok(Some(b)),
            }
        }
    }

    fn skip_line_comment(&mut self) -> io::Result<()> {
        loop {
            match self.read_byte()? {
                Some(b'\n') => {
                    self.newline();
                    return Ok(());
                }
                Some(_) => {}
                None => return Ok(()),
            }
        }
    }

    /// Skip a `/* ... */` block comment, counting embedded newlines.
    /// Returns false if the comment runs to end of input unterminated.
    fn skip_block_comment(&mut self) -> io::Result<bool> {
        let open_line = self.line;
        let mut star = false;
        loop {
            match self.read_byte()? {
                Some(b'*') => star = true,
                Some(b'/') if star => return Ok(true),
                Some(b) => {
                    if b == b'\n' {
                        self.newline();
                    }
                    star = false;
                }
                None => {
                    log::warn!("block comment opened on line {} is never closed", open_line);
                    return Ok(false);
                }
            }
        }
    }

    /// Translate the next run of characters into a symbol. Once the input is
    /// exhausted, every subsequent call keeps returning EOF.
    pub fn next_symbol(&mut self, names: &mut NameTable) -> io::Result<Symbol> {
        let first = match self.skip_to_token()? {
            Some(b) => b,
            None => return Ok(self.make_symbol(SymbolKind::Eof, String::new())),
        };

        if first.is_ascii_alphabetic() {
            let word = self.scan_word(first)?;
            let id = names.intern(&word);
            let kind = if self.keywords.contains(id) {
                SymbolKind::Keyword
            } else {
                SymbolKind::Name
            };
            let mut sym = self.make_symbol(kind, word);
            sym.id = Some(id);
            return Ok(sym);
        }

        if first.is_ascii_digit() {
            let digits = self.scan_digits(first)?;
            // Waveform literals can be longer than any integer type; the
            // literal text is authoritative, the value is best-effort.
            let value = digits.parse::<u64>().unwrap_or(u64::MAX);
            let mut sym = self.make_symbol(SymbolKind::Number, digits);
            sym.value = Some(value);
            return Ok(sym);
        }

        let sym = match first {
            b'=' => self.make_symbol(SymbolKind::Equals, "=".to_string()),
            b',' => self.make_symbol(SymbolKind::Comma, ",".to_string()),
            b';' => self.make_symbol(SymbolKind::Semicolon, ";".to_string()),
            b'.' => self.make_symbol(SymbolKind::Period, ".".to_string()),
            b'-' => match self.read_byte()? {
                Some(b'>') => self.make_symbol(SymbolKind::Arrow, "->".to_string()),
                Some(_) => {
                    self.unread_byte()?;
                    self.make_symbol(SymbolKind::Invalid, "-".to_string())
                }
                None => self.make_symbol(SymbolKind::Invalid, "-".to_string()),
            },
            b => self.make_symbol(SymbolKind::Invalid, (b as char).to_string()),
        };
        Ok(sym)
    }

    fn scan_word(&mut self, first: u8) -> io::Result<String> {
        let mut word = String::new();
        word.push(first as char);
        loop {
            match self.read_byte()? {
                Some(b) if b.is_ascii_alphanumeric() => word.push(b as char),
                Some(_) => {
                    self.unread_byte()?;
                    return Ok(word);
                }
                None => return Ok(word),
            }
        }
    }

    fn scan_digits(&mut self, first: u8) -> io::Result<String> {
        let mut digits = String::new();
        digits.push(first as char);
        loop {
            match self.read_byte()? {
                Some(b) if b.is_ascii_digit() => digits.push(b as char),
                Some(_) => {
                    self.unread_byte()?;
                    return Ok(digits);
                }
                None => return Ok(digits),
            }
        }
    }

    fn make_symbol(&self, kind: SymbolKind, literal: String) -> Symbol {
        Symbol {
            kind,
            id: None,
            value: None,
            literal,
            line: self.line,
            line_start: self.line_start,
            position: self.offset,
            column: (self.offset - self.line_start) as usize,
        }
    }

    /// Render the source line of `primary` followed by a caret line marking
    /// `primary` and, if given, `secondary` (leftmost caret first). The
    /// scanner's read offset is restored to `current.position` on return,
    /// so tokenisation resumes where it left off.
    pub fn error_report(
        &mut self,
        current: &Symbol,
        primary: &Symbol,
        secondary: Option<&Symbol>,
    ) -> io::Result<String> {
        self.source.seek(SeekFrom::Start(primary.line_start))?;

        let mut text = String::new();
        let mut buf = [0u8; 1];
        loop {
            if self.source.read(&mut buf)? == 0 {
                break;
            }
            match buf[0] {
                b'\n' | b'\r' => break,
                b => text.push(b as char),
            }
        }

        let mut cols: Vec<usize> = Vec::with_capacity(2);
        cols.push(primary.start_column());
        if let Some(sec) = secondary {
            let col = sec.start_column();
            if col != cols[0] {
                cols.push(col);
            }
        }
        cols.sort_unstable();

        let mut carets = String::new();
        let mut cursor = 0;
        for col in cols {
            for _ in cursor..col {
                carets.push(' ');
            }
            carets.push('^');
            cursor = col + 1;
        }

        self.source.seek(SeekFrom::Start(current.position))?;
        self.offset = current.position;

        Ok(format!("{}\n{}", text, carets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(text: &str) -> (Vec<Symbol>, NameTable) {
        let mut names = NameTable::new();
        let mut scanner = Scanner::from_source(text, &mut names);
        let mut symbols = Vec::new();
        loop {
            let sym = scanner.next_symbol(&mut names).unwrap();
            let eof = sym.is_eof();
            symbols.push(sym);
            if eof {
                break;
            }
        }
        (symbols, names)
    }

    fn kinds(symbols: &[Symbol]) -> Vec<SymbolKind> {
        symbols.iter().map(|s| s.kind).collect()
    }

    #[test]
    fn scans_a_device_line() {
        let (syms, names) = scan_all("SW1 = SWITCH, init = 0;");
        assert_eq!(
            kinds(&syms),
            vec![
                SymbolKind::Name,
                SymbolKind::Equals,
                SymbolKind::Keyword,
                SymbolKind::Comma,
                SymbolKind::Keyword,
                SymbolKind::Equals,
                SymbolKind::Number,
                SymbolKind::Semicolon,
                SymbolKind::Eof,
            ]
        );
        assert_eq!(names.get(syms[0].id.unwrap()), Some("SW1"));
        assert_eq!(names.get(syms[2].id.unwrap()), Some("SWITCH"));
        assert_eq!(syms[6].value, Some(0));
    }

    #[test]
    fn keywords_compare_by_id() {
        let mut names = NameTable::new();
        let mut scanner = Scanner::from_source("START DEVICES END", &mut names);
        let start = scanner.next_symbol(&mut names).unwrap();
        let devices = scanner.next_symbol(&mut names).unwrap();
        let end = scanner.next_symbol(&mut names).unwrap();
        assert!(start.is_keyword(scanner.keywords.start));
        assert!(devices.is_keyword(scanner.keywords.devices));
        assert!(end.is_keyword(scanner.keywords.end));
    }

    #[test]
    fn number_literal_preserves_leading_zeros() {
        let (syms, _) = scan_all("sig = 0101");
        assert_eq!(syms[2].kind, SymbolKind::Number);
        assert_eq!(syms[2].literal, "0101");
        assert_eq!(syms[2].value, Some(101));
    }

    #[test]
    fn arrow_and_bare_dash() {
        let (syms, _) = scan_all("a -> b - c");
        assert_eq!(
            kinds(&syms),
            vec![
                SymbolKind::Name,
                SymbolKind::Arrow,
                SymbolKind::Name,
                SymbolKind::Invalid,
                SymbolKind::Name,
                SymbolKind::Eof,
            ]
        );
        assert_eq!(syms[1].literal, "->");
    }

    #[test]
    fn unknown_bytes_are_invalid() {
        let (syms, _) = scan_all("a ? b");
        assert_eq!(syms[1].kind, SymbolKind::Invalid);
        assert_eq!(syms[1].literal, "?");
    }

    #[test]
    fn lone_slash_is_invalid() {
        let (syms, _) = scan_all("a / b");
        assert_eq!(syms[1].kind, SymbolKind::Invalid);
        assert_eq!(syms[1].literal, "/");
    }

    #[test]
    fn line_comments_are_skipped() {
        let (syms, _) = scan_all("a // the rest is noise ;=,\nb");
        assert_eq!(
            kinds(&syms),
            vec![SymbolKind::Name, SymbolKind::Name, SymbolKind::Eof]
        );
        assert_eq!(syms[1].line, 2);
    }

    #[test]
    fn block_comments_track_lines() {
        let (syms, _) = scan_all("a /* one\ntwo\nthree */ b");
        assert_eq!(
            kinds(&syms),
            vec![SymbolKind::Name, SymbolKind::Name, SymbolKind::Eof]
        );
        assert_eq!(syms[0].line, 1);
        assert_eq!(syms[1].line, 3);
    }

    #[test]
    fn unterminated_block_comment_yields_eof() {
        let (syms, _) = scan_all("a /* never closed");
        assert_eq!(kinds(&syms), vec![SymbolKind::Name, SymbolKind::Eof]);
    }

    #[test]
    fn eof_is_sticky() {
        let mut names = NameTable::new();
        let mut scanner = Scanner::from_source("x", &mut names);
        assert_eq!(
            scanner.next_symbol(&mut names).unwrap().kind,
            SymbolKind::Name
        );
        for _ in 0..3 {
            assert!(scanner.next_symbol(&mut names).unwrap().is_eof());
        }
    }

    #[test]
    fn tokens_are_insensitive_to_whitespace_and_comments() {
        let plain = "START DEVICES; G1 = AND, ip = 2; END DEVICES;";
        let noisy = "START\t  DEVICES ;// c\n G1/* x\ny */ = AND , ip=2 ;\nEND DEVICES;";
        let (a, names_a) = scan_all(plain);
        let (b, names_b) = scan_all(noisy);
        assert_eq!(kinds(&a), kinds(&b));
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.literal, y.literal);
            let sx = x.id.map(|id| names_a.get(id).unwrap());
            let sy = y.id.map(|id| names_b.get(id).unwrap());
            assert_eq!(sx, sy);
        }
    }

    #[test]
    fn symbol_positions_locate_the_line() {
        let (syms, _) = scan_all("ab cd\nefgh ij");
        // "cd" ends at offset 5, line 1 starting at 0.
        assert_eq!(syms[1].line, 1);
        assert_eq!(syms[1].position, 5);
        assert_eq!(syms[1].column, 5);
        // "efgh" is on line 2, which starts at offset 6.
        assert_eq!(syms[2].line, 2);
        assert_eq!(syms[2].line_start, 6);
        assert_eq!(syms[2].column, 4);
    }

    #[test]
    fn error_report_draws_carets_and_restores_position() {
        let mut names = NameTable::new();
        let mut scanner = Scanner::from_source("SW = WIDGET;\nCK = CLOCK;", &mut names);
        let mut syms = Vec::new();
        for _ in 0..3 {
            syms.push(scanner.next_symbol(&mut names).unwrap());
        }
        // Current symbol is WIDGET; underline SW and WIDGET on line 1.
        let report = scanner
            .error_report(&syms[2], &syms[0], Some(&syms[2]))
            .unwrap();
        assert_eq!(report, "SW = WIDGET;\n^    ^");

        // Scanning resumes where it left off.
        let next = scanner.next_symbol(&mut names).unwrap();
        assert_eq!(next.kind, SymbolKind::Semicolon);
        assert_eq!(next.line, 1);
    }

    #[test]
    fn error_report_single_caret() {
        let mut names = NameTable::new();
        let mut scanner = Scanner::from_source("END DEVICE;", &mut names);
        let _end = scanner.next_symbol(&mut names).unwrap();
        let device = scanner.next_symbol(&mut names).unwrap();
        let report = scanner.error_report(&device, &device, None).unwrap();
        assert_eq!(report, "END DEVICE;\n    ^");
    }

    #[test]
    fn error_report_orders_carets_by_column() {
        let mut names = NameTable::new();
        let mut scanner = Scanner::from_source("a -> b;", &mut names);
        let a = scanner.next_symbol(&mut names).unwrap();
        let _arrow = scanner.next_symbol(&mut names).unwrap();
        let b = scanner.next_symbol(&mut names).unwrap();
        // Secondary given first; carets still print left to right.
        let report = scanner.error_report(&b, &b, Some(&a)).unwrap();
        assert_eq!(report, "a -> b;\n^    ^");
    }
}
