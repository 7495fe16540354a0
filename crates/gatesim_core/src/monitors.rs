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

    monitors.rs

    Dictionary of observed (device, output) points. Each monitor stores one
    sampled level per completed simulation cycle; monitors created mid-run
    are padded with BLANK so all histories align to absolute cycle indices.

*/

use std::{error::Error, fmt, fmt::Display};

use indexmap::IndexMap;

use crate::{
    devices::{Devices, PortId, Signal},
    names::{NameId, NameTable},
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MonitorError {
    NotOutput,
    MonitorPresent,
    DeviceAbsent,
}

impl Error for MonitorError {}
impl Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::NotOutput => write!(f, "Not a valid output."),
            MonitorError::MonitorPresent => write!(f, "This output is already being monitored."),
            MonitorError::DeviceAbsent => write!(f, "Device does not exist."),
        }
    }
}

#[derive(Default)]
pub struct Monitors {
    monitors: IndexMap<(NameId, PortId), Vec<Signal>>,
}

impl Monitors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }

    /// Start observing `device.port`. The history is pre-filled with
    /// `cycles_completed` BLANK entries so its indices line up with
    /// monitors created earlier.
    pub fn make_monitor(
        &mut self,
        devices: &Devices,
        device: NameId,
        port: PortId,
        cycles_completed: usize,
    ) -> Result<(), MonitorError> {
        let dev = devices.get(device).ok_or(MonitorError::DeviceAbsent)?;
        if !dev.outputs.contains_key(&port) {
            return Err(MonitorError::NotOutput);
        }
        if self.monitors.contains_key(&(device, port)) {
            return Err(MonitorError::MonitorPresent);
        }
        self.monitors
            .insert((device, port), vec![Signal::Blank; cycles_completed]);
        Ok(())
    }

    /// Stop observing `device.port`. Returns false if it was not monitored.
    pub fn remove_monitor(&mut self, device: NameId, port: PortId) -> bool {
        self.monitors.shift_remove(&(device, port)).is_some()
    }

    /// Append the current output level of every monitored point. Called
    /// once after each successful network execution.
    pub fn record_signals(&mut self, devices: &Devices) {
        for ((device, port), history) in self.monitors.iter_mut() {
            let level = devices
                .get(*device)
                .and_then(|dev| dev.output_level(*port))
                .unwrap_or(Signal::Blank);
            history.push(level.settled());
        }
    }

    /// Clear all histories, keeping the monitored points.
    pub fn reset_monitors(&mut self) {
        for history in self.monitors.values_mut() {
            history.clear();
        }
    }

    pub fn history(&self, device: NameId, port: PortId) -> Option<&[Signal]> {
        self.monitors.get(&(device, port)).map(|h| h.as_slice())
    }

    pub fn points(&self) -> impl Iterator<Item = (NameId, PortId)> + '_ {
        self.monitors.keys().copied()
    }

    /// Split every output in the network into monitored and unmonitored
    /// signal names, both in declaration order.
    pub fn get_signal_names(&self, names: &NameTable, devices: &Devices) -> (Vec<String>, Vec<String>) {
        let monitored = self
            .monitors
            .keys()
            .filter_map(|(dev, port)| devices.get_signal_name(names, *dev, *port))
            .collect();
        let mut unmonitored = Vec::new();
        for (id, dev) in devices.iter() {
            for port in dev.outputs.keys() {
                if !self.monitors.contains_key(&(id, *port)) {
                    if let Some(name) = devices.get_signal_name(names, id, *port) {
                        unmonitored.push(name);
                    }
                }
            }
        }
        (monitored, unmonitored)
    }

    /// Render all histories as a waveform trace: one line per monitor, the
    /// left-justified signal name followed by one glyph per cycle.
    pub fn display_signals(&self, names: &NameTable, devices: &Devices) -> String {
        let labels: Vec<String> = self
            .monitors
            .keys()
            .map(|(dev, port)| {
                devices
                    .get_signal_name(names, *dev, *port)
                    .unwrap_or_else(|| "?".to_string())
            })
            .collect();
        let width = labels.iter().map(|l| l.len()).max().unwrap_or(0);

        let mut out = String::new();
        for (label, history) in labels.iter().zip(self.monitors.values()) {
            out.push_str(&format!("{:<width$} ", label, width = width));
            for level in history {
                out.push(match level {
                    Signal::High => '‾',
                    Signal::Low => '_',
                    _ => ' ',
                });
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{DeviceKind, Qualifier};

    fn fixture() -> (NameTable, Devices, Monitors) {
        let mut names = NameTable::new();
        let mut devices = Devices::new(&mut names);
        let sw = names.intern("SW");
        let df = names.intern("DF");
        devices
            .make_device(sw, DeviceKind::Switch, Some(&Qualifier::new(1, "1")))
            .unwrap();
        devices.make_device(df, DeviceKind::DType, None).unwrap();
        (names, devices, Monitors::new())
    }

    #[test]
    fn monitor_creation_errors() {
        let (mut names, devices, mut monitors) = fixture();
        let sw = names.query("SW").unwrap();
        let df = names.query("DF").unwrap();
        let q = devices.q_id;
        let data = devices.data_id;
        let ghost = names.intern("GHOST");

        assert_eq!(
            monitors.make_monitor(&devices, ghost, None, 0),
            Err(MonitorError::DeviceAbsent)
        );
        // DATA is an input, not an output.
        assert_eq!(
            monitors.make_monitor(&devices, df, Some(data), 0),
            Err(MonitorError::NotOutput)
        );
        // A D-type has no unnamed output.
        assert_eq!(
            monitors.make_monitor(&devices, df, None, 0),
            Err(MonitorError::NotOutput)
        );
        assert_eq!(monitors.make_monitor(&devices, sw, None, 0), Ok(()));
        assert_eq!(
            monitors.make_monitor(&devices, sw, None, 0),
            Err(MonitorError::MonitorPresent)
        );
        assert_eq!(monitors.make_monitor(&devices, df, Some(q), 0), Ok(()));
        assert_eq!(monitors.len(), 2);
    }

    #[test]
    fn histories_align_on_late_creation() {
        let (names, devices, mut monitors) = fixture();
        let sw = names.query("SW").unwrap();
        let df = names.query("DF").unwrap();
        let q = devices.q_id;

        monitors.make_monitor(&devices, sw, None, 0).unwrap();
        for _ in 0..3 {
            monitors.record_signals(&devices);
        }
        // A monitor added after three cycles starts with three blanks.
        monitors.make_monitor(&devices, df, Some(q), 3).unwrap();
        monitors.record_signals(&devices);

        assert_eq!(
            monitors.history(sw, None).unwrap(),
            &[Signal::High, Signal::High, Signal::High, Signal::High]
        );
        assert_eq!(
            monitors.history(df, Some(q)).unwrap(),
            &[Signal::Blank, Signal::Blank, Signal::Blank, Signal::Low]
        );
    }

    #[test]
    fn remove_and_reset() {
        let (names, devices, mut monitors) = fixture();
        let sw = names.query("SW").unwrap();
        monitors.make_monitor(&devices, sw, None, 0).unwrap();
        monitors.record_signals(&devices);
        assert_eq!(monitors.history(sw, None).unwrap().len(), 1);

        monitors.reset_monitors();
        assert_eq!(monitors.history(sw, None).unwrap().len(), 0);
        assert_eq!(monitors.len(), 1);

        assert!(monitors.remove_monitor(sw, None));
        assert!(!monitors.remove_monitor(sw, None));
        assert!(monitors.is_empty());
    }

    #[test]
    fn signal_name_partition() {
        let (names, devices, mut monitors) = fixture();
        let df = names.query("DF").unwrap();
        let q = devices.q_id;
        monitors.make_monitor(&devices, df, Some(q), 0).unwrap();
        let (monitored, unmonitored) = monitors.get_signal_names(&names, &devices);
        assert_eq!(monitored, vec!["DF.Q"]);
        assert_eq!(unmonitored, vec!["SW", "DF.QBAR"]);
    }

    #[test]
    fn trace_rendering() {
        let (names, devices, mut monitors) = fixture();
        let sw = names.query("SW").unwrap();
        let df = names.query("DF").unwrap();
        let q = devices.q_id;

        monitors.make_monitor(&devices, sw, None, 0).unwrap();
        monitors.record_signals(&devices);
        monitors.record_signals(&devices);
        monitors.make_monitor(&devices, df, Some(q), 2).unwrap();
        monitors.record_signals(&devices);

        let trace = monitors.display_signals(&names, &devices);
        let lines: Vec<&str> = trace.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "SW   ‾‾‾");
        assert_eq!(lines[1], "DF.Q   _");
    }
}
