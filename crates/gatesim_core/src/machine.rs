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

    machine.rs

    The simulation driver. Owns the name table, device catalogue, network
    and monitors, and exposes the run/continue/reset operations a front end
    drives, along with switch toggling and monitor management between runs.

*/

use std::{error::Error, fmt, fmt::Display, io, path::Path};

use crate::{
    devices::{Devices, Signal},
    monitors::{MonitorError, Monitors},
    names::NameTable,
    network::Network,
    parser::{ParseReport, Parser},
    scanner::Scanner,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RunError {
    /// The combinational network failed to settle; `cycle` is the 1-based
    /// cycle at which the fixed-point bound was exceeded.
    Oscillation { cycle: usize },
    /// `continue` was requested before any successful `run`.
    NothingToContinue,
}

impl Error for RunError {}
impl Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Oscillation { cycle } => {
                write!(f, "The network is oscillating (cycle {}).", cycle)
            }
            RunError::NothingToContinue => write!(f, "Nothing to continue. Run first."),
        }
    }
}

pub struct Machine {
    names: NameTable,
    devices: Devices,
    network: Network,
    monitors: Monitors,
    cycles_completed: usize,
}

impl Machine {
    pub fn new() -> Self {
        let mut names = NameTable::new();
        let devices = Devices::new(&mut names);
        Self {
            names,
            devices,
            network: Network::new(),
            monitors: Monitors::new(),
            cycles_completed: 0,
        }
    }

    pub fn names(&self) -> &NameTable {
        &self.names
    }

    pub fn devices(&self) -> &Devices {
        &self.devices
    }

    pub fn devices_mut(&mut self) -> &mut Devices {
        &mut self.devices
    }

    pub fn monitors(&self) -> &Monitors {
        &self.monitors
    }

    pub fn cycles_completed(&self) -> usize {
        self.cycles_completed
    }

    /// Make clock phases reproducible across cold startups.
    pub fn seed_random(&mut self, seed: u64) {
        self.devices.seed_random(seed);
    }

    /// Compile a circuit definition file into this machine. A machine is
    /// built from exactly one file; create a fresh one to load another.
    pub fn load_path<P: AsRef<Path>>(&mut self, path: P) -> io::Result<ParseReport> {
        let mut scanner = Scanner::from_path(path, &mut self.names)?;
        self.parse_with(&mut scanner)
    }

    pub fn load_source(&mut self, source: &str) -> io::Result<ParseReport> {
        let mut scanner = Scanner::from_source(source, &mut self.names);
        self.parse_with(&mut scanner)
    }

    fn parse_with(&mut self, scanner: &mut Scanner) -> io::Result<ParseReport> {
        let mut parser = Parser::new(
            &mut self.names,
            &mut self.devices,
            &mut self.network,
            &mut self.monitors,
            scanner,
        );
        parser.parse_network()?;
        Ok(parser.into_report())
    }

    /// Run the simulation from a cold start: histories are cleared, all
    /// stateful devices re-seeded, then `cycles` cycles executed with every
    /// monitor sampling each one.
    pub fn run(&mut self, cycles: usize) -> Result<(), RunError> {
        self.monitors.reset_monitors();
        self.devices.cold_startup();
        self.cycles_completed = 0;
        log::debug!("running {} cycle(s) from cold start", cycles);
        self.step(cycles)
    }

    /// Advance `cycles` more cycles from the current state, appending to
    /// the existing histories.
    pub fn run_continue(&mut self, cycles: usize) -> Result<(), RunError> {
        if self.cycles_completed == 0 {
            return Err(RunError::NothingToContinue);
        }
        log::debug!("continuing for {} cycle(s)", cycles);
        self.step(cycles)
    }

    fn step(&mut self, cycles: usize) -> Result<(), RunError> {
        for _ in 0..cycles {
            if !self.network.execute_network(&mut self.devices) {
                return Err(RunError::Oscillation {
                    cycle: self.cycles_completed + 1,
                });
            }
            self.monitors.record_signals(&self.devices);
            self.cycles_completed += 1;
        }
        Ok(())
    }

    /// Set a switch by name. The new level takes effect from the next
    /// executed cycle. Returns false for unknown names or non-switches.
    pub fn set_switch(&mut self, name: &str, on: bool) -> bool {
        match self.names.query(name) {
            Some(id) => self.devices.set_switch(id, Signal::from_bit(on)),
            None => false,
        }
    }

    /// Start monitoring `dev` or `dev.PORT`. The new history is aligned to
    /// the absolute cycle count with BLANK padding.
    pub fn add_monitor(&mut self, signal: &str) -> Result<(), MonitorError> {
        let (device, port) = self
            .devices
            .get_signal_ids(&self.names, signal)
            .ok_or(MonitorError::DeviceAbsent)?;
        self.monitors
            .make_monitor(&self.devices, device, port, self.cycles_completed)
    }

    pub fn remove_monitor(&mut self, signal: &str) -> bool {
        match self.devices.get_signal_ids(&self.names, signal) {
            Some((device, port)) => self.monitors.remove_monitor(device, port),
            None => false,
        }
    }

    /// Clear all histories and the cycle counter, leaving the circuit and
    /// the monitored points in place.
    pub fn reset(&mut self) {
        self.monitors.reset_monitors();
        self.cycles_completed = 0;
    }

    /// Render the monitored waveforms as a textual trace.
    pub fn trace(&self) -> String {
        self.monitors.display_signals(&self.names, &self.devices)
    }

    /// Monitored and unmonitored signal names, in declaration order.
    pub fn signal_names(&self) -> (Vec<String>, Vec<String>) {
        self.monitors.get_signal_names(&self.names, &self.devices)
    }
}
