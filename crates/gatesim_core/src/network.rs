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

    network.rs

    Connects device output ports to input ports and executes the network:
    a combinational fixed-point pass with oscillation detection, followed
    by the once-per-cycle advance of clocks, D-types and signal generators.

*/

use std::{error::Error, fmt, fmt::Display};

use crate::{
    devices::{DeviceKind, DeviceState, Devices, PortId, Signal},
    names::NameId,
};

/// Sweep allowance per device in the combinational pass. Any acyclic
/// network settles in far fewer sweeps than this; exceeding the bound
/// means a zero-delay feedback loop is oscillating.
pub const SWEEPS_PER_DEVICE: usize = 20;
pub const SWEEP_SLACK: usize = 8;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConnectError {
    InputToInput,
    OutputToOutput,
    InputConnected,
    PortAbsent,
    DeviceAbsent,
}

impl Error for ConnectError {}
impl Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::InputToInput => write!(f, "Cannot connect an input to an input."),
            ConnectError::OutputToOutput => write!(f, "Cannot connect an output to an output."),
            ConnectError::InputConnected => write!(f, "This port is already in a connection."),
            ConnectError::PortAbsent => write!(f, "This is not a valid port."),
            ConnectError::DeviceAbsent => write!(f, "Device does not exist."),
        }
    }
}

pub struct Network;

impl Network {
    pub fn new() -> Self {
        Self
    }

    /// Connect `src.src_port` to `dst.dst_port`. `src_port` may be None for
    /// devices with a single unnamed output; D-type sources must name Q or
    /// QBAR. The sink port must be an input with no driver yet.
    pub fn make_connection(
        &mut self,
        devices: &mut Devices,
        src: NameId,
        src_port: PortId,
        dst: NameId,
        dst_port: NameId,
    ) -> Result<(), ConnectError> {
        if !devices.contains(src) || !devices.contains(dst) {
            return Err(ConnectError::DeviceAbsent);
        }

        {
            let src_dev = devices.get(src).ok_or(ConnectError::DeviceAbsent)?;
            match src_port {
                None => {
                    if !src_dev.outputs.contains_key(&None) {
                        return Err(ConnectError::PortAbsent);
                    }
                }
                Some(p) => {
                    if src_dev.inputs.contains_key(&p) {
                        return Err(ConnectError::InputToInput);
                    }
                    if !src_dev.outputs.contains_key(&Some(p)) {
                        return Err(ConnectError::PortAbsent);
                    }
                }
            }
        }

        let dst_dev = devices.get_mut(dst).ok_or(ConnectError::DeviceAbsent)?;
        if dst_dev.outputs.contains_key(&Some(dst_port)) {
            return Err(ConnectError::OutputToOutput);
        }
        let input = dst_dev
            .inputs
            .get_mut(&dst_port)
            .ok_or(ConnectError::PortAbsent)?;
        if input.driver.is_some() {
            return Err(ConnectError::InputConnected);
        }
        input.driver = Some((src, src_port));
        Ok(())
    }

    /// True iff every input of every device has a driver.
    pub fn check_network(&self, devices: &Devices) -> bool {
        devices
            .iter()
            .all(|(_, dev)| dev.inputs.values().all(|input| input.driver.is_some()))
    }

    /// Execute one simulation cycle. Returns false if the combinational
    /// pass fails to reach a fixed point within the sweep bound, in which
    /// case the network state is unspecified and nothing should be sampled.
    pub fn execute_network(&mut self, devices: &mut Devices) -> bool {
        Self::propagate(devices);

        let limit = SWEEPS_PER_DEVICE * devices.count() + SWEEP_SLACK;
        let mut sweeps = 0;
        while Self::sweep_gates(devices) {
            sweeps += 1;
            if sweeps > limit {
                log::error!("network is oscillating: no fixed point after {} sweeps", sweeps);
                return false;
            }
            Self::propagate(devices);
        }

        Self::advance_clocked(devices);
        Self::settle_edges(devices);
        Self::propagate(devices);
        true
    }

    /// Copy each driver's output level into the inputs it feeds. Inputs
    /// with no driver read BLANK.
    fn propagate(devices: &mut Devices) {
        let mut updates: Vec<(NameId, NameId, Signal)> = Vec::new();
        for (id, dev) in devices.iter() {
            for (port, input) in dev.inputs.iter() {
                let level = match input.driver {
                    Some((src, src_port)) => devices
                        .get(src)
                        .and_then(|d| d.output_level(src_port))
                        .unwrap_or(Signal::Blank),
                    None => Signal::Blank,
                };
                if level != input.level {
                    updates.push((id, *port, level));
                }
            }
        }
        for (id, port, level) in updates {
            if let Some(input) = devices.get_mut(id).and_then(|d| d.inputs.get_mut(&port)) {
                input.level = level;
            }
        }
    }

    /// Recompute every gate from its current input levels. Returns true if
    /// any output changed.
    fn sweep_gates(devices: &mut Devices) -> bool {
        let mut changed = false;
        for (_, dev) in devices.iter_mut() {
            if !dev.kind.is_gate() {
                continue;
            }
            let out = Self::gate_output(dev.kind, dev.inputs.values().map(|input| input.level));
            if dev.outputs.get(&None) != Some(&out) {
                dev.outputs.insert(None, out);
                changed = true;
            }
        }
        changed
    }

    fn gate_output(kind: DeviceKind, levels: impl Iterator<Item = Signal>) -> Signal {
        let mut all = true;
        let mut any = false;
        let mut odd = false;
        for level in levels {
            if level.is_high() {
                any = true;
                odd = !odd;
            } else {
                all = false;
            }
        }
        match kind {
            DeviceKind::And => Signal::from_bit(all),
            DeviceKind::Nand => Signal::from_bit(!all),
            DeviceKind::Or => Signal::from_bit(any),
            DeviceKind::Nor => Signal::from_bit(!any),
            DeviceKind::Xor => Signal::from_bit(odd),
            _ => Signal::Blank,
        }
    }

    /// Advance clocked devices once, after the combinational outputs have
    /// settled. D-types sample the input levels propagated at the start of
    /// the cycle, so a clock edge produced here is not seen by a D-type
    /// until the next cycle.
    fn advance_clocked(devices: &mut Devices) {
        let data_id = devices.data_id;
        let clk_id = devices.clk_id;
        let set_id = devices.set_id;
        let clear_id = devices.clear_id;
        let q_id = devices.q_id;
        let qbar_id = devices.qbar_id;

        for (_, dev) in devices.iter_mut() {
            match &mut dev.state {
                DeviceState::Clock { half_period, counter } => {
                    *counter += 1;
                    if *counter >= *half_period {
                        *counter = 0;
                        let high = dev.outputs.get(&None).map(|s| s.is_high()).unwrap_or(false);
                        let edge = if high { Signal::Falling } else { Signal::Rising };
                        dev.outputs.insert(None, edge);
                    }
                }
                DeviceState::DType { memory, prev_clk } => {
                    let inputs = &dev.inputs;
                    let level = |port: NameId| {
                        inputs.get(&port).map(|i| i.level).unwrap_or(Signal::Blank)
                    };
                    let clk = level(clk_id);
                    let rising = !prev_clk.is_high() && clk.is_high();
                    if level(clear_id).is_high() {
                        *memory = Signal::Low;
                    } else if level(set_id).is_high() {
                        *memory = Signal::High;
                    } else if rising {
                        *memory = Signal::from_bit(level(data_id).is_high());
                    }
                    *prev_clk = clk.settled();
                    let q = *memory;
                    dev.outputs.insert(Some(q_id), q);
                    dev.outputs.insert(Some(qbar_id), q.inverted());
                }
                DeviceState::Siggen { waveform, cursor } => {
                    *cursor = (*cursor + 1) % waveform.len();
                    let bit = waveform.as_bytes()[*cursor] == b'1';
                    dev.outputs.insert(None, Signal::from_bit(bit));
                }
                _ => {}
            }
        }
    }

    /// Collapse the transient RISING/FALLING markers left by clock
    /// transitions; they exist only within a cycle and are never visible
    /// to monitors.
    fn settle_edges(devices: &mut Devices) {
        for (_, dev) in devices.iter_mut() {
            for level in dev.outputs.values_mut() {
                *level = level.settled();
            }
        }
    }
}
