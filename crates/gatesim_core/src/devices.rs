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

    devices.rs

    Catalogue of device kinds and their per-instance state: port maps,
    qualifiers, switch levels, clock phase, D-type memory and signal
    generator waveforms.

*/

use std::{error::Error, fmt, fmt::Display};

use indexmap::IndexMap;
use rand::{rngs::StdRng, Rng, SeedableRng};
use strum_macros::Display as StrumDisplay;

use crate::names::{NameId, NameTable};

/// Gates accept between 1 and 16 inputs.
pub const MAX_GATE_INPUTS: u64 = 16;

/// An output port identifier. `None` addresses the single unnamed output of
/// gates, switches, clocks and signal generators; D-types use `Some(Q)` and
/// `Some(QBAR)`.
pub type PortId = Option<NameId>;

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Signal {
    Low,
    High,
    Rising,
    Falling,
    #[default]
    Blank,
}

impl Signal {
    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Signal::High
        } else {
            Signal::Low
        }
    }

    pub fn is_high(&self) -> bool {
        matches!(self, Signal::High | Signal::Rising)
    }

    /// Collapse the transient edge markers to their settled level.
    pub fn settled(&self) -> Self {
        match self {
            Signal::Rising => Signal::High,
            Signal::Falling => Signal::Low,
            s => *s,
        }
    }

    pub fn inverted(&self) -> Self {
        Signal::from_bit(!self.is_high())
    }
}

#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq, StrumDisplay)]
#[strum(serialize_all = "UPPERCASE")]
pub enum DeviceKind {
    Clock,
    Switch,
    And,
    Nand,
    Or,
    Nor,
    Xor,
    #[strum(serialize = "DTYPE")]
    DType,
    Siggen,
}

impl DeviceKind {
    pub fn is_gate(&self) -> bool {
        matches!(
            self,
            DeviceKind::And | DeviceKind::Nand | DeviceKind::Or | DeviceKind::Nor | DeviceKind::Xor
        )
    }

    /// Devices that advance internal state once per cycle after the
    /// combinational pass.
    pub fn is_clocked(&self) -> bool {
        matches!(self, DeviceKind::Clock | DeviceKind::DType | DeviceKind::Siggen)
    }
}

/// A device qualifier as written in the source: the parsed value for
/// numeric qualifiers, the literal digit string for waveforms (a signal
/// generator's leading zeros are significant).
#[derive(Clone, Debug)]
pub struct Qualifier {
    pub value: u64,
    pub literal: String,
}

impl Qualifier {
    pub fn new(value: u64, literal: impl Into<String>) -> Self {
        Self {
            value,
            literal: literal.into(),
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DeviceError {
    InvalidQualifier,
    NoQualifier,
    QualifierPresent,
    DevicePresent,
    InvalidSiggen,
}

impl Error for DeviceError {}
impl Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::InvalidQualifier => write!(f, "This device cannot have this parameter."),
            DeviceError::NoQualifier => write!(f, "This device needs a parameter."),
            DeviceError::QualifierPresent => write!(f, "This device should not have a parameter."),
            DeviceError::DevicePresent => write!(f, "This device already exists."),
            DeviceError::InvalidSiggen => {
                write!(f, "A signal generator waveform must be a string of 0s and 1s.")
            }
        }
    }
}

/// An input port: the output that drives it, if any, and the level last
/// propagated into it.
#[derive(Clone, Debug, Default)]
pub struct InputPort {
    pub driver: Option<(NameId, PortId)>,
    pub level: Signal,
}

/// Kind-specific device state. Gates carry none; everything else remembers
/// what it needs between cycles.
#[derive(Clone, Debug)]
pub enum DeviceState {
    Gate,
    Switch { init: Signal },
    Clock { half_period: u64, counter: u64 },
    DType { memory: Signal, prev_clk: Signal },
    Siggen { waveform: String, cursor: usize },
}

#[derive(Clone, Debug)]
pub struct Device {
    pub kind: DeviceKind,
    pub inputs: IndexMap<NameId, InputPort>,
    pub outputs: IndexMap<PortId, Signal>,
    pub state: DeviceState,
}

impl Device {
    pub fn output_level(&self, port: PortId) -> Option<Signal> {
        self.outputs.get(&port).copied()
    }
}

pub struct Devices {
    devices: IndexMap<NameId, Device>,
    rng: StdRng,
    gate_input_ids: Vec<NameId>,
    pub data_id: NameId,
    pub clk_id: NameId,
    pub set_id: NameId,
    pub clear_id: NameId,
    pub q_id: NameId,
    pub qbar_id: NameId,
}

impl Devices {
    pub fn new(names: &mut NameTable) -> Self {
        let gate_input_ids = (1..=MAX_GATE_INPUTS)
            .map(|n| names.intern(&format!("I{}", n)))
            .collect();
        Self {
            devices: IndexMap::new(),
            rng: StdRng::from_entropy(),
            gate_input_ids,
            data_id: names.intern("DATA"),
            clk_id: names.intern("CLK"),
            set_id: names.intern("SET"),
            clear_id: names.intern("CLEAR"),
            q_id: names.intern("Q"),
            qbar_id: names.intern("QBAR"),
        }
    }

    /// Reseed the RNG behind cold startup, making clock phases reproducible.
    pub fn seed_random(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    pub fn count(&self) -> usize {
        self.devices.len()
    }

    pub fn get(&self, id: NameId) -> Option<&Device> {
        self.devices.get(&id)
    }

    pub fn get_mut(&mut self, id: NameId) -> Option<&mut Device> {
        self.devices.get_mut(&id)
    }

    pub fn contains(&self, id: NameId) -> bool {
        self.devices.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NameId, &Device)> {
        self.devices.iter().map(|(id, dev)| (*id, dev))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (NameId, &mut Device)> {
        self.devices.iter_mut().map(|(id, dev)| (*id, dev))
    }

    /// Create a device and wire up its port maps. The qualifier is required
    /// or forbidden depending on the kind, and validated against the kind's
    /// domain.
    pub fn make_device(
        &mut self,
        name: NameId,
        kind: DeviceKind,
        qualifier: Option<&Qualifier>,
    ) -> Result<(), DeviceError> {
        if self.devices.contains_key(&name) {
            return Err(DeviceError::DevicePresent);
        }

        let device = match kind {
            DeviceKind::And | DeviceKind::Nand | DeviceKind::Or | DeviceKind::Nor => {
                let q = qualifier.ok_or(DeviceError::NoQualifier)?;
                if q.value < 1 || q.value > MAX_GATE_INPUTS {
                    return Err(DeviceError::InvalidQualifier);
                }
                self.build_gate(kind, q.value as usize)
            }
            DeviceKind::Xor => {
                if qualifier.is_some() {
                    return Err(DeviceError::QualifierPresent);
                }
                self.build_gate(kind, 2)
            }
            DeviceKind::DType => {
                if qualifier.is_some() {
                    return Err(DeviceError::QualifierPresent);
                }
                let mut inputs = IndexMap::new();
                for port in [self.data_id, self.clk_id, self.set_id, self.clear_id] {
                    inputs.insert(port, InputPort::default());
                }
                let mut outputs = IndexMap::new();
                outputs.insert(Some(self.q_id), Signal::Low);
                outputs.insert(Some(self.qbar_id), Signal::High);
                Device {
                    kind,
                    inputs,
                    outputs,
                    state: DeviceState::DType {
                        memory: Signal::Low,
                        prev_clk: Signal::Low,
                    },
                }
            }
            DeviceKind::Switch => {
                let q = qualifier.ok_or(DeviceError::NoQualifier)?;
                if q.value > 1 {
                    return Err(DeviceError::InvalidQualifier);
                }
                let init = Signal::from_bit(q.value == 1);
                Device {
                    kind,
                    inputs: IndexMap::new(),
                    outputs: IndexMap::from_iter([(None, init)]),
                    state: DeviceState::Switch { init },
                }
            }
            DeviceKind::Clock => {
                let q = qualifier.ok_or(DeviceError::NoQualifier)?;
                if q.value < 1 {
                    return Err(DeviceError::InvalidQualifier);
                }
                Device {
                    kind,
                    inputs: IndexMap::new(),
                    outputs: IndexMap::from_iter([(None, Signal::Low)]),
                    state: DeviceState::Clock {
                        half_period: q.value,
                        counter: 0,
                    },
                }
            }
            DeviceKind::Siggen => {
                let q = qualifier.ok_or(DeviceError::NoQualifier)?;
                if q.literal.is_empty() || !q.literal.bytes().all(|b| b == b'0' || b == b'1') {
                    return Err(DeviceError::InvalidSiggen);
                }
                let first = Signal::from_bit(q.literal.as_bytes()[0] == b'1');
                Device {
                    kind,
                    inputs: IndexMap::new(),
                    outputs: IndexMap::from_iter([(None, first)]),
                    state: DeviceState::Siggen {
                        waveform: q.literal.clone(),
                        cursor: 0,
                    },
                }
            }
        };

        log::debug!("created device {:?} ({})", name, kind);
        self.devices.insert(name, device);
        Ok(())
    }

    fn build_gate(&self, kind: DeviceKind, input_count: usize) -> Device {
        let mut inputs = IndexMap::new();
        for &port in &self.gate_input_ids[..input_count] {
            inputs.insert(port, InputPort::default());
        }
        Device {
            kind,
            inputs,
            outputs: IndexMap::from_iter([(None, Signal::Low)]),
            state: DeviceState::Gate,
        }
    }

    /// Set a switch's output level. Returns false if the device is missing,
    /// not a switch, or the level is not LOW/HIGH.
    pub fn set_switch(&mut self, device: NameId, level: Signal) -> bool {
        if !matches!(level, Signal::Low | Signal::High) {
            return false;
        }
        match self.devices.get_mut(&device) {
            Some(dev) if dev.kind == DeviceKind::Switch => {
                dev.outputs.insert(None, level);
                true
            }
            _ => false,
        }
    }

    /// Re-seed every stateful device to its defined initial condition.
    /// Clocks get a pseudo-random phase within their half-period so that a
    /// circuit full of equal clocks does not start in lock step.
    pub fn cold_startup(&mut self) {
        let rng = &mut self.rng;
        for dev in self.devices.values_mut() {
            for input in dev.inputs.values_mut() {
                input.level = Signal::Blank;
            }
            match &mut dev.state {
                DeviceState::Gate => {
                    dev.outputs.insert(None, Signal::Low);
                }
                DeviceState::Switch { init } => {
                    dev.outputs.insert(None, *init);
                }
                DeviceState::Clock { half_period, counter } => {
                    *counter = rng.gen_range(0..*half_period);
                    dev.outputs.insert(None, Signal::from_bit(rng.gen::<bool>()));
                }
                DeviceState::DType { memory, prev_clk } => {
                    *memory = Signal::Low;
                    *prev_clk = Signal::Low;
                    dev.outputs.insert(Some(self.q_id), Signal::Low);
                    dev.outputs.insert(Some(self.qbar_id), Signal::High);
                }
                DeviceState::Siggen { waveform, cursor } => {
                    *cursor = 0;
                    let first = Signal::from_bit(waveform.as_bytes()[0] == b'1');
                    dev.outputs.insert(None, first);
                }
            }
        }
    }

    /// Force a clock's output level and phase counter. Front ends use this
    /// for reproducible runs; cold startup otherwise randomises the phase.
    pub fn set_clock_phase(&mut self, device: NameId, level: Signal, counter: u64) -> bool {
        match self.devices.get_mut(&device) {
            Some(dev) => match &mut dev.state {
                DeviceState::Clock { half_period, counter: c } => {
                    *c = counter.min(*half_period - 1);
                    dev.outputs.insert(None, level);
                    true
                }
                _ => false,
            },
            None => false,
        }
    }

    /// All device IDs, optionally restricted to one kind, in creation order.
    pub fn find_devices(&self, kind: Option<DeviceKind>) -> Vec<NameId> {
        self.devices
            .iter()
            .filter(|(_, dev)| kind.map_or(true, |k| dev.kind == k))
            .map(|(id, _)| *id)
            .collect()
    }

    /// Render a (device, port) pair as `dev` or `dev.PORT`.
    pub fn get_signal_name(&self, names: &NameTable, device: NameId, port: PortId) -> Option<String> {
        let dev_name = names.get(device)?;
        match port {
            Some(p) => {
                let port_name = names.get(p)?;
                Some(format!("{}.{}", dev_name, port_name))
            }
            None => Some(dev_name.to_string()),
        }
    }

    /// Parse `dev` or `dev.PORT` back into IDs. Returns None when either
    /// name has never been interned.
    pub fn get_signal_ids(&self, names: &NameTable, signal: &str) -> Option<(NameId, PortId)> {
        match signal.split_once('.') {
            Some((dev, port)) => {
                let dev_id = names.query(dev)?;
                let port_id = names.query(port)?;
                Some((dev_id, Some(port_id)))
            }
            None => names.query(signal).map(|id| (id, None)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> (NameTable, Devices) {
        let mut names = NameTable::new();
        let devices = Devices::new(&mut names);
        (names, devices)
    }

    fn num(value: u64) -> Qualifier {
        Qualifier::new(value, value.to_string())
    }

    #[test]
    fn gate_allocates_numbered_inputs() {
        let (mut names, mut devices) = fixture();
        let g = names.intern("G1");
        devices.make_device(g, DeviceKind::And, Some(&num(3))).unwrap();
        let dev = devices.get(g).unwrap();
        let ports: Vec<&str> = dev.inputs.keys().map(|id| names.get(*id).unwrap()).collect();
        assert_eq!(ports, vec!["I1", "I2", "I3"]);
        assert_eq!(dev.output_level(None), Some(Signal::Low));
    }

    #[test]
    fn gate_input_count_domain() {
        let (mut names, mut devices) = fixture();
        let a = names.intern("A");
        let b = names.intern("B");
        let c = names.intern("C");
        assert_eq!(
            devices.make_device(a, DeviceKind::Nand, Some(&num(0))),
            Err(DeviceError::InvalidQualifier)
        );
        assert_eq!(
            devices.make_device(b, DeviceKind::Or, Some(&num(17))),
            Err(DeviceError::InvalidQualifier)
        );
        assert_eq!(devices.make_device(c, DeviceKind::Nor, Some(&num(16))), Ok(()));
    }

    #[test]
    fn gates_require_a_qualifier() {
        let (mut names, mut devices) = fixture();
        let g = names.intern("G");
        assert_eq!(
            devices.make_device(g, DeviceKind::And, None),
            Err(DeviceError::NoQualifier)
        );
    }

    #[test]
    fn xor_and_dtype_reject_qualifiers() {
        let (mut names, mut devices) = fixture();
        let x = names.intern("X");
        let d = names.intern("D");
        assert_eq!(
            devices.make_device(x, DeviceKind::Xor, Some(&num(2))),
            Err(DeviceError::QualifierPresent)
        );
        assert_eq!(
            devices.make_device(d, DeviceKind::DType, Some(&num(1))),
            Err(DeviceError::QualifierPresent)
        );
        assert_eq!(devices.make_device(x, DeviceKind::Xor, None), Ok(()));
        assert_eq!(devices.get(x).unwrap().inputs.len(), 2);
    }

    #[test]
    fn dtype_ports() {
        let (mut names, mut devices) = fixture();
        let d = names.intern("DF");
        devices.make_device(d, DeviceKind::DType, None).unwrap();
        let dev = devices.get(d).unwrap();
        let inputs: Vec<&str> = dev.inputs.keys().map(|id| names.get(*id).unwrap()).collect();
        assert_eq!(inputs, vec!["DATA", "CLK", "SET", "CLEAR"]);
        assert_eq!(dev.output_level(Some(devices.q_id)), Some(Signal::Low));
        assert_eq!(dev.output_level(Some(devices.qbar_id)), Some(Signal::High));
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let (mut names, mut devices) = fixture();
        let s = names.intern("S");
        assert_eq!(devices.make_device(s, DeviceKind::Switch, Some(&num(0))), Ok(()));
        assert_eq!(
            devices.make_device(s, DeviceKind::Clock, Some(&num(1))),
            Err(DeviceError::DevicePresent)
        );
    }

    #[test]
    fn switch_init_domain() {
        let (mut names, mut devices) = fixture();
        let s = names.intern("S");
        assert_eq!(
            devices.make_device(s, DeviceKind::Switch, Some(&num(2))),
            Err(DeviceError::InvalidQualifier)
        );
        assert_eq!(devices.make_device(s, DeviceKind::Switch, Some(&num(1))), Ok(()));
        assert_eq!(devices.get(s).unwrap().output_level(None), Some(Signal::High));
    }

    #[test]
    fn clock_period_domain() {
        let (mut names, mut devices) = fixture();
        let c = names.intern("C");
        assert_eq!(
            devices.make_device(c, DeviceKind::Clock, Some(&num(0))),
            Err(DeviceError::InvalidQualifier)
        );
        assert_eq!(devices.make_device(c, DeviceKind::Clock, Some(&num(3))), Ok(()));
    }

    #[test]
    fn siggen_waveform_validation() {
        let (mut names, mut devices) = fixture();
        let a = names.intern("SA");
        let b = names.intern("SB");
        let c = names.intern("SC");
        assert_eq!(
            devices.make_device(a, DeviceKind::Siggen, Some(&Qualifier::new(120, "0120"))),
            Err(DeviceError::InvalidSiggen)
        );
        assert_eq!(devices.make_device(b, DeviceKind::Siggen, None), Err(DeviceError::NoQualifier));
        assert_eq!(
            devices.make_device(c, DeviceKind::Siggen, Some(&Qualifier::new(101, "0101"))),
            Ok(())
        );
        // Leading zero survives in the stored waveform, and the output
        // starts on the first bit.
        match &devices.get(c).unwrap().state {
            DeviceState::Siggen { waveform, cursor } => {
                assert_eq!(waveform, "0101");
                assert_eq!(*cursor, 0);
            }
            state => panic!("unexpected state {:?}", state),
        }
        assert_eq!(devices.get(c).unwrap().output_level(None), Some(Signal::Low));
    }

    #[test]
    fn set_switch_levels() {
        let (mut names, mut devices) = fixture();
        let s = names.intern("S");
        let g = names.intern("G");
        devices.make_device(s, DeviceKind::Switch, Some(&num(0))).unwrap();
        devices.make_device(g, DeviceKind::Xor, None).unwrap();
        assert!(devices.set_switch(s, Signal::High));
        assert_eq!(devices.get(s).unwrap().output_level(None), Some(Signal::High));
        assert!(!devices.set_switch(g, Signal::High));
        assert!(!devices.set_switch(s, Signal::Blank));
        assert!(!devices.set_switch(names.intern("missing"), Signal::Low));
    }

    #[test]
    fn cold_startup_reseeds_state() {
        let (mut names, mut devices) = fixture();
        let s = names.intern("S");
        let d = names.intern("D");
        let sg = names.intern("SG");
        devices.make_device(s, DeviceKind::Switch, Some(&num(1))).unwrap();
        devices.make_device(d, DeviceKind::DType, None).unwrap();
        devices
            .make_device(sg, DeviceKind::Siggen, Some(&Qualifier::new(10, "10")))
            .unwrap();

        devices.set_switch(s, Signal::Low);
        if let DeviceState::Siggen { cursor, .. } = &mut devices.get_mut(sg).unwrap().state {
            *cursor = 1;
        }
        let q = devices.q_id;
        devices.get_mut(d).unwrap().outputs.insert(Some(q), Signal::High);

        devices.cold_startup();
        assert_eq!(devices.get(s).unwrap().output_level(None), Some(Signal::High));
        assert_eq!(devices.get(d).unwrap().output_level(Some(devices.q_id)), Some(Signal::Low));
        match &devices.get(sg).unwrap().state {
            DeviceState::Siggen { cursor, .. } => assert_eq!(*cursor, 0),
            state => panic!("unexpected state {:?}", state),
        }
        assert_eq!(devices.get(sg).unwrap().output_level(None), Some(Signal::High));
    }

    #[test]
    fn clock_phase_is_within_half_period() {
        let (mut names, mut devices) = fixture();
        let c = names.intern("C");
        devices.make_device(c, DeviceKind::Clock, Some(&num(4))).unwrap();
        devices.seed_random(7);
        devices.cold_startup();
        match &devices.get(c).unwrap().state {
            DeviceState::Clock { counter, half_period } => {
                assert!(*counter < *half_period);
            }
            state => panic!("unexpected state {:?}", state),
        }
        let level = devices.get(c).unwrap().output_level(None).unwrap();
        assert!(matches!(level, Signal::Low | Signal::High));
    }

    #[test]
    fn find_devices_filters_by_kind() {
        let (mut names, mut devices) = fixture();
        let s1 = names.intern("S1");
        let s2 = names.intern("S2");
        let g = names.intern("G");
        devices.make_device(s1, DeviceKind::Switch, Some(&num(0))).unwrap();
        devices.make_device(g, DeviceKind::Xor, None).unwrap();
        devices.make_device(s2, DeviceKind::Switch, Some(&num(1))).unwrap();
        assert_eq!(devices.find_devices(Some(DeviceKind::Switch)), vec![s1, s2]);
        assert_eq!(devices.find_devices(None), vec![s1, g, s2]);
    }

    #[test]
    fn signal_names_round_trip() {
        let (mut names, mut devices) = fixture();
        let d = names.intern("DF");
        devices.make_device(d, DeviceKind::DType, None).unwrap();
        let q = devices.q_id;
        assert_eq!(devices.get_signal_name(&names, d, Some(q)), Some("DF.Q".to_string()));
        assert_eq!(devices.get_signal_name(&names, d, None), Some("DF".to_string()));
        assert_eq!(devices.get_signal_ids(&names, "DF.Q"), Some((d, Some(q))));
        assert_eq!(devices.get_signal_ids(&names, "DF"), Some((d, None)));
        assert_eq!(devices.get_signal_ids(&names, "NOPE"), None);
    }

    #[test]
    fn device_kind_display() {
        assert_eq!(DeviceKind::DType.to_string(), "DTYPE");
        assert_eq!(DeviceKind::Nand.to_string(), "NAND");
        assert_eq!(DeviceKind::Siggen.to_string(), "SIGGEN");
    }
}
