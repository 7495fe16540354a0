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

    parser.rs

    Recursive-descent parser for circuit definition files. Validates the
    symbol stream, builds devices, connections and monitors, and keeps two
    independent diagnostic lists: syntactic and semantic. On a syntactic
    mismatch it resynchronises at the next semicolon; semantic calls are
    only issued while both lists are empty, so construction never proceeds
    past an earlier error.

*/

use std::{fmt, fmt::Display, io};

use crate::{
    devices::{DeviceError, DeviceKind, Devices, Qualifier},
    monitors::{MonitorError, Monitors},
    names::NameTable,
    network::{ConnectError, Network},
    scanner::{Scanner, Symbol, SymbolKind},
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SyntaxError {
    ExpectedStart,
    ExpectedDevices,
    ExpectedConnections,
    ExpectedMonitors,
    DeviceName,
    DeviceType,
    Parameter,
    SemicolonComma,
    Number,
    DTypeOutput,
    ArrowPeriod,
    Semicolon,
    Equal,
    Comma,
    Period,
    Arrow,
    Input,
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyntaxError::ExpectedStart => write!(f, "Expected START."),
            SyntaxError::ExpectedDevices => write!(f, "Expected DEVICES."),
            SyntaxError::ExpectedConnections => write!(f, "Expected CONNECTIONS."),
            SyntaxError::ExpectedMonitors => write!(f, "Expected MONITORS."),
            SyntaxError::DeviceName => write!(f, "Invalid device name."),
            SyntaxError::DeviceType => write!(f, "Invalid device type."),
            SyntaxError::Parameter => write!(f, "Invalid parameter type."),
            SyntaxError::SemicolonComma => write!(f, "Expected a semicolon or a comma."),
            SyntaxError::Number => write!(f, "Invalid input number."),
            SyntaxError::DTypeOutput => write!(
                f,
                "Only DTYPE devices have named outputs, and they are Q and QBAR."
            ),
            SyntaxError::ArrowPeriod => write!(f, "Expected either an arrow or a DTYPE output."),
            SyntaxError::Semicolon => write!(f, "Expected a semicolon."),
            SyntaxError::Equal => write!(f, "Expected an equal sign."),
            SyntaxError::Comma => write!(f, "Expected a comma."),
            SyntaxError::Period => write!(f, "Expected a period."),
            SyntaxError::Arrow => write!(f, "Expected an arrow ->."),
            SyntaxError::Input => {
                write!(f, "Inputs must either start with I or be DATA, CLK, SET, CLEAR.")
            }
        }
    }
}

/// A semantic error together with the component that issued it. Identical
/// codes from different issuers (a device missing from CONNECTIONS versus
/// from MONITORS) stay distinguishable.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SemanticError {
    Device(DeviceError),
    Connection(ConnectError),
    Monitor(MonitorError),
    UnconnectedInputs,
}

impl Display for SemanticError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticError::Device(e) => e.fmt(f),
            SemanticError::Connection(ConnectError::DeviceAbsent) => {
                write!(f, "One or both of these devices do not exist.")
            }
            SemanticError::Connection(e) => e.fmt(f),
            SemanticError::Monitor(e) => e.fmt(f),
            SemanticError::UnconnectedInputs => {
                write!(f, "Not all inputs in the network are connected.")
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct SyntaxDiagnostic {
    pub error: SyntaxError,
    pub line: usize,
    /// Source line reprint with a caret under the offending symbol.
    pub report: String,
}

impl Display for SyntaxDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Syntax error on line {}: {}\n{}", self.line, self.error, self.report)
    }
}

#[derive(Clone, Debug)]
pub struct SemanticDiagnostic {
    pub error: SemanticError,
    pub line: Option<usize>,
    pub report: String,
}

impl Display for SemanticDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "Semantic error on line {}: {}\n{}", line, self.error, self.report),
            None => write!(f, "Semantic error: {}", self.error),
        }
    }
}

/// Everything a front end needs to report the outcome of a parse.
#[derive(Debug, Default)]
pub struct ParseReport {
    pub syntax_errors: Vec<SyntaxDiagnostic>,
    pub semantic_errors: Vec<SemanticDiagnostic>,
}

impl ParseReport {
    pub fn ok(&self) -> bool {
        self.syntax_errors.is_empty() && self.semantic_errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.syntax_errors.len() + self.semantic_errors.len()
    }
}

#[derive(Copy, Clone)]
enum Section {
    Devices,
    Connections,
    Monitors,
}

pub struct Parser<'a> {
    names: &'a mut NameTable,
    devices: &'a mut Devices,
    network: &'a mut Network,
    monitors: &'a mut Monitors,
    scanner: &'a mut Scanner,
    symbol: Symbol,
    syntax_errors: Vec<SyntaxDiagnostic>,
    semantic_errors: Vec<SemanticDiagnostic>,

    // Most-recent symbols of interest, overwritten per statement, kept for
    // the caret placement of semantic diagnostics.
    device_name_sym: Option<Symbol>,
    device_kind_sym: Option<Symbol>,
    param_sym: Option<Symbol>,
    param_value_sym: Option<Symbol>,
    conn_first_device_sym: Option<Symbol>,
    conn_second_device_sym: Option<Symbol>,
    conn_second_port_sym: Option<Symbol>,
    monitor_device_sym: Option<Symbol>,
}

impl<'a> Parser<'a> {
    pub fn new(
        names: &'a mut NameTable,
        devices: &'a mut Devices,
        network: &'a mut Network,
        monitors: &'a mut Monitors,
        scanner: &'a mut Scanner,
    ) -> Self {
        let placeholder = Symbol {
            kind: SymbolKind::Eof,
            id: None,
            value: None,
            literal: String::new(),
            line: 0,
            line_start: 0,
            position: 0,
            column: 0,
        };
        Self {
            names,
            devices,
            network,
            monitors,
            scanner,
            symbol: placeholder,
            syntax_errors: Vec::new(),
            semantic_errors: Vec::new(),
            device_name_sym: None,
            device_kind_sym: None,
            param_sym: None,
            param_value_sym: None,
            conn_first_device_sym: None,
            conn_second_device_sym: None,
            conn_second_port_sym: None,
            monitor_device_sym: None,
        }
    }

    /// Parse the whole definition file, building the circuit as long as no
    /// diagnostics have been recorded. Returns true iff both diagnostic
    /// lists are empty at the end of input.
    pub fn parse_network(&mut self) -> io::Result<bool> {
        self.expect_start()?;
        self.expect_section(Section::Devices)?;
        self.device_list()?;
        self.expect_section(Section::Devices)?;

        self.expect_start()?;
        self.expect_section(Section::Connections)?;
        self.connection_list()?;
        self.expect_section(Section::Connections)?;

        self.check_whole_network()?;

        self.expect_start()?;
        self.expect_section(Section::Monitors)?;
        self.monitor_list()?;
        self.expect_section(Section::Monitors)?;

        self.advance()?;
        if !self.symbol.is_eof() {
            log::warn!(
                "trailing content on line {} after END MONITORS",
                self.symbol.line
            );
        }
        let errors = self.syntax_errors.len() + self.semantic_errors.len();
        log::debug!("finished parsing, {} error(s)", errors);
        Ok(errors == 0)
    }

    /// Hand back the accumulated diagnostics.
    pub fn into_report(self) -> ParseReport {
        ParseReport {
            syntax_errors: self.syntax_errors,
            semantic_errors: self.semantic_errors,
        }
    }

    fn advance(&mut self) -> io::Result<()> {
        self.symbol = self.scanner.next_symbol(self.names)?;
        Ok(())
    }

    fn no_errors(&self) -> bool {
        self.syntax_errors.is_empty() && self.semantic_errors.is_empty()
    }

    /// Consume symbols until the next semicolon or end of input, leaving
    /// the terminator as the current symbol.
    fn skip_to_semicolon(&mut self) -> io::Result<()> {
        while !self.symbol.is(SymbolKind::Semicolon) && !self.symbol.is_eof() {
            self.advance()?;
        }
        Ok(())
    }

    fn emit_syntax(&mut self, error: SyntaxError) -> io::Result<()> {
        let report = self.scanner.error_report(&self.symbol, &self.symbol, None)?;
        log::debug!("syntax error on line {}: {:?}", self.symbol.line, error);
        self.syntax_errors.push(SyntaxDiagnostic {
            error,
            line: self.symbol.line,
            report,
        });
        Ok(())
    }

    fn emit_semantic(&mut self, error: SemanticError) -> io::Result<()> {
        let (primary, secondary) = match &error {
            SemanticError::Device(DeviceError::InvalidQualifier)
            | SemanticError::Device(DeviceError::InvalidSiggen) => {
                (self.param_value_sym.as_ref(), None)
            }
            SemanticError::Device(DeviceError::NoQualifier) => (self.device_kind_sym.as_ref(), None),
            SemanticError::Device(DeviceError::QualifierPresent) => (self.param_sym.as_ref(), None),
            SemanticError::Device(DeviceError::DevicePresent) => (self.device_name_sym.as_ref(), None),
            SemanticError::Connection(ConnectError::DeviceAbsent) => (
                self.conn_first_device_sym.as_ref(),
                self.conn_second_device_sym.as_ref(),
            ),
            SemanticError::Connection(_) => (self.conn_second_port_sym.as_ref(), None),
            SemanticError::Monitor(_) => (self.monitor_device_sym.as_ref(), None),
            SemanticError::UnconnectedInputs => (None, None),
        };
        let (line, report) = match primary {
            Some(sym) => (
                Some(sym.line),
                self.scanner.error_report(&self.symbol, sym, secondary)?,
            ),
            None => (None, String::new()),
        };
        log::debug!("semantic error: {:?}", error);
        self.semantic_errors.push(SemanticDiagnostic { error, line, report });
        Ok(())
    }

    /// Expect the START keyword opening a block. A premature end of input
    /// is tolerated silently here and in every other structural check.
    fn expect_start(&mut self) -> io::Result<()> {
        self.advance()?;
        if self.symbol.is_keyword(self.scanner.keywords.start) || self.symbol.is_eof() {
            return Ok(());
        }
        self.emit_syntax(SyntaxError::ExpectedStart)
    }

    /// Expect a section keyword followed by a semicolon, as in
    /// `START DEVICES;` or `END DEVICES;`.
    fn expect_section(&mut self, section: Section) -> io::Result<()> {
        let (keyword, error) = match section {
            Section::Devices => (self.scanner.keywords.devices, SyntaxError::ExpectedDevices),
            Section::Connections => (
                self.scanner.keywords.connections,
                SyntaxError::ExpectedConnections,
            ),
            Section::Monitors => (self.scanner.keywords.monitors, SyntaxError::ExpectedMonitors),
        };
        self.advance()?;
        if self.symbol.is_keyword(keyword) {
            self.advance()?;
            if !self.symbol.is(SymbolKind::Semicolon) {
                self.emit_syntax(SyntaxError::Semicolon)?;
                self.skip_to_semicolon()?;
            }
        } else if !self.symbol.is_eof() {
            self.emit_syntax(error)?;
            self.skip_to_semicolon()?;
        }
        Ok(())
    }

    fn at_end_keyword(&self) -> bool {
        self.symbol.is_keyword(self.scanner.keywords.end)
    }

    fn device_kind_of(&self, sym: &Symbol) -> Option<DeviceKind> {
        if sym.kind != SymbolKind::Keyword {
            return None;
        }
        let kw = &self.scanner.keywords;
        let id = sym.id?;
        match id {
            _ if id == kw.clock => Some(DeviceKind::Clock),
            _ if id == kw.switch => Some(DeviceKind::Switch),
            _ if id == kw.and => Some(DeviceKind::And),
            _ if id == kw.nand => Some(DeviceKind::Nand),
            _ if id == kw.or => Some(DeviceKind::Or),
            _ if id == kw.nor => Some(DeviceKind::Nor),
            _ if id == kw.dtype => Some(DeviceKind::DType),
            _ if id == kw.xor => Some(DeviceKind::Xor),
            _ if id == kw.siggen => Some(DeviceKind::Siggen),
            _ => None,
        }
    }

    fn is_valid_param(&self, sym: &Symbol) -> bool {
        let kw = &self.scanner.keywords;
        sym.is_keyword(kw.ip) || sym.is_keyword(kw.init) || sym.is_keyword(kw.cycles) || sym.is_keyword(kw.sig)
    }

    fn is_dtype_output(&self, sym: &Symbol) -> bool {
        let kw = &self.scanner.keywords;
        sym.is_keyword(kw.q) || sym.is_keyword(kw.qbar)
    }

    fn is_dtype_input(&self, sym: &Symbol) -> bool {
        let kw = &self.scanner.keywords;
        sym.is_keyword(kw.data) || sym.is_keyword(kw.clk) || sym.is_keyword(kw.set) || sym.is_keyword(kw.clear)
    }

    // ------------------------------------------------------------------
    // DEVICES section
    // ------------------------------------------------------------------

    fn device_list(&mut self) -> io::Result<()> {
        self.advance()?;
        while !self.at_end_keyword() && !self.symbol.is_eof() {
            self.device_line()?;
        }
        Ok(())
    }

    fn device_line(&mut self) -> io::Result<()> {
        if !self.symbol.is(SymbolKind::Name) {
            self.emit_syntax(SyntaxError::DeviceName)?;
            self.skip_to_semicolon()?;
            return self.advance();
        }
        self.device_name_sym = Some(self.symbol.clone());
        self.advance()?;

        if !self.symbol.is(SymbolKind::Equals) {
            self.emit_syntax(SyntaxError::Equal)?;
            self.skip_to_semicolon()?;
            return self.advance();
        }
        self.advance()?;

        let Some(kind) = self.device_kind_of(&self.symbol) else {
            self.emit_syntax(SyntaxError::DeviceType)?;
            self.skip_to_semicolon()?;
            return self.advance();
        };
        self.device_kind_sym = Some(self.symbol.clone());
        self.advance()?;

        if self.symbol.is(SymbolKind::Semicolon) {
            // No qualifier given.
            if self.no_errors() {
                let result = self.make_device(kind, None);
                if let Err(e) = result {
                    self.emit_semantic(SemanticError::Device(e))?;
                }
            }
            self.advance()
        } else if self.symbol.is(SymbolKind::Comma) {
            self.advance()?;
            if !self.param_in_device()? {
                // Diagnostic already recorded; resume past the statement.
                return self.advance();
            }
            if !self.symbol.is(SymbolKind::Semicolon) {
                self.emit_syntax(SyntaxError::Semicolon)?;
                self.skip_to_semicolon()?;
                return self.advance();
            }
            if self.no_errors() {
                let qualifier = self.param_value_sym.as_ref().map(|sym| {
                    Qualifier::new(sym.value.unwrap_or(u64::MAX), sym.literal.clone())
                });
                let result = self.make_device(kind, qualifier);
                if let Err(e) = result {
                    self.emit_semantic(SemanticError::Device(e))?;
                }
            }
            self.advance()
        } else {
            self.emit_syntax(SyntaxError::SemicolonComma)?;
            self.skip_to_semicolon()?;
            self.advance()
        }
    }

    /// Parse `param = NUMBER`, filling the parameter symbol slots. Returns
    /// false after recording a diagnostic and resynchronising.
    fn param_in_device(&mut self) -> io::Result<bool> {
        if !self.is_valid_param(&self.symbol) {
            self.emit_syntax(SyntaxError::Parameter)?;
            self.skip_to_semicolon()?;
            return Ok(false);
        }
        self.param_sym = Some(self.symbol.clone());
        self.advance()?;

        if !self.symbol.is(SymbolKind::Equals) {
            self.emit_syntax(SyntaxError::Equal)?;
            self.skip_to_semicolon()?;
            return Ok(false);
        }
        self.advance()?;

        if !self.symbol.is(SymbolKind::Number) {
            self.emit_syntax(SyntaxError::Number)?;
            self.skip_to_semicolon()?;
            return Ok(false);
        }
        self.param_value_sym = Some(self.symbol.clone());
        self.advance()?;
        Ok(true)
    }

    fn make_device(&mut self, kind: DeviceKind, qualifier: Option<Qualifier>) -> Result<(), DeviceError> {
        let Some(name) = self.device_name_sym.as_ref().and_then(|sym| sym.id) else {
            return Ok(());
        };
        self.devices.make_device(name, kind, qualifier.as_ref())
    }

    // ------------------------------------------------------------------
    // CONNECTIONS section
    // ------------------------------------------------------------------

    fn connection_list(&mut self) -> io::Result<()> {
        self.advance()?;
        while !self.at_end_keyword() && !self.symbol.is_eof() {
            self.connection_line()?;
        }
        Ok(())
    }

    fn connection_line(&mut self) -> io::Result<()> {
        let first = self.connection_output()?;
        if self.symbol.is(SymbolKind::Arrow) {
            self.advance()?;
            let second = self.connection_input()?;
            self.record_connection(&first, &second)?;
            // An output may fan out to several inputs on one line.
            while !self.symbol.is(SymbolKind::Semicolon) && !self.symbol.is_eof() {
                if self.symbol.is(SymbolKind::Comma) {
                    self.advance()?;
                    let second = self.connection_input()?;
                    self.record_connection(&first, &second)?;
                } else {
                    self.emit_syntax(SyntaxError::Comma)?;
                    self.skip_to_semicolon()?;
                }
            }
            self.advance()
        } else if self.symbol.is(SymbolKind::Semicolon) {
            // connection_output already resynchronised here.
            self.advance()
        } else {
            self.emit_syntax(SyntaxError::Arrow)?;
            self.skip_to_semicolon()?;
            self.advance()
        }
    }

    /// Parse the source endpoint: `NAME` or `NAME.Q`/`NAME.QBAR`. Leaves
    /// the arrow (or the resynchronised terminator) as the current symbol.
    fn connection_output(&mut self) -> io::Result<Option<(Symbol, Option<Symbol>)>> {
        if !self.symbol.is(SymbolKind::Name) {
            self.emit_syntax(SyntaxError::DeviceName)?;
            self.skip_to_semicolon()?;
            return Ok(None);
        }
        let device = self.symbol.clone();
        self.conn_first_device_sym = Some(device.clone());
        self.advance()?;

        if self.symbol.is(SymbolKind::Arrow) {
            return Ok(Some((device, None)));
        }
        if self.symbol.is(SymbolKind::Period) {
            self.advance()?;
            if self.is_dtype_output(&self.symbol) {
                let port = self.symbol.clone();
                self.advance()?;
                return Ok(Some((device, Some(port))));
            }
            self.emit_syntax(SyntaxError::DTypeOutput)?;
            self.skip_to_semicolon()?;
            return Ok(None);
        }
        self.emit_syntax(SyntaxError::ArrowPeriod)?;
        self.skip_to_semicolon()?;
        Ok(None)
    }

    /// Parse a sink endpoint: `NAME.I<n>` or `NAME.DATA`/`CLK`/`SET`/`CLEAR`.
    fn connection_input(&mut self) -> io::Result<Option<(Symbol, Symbol)>> {
        if !self.symbol.is(SymbolKind::Name) {
            self.emit_syntax(SyntaxError::DeviceName)?;
            self.skip_to_semicolon()?;
            return Ok(None);
        }
        let device = self.symbol.clone();
        self.conn_second_device_sym = Some(device.clone());
        self.advance()?;

        if !self.symbol.is(SymbolKind::Period) {
            self.emit_syntax(SyntaxError::Period)?;
            self.skip_to_semicolon()?;
            return Ok(None);
        }
        self.advance()?;

        let is_numbered_input = self.symbol.literal.starts_with('I');
        if is_numbered_input {
            if self.symbol.literal[1..].parse::<u32>().is_err() {
                self.emit_syntax(SyntaxError::Number)?;
                self.skip_to_semicolon()?;
                return Ok(None);
            }
        } else if !self.is_dtype_input(&self.symbol) {
            self.emit_syntax(SyntaxError::Input)?;
            self.skip_to_semicolon()?;
            return Ok(None);
        }
        let port = self.symbol.clone();
        self.conn_second_port_sym = Some(port.clone());
        self.advance()?;
        Ok(Some((device, port)))
    }

    fn record_connection(
        &mut self,
        first: &Option<(Symbol, Option<Symbol>)>,
        second: &Option<(Symbol, Symbol)>,
    ) -> io::Result<()> {
        if !self.no_errors() {
            return Ok(());
        }
        let (Some((src, src_port)), Some((dst, dst_port))) = (first, second) else {
            return Ok(());
        };
        let (Some(src_id), Some(dst_id), Some(dst_port_id)) = (src.id, dst.id, dst_port.id) else {
            return Ok(());
        };
        let src_port_id = src_port.as_ref().and_then(|sym| sym.id);
        let result =
            self.network
                .make_connection(self.devices, src_id, src_port_id, dst_id, dst_port_id);
        if let Err(e) = result {
            self.emit_semantic(SemanticError::Connection(e))?;
        }
        Ok(())
    }

    /// Global connectivity check, run between the CONNECTIONS and MONITORS
    /// sections so monitors are only placed on a complete network.
    fn check_whole_network(&mut self) -> io::Result<()> {
        if self.no_errors() && !self.network.check_network(self.devices) {
            self.emit_semantic(SemanticError::UnconnectedInputs)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // MONITORS section
    // ------------------------------------------------------------------

    fn monitor_list(&mut self) -> io::Result<()> {
        self.advance()?;
        while !self.at_end_keyword() && !self.symbol.is_eof() {
            self.monitor_line()?;
        }
        Ok(())
    }

    fn monitor_line(&mut self) -> io::Result<()> {
        if !self.symbol.is(SymbolKind::Name) {
            self.emit_syntax(SyntaxError::DeviceName)?;
            self.skip_to_semicolon()?;
            return self.advance();
        }
        self.monitor_device_sym = Some(self.symbol.clone());
        self.advance()?;

        if self.symbol.is(SymbolKind::Semicolon) {
            self.advance()?;
            if self.no_errors() {
                self.record_monitor(None)?;
            }
            Ok(())
        } else if self.symbol.is(SymbolKind::Period) {
            self.advance()?;
            if !self.is_dtype_output(&self.symbol) {
                self.emit_syntax(SyntaxError::DTypeOutput)?;
                self.skip_to_semicolon()?;
                return self.advance();
            }
            let port = self.symbol.clone();
            self.advance()?;
            if !self.symbol.is(SymbolKind::Semicolon) {
                self.emit_syntax(SyntaxError::Semicolon)?;
                self.skip_to_semicolon()?;
                return self.advance();
            }
            self.advance()?;
            if self.no_errors() {
                self.record_monitor(Some(port))?;
            }
            Ok(())
        } else {
            self.emit_syntax(SyntaxError::Semicolon)?;
            self.skip_to_semicolon()?;
            self.advance()
        }
    }

    fn record_monitor(&mut self, port: Option<Symbol>) -> io::Result<()> {
        let Some(device) = self.monitor_device_sym.as_ref().and_then(|sym| sym.id) else {
            return Ok(());
        };
        let port_id = port.as_ref().and_then(|sym| sym.id);
        let result = self.monitors.make_monitor(self.devices, device, port_id, 0);
        if let Err(e) = result {
            self.emit_semantic(SemanticError::Monitor(e))?;
        }
        Ok(())
    }
}
