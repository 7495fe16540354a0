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
*/

//! The `gatesim_config` crate provides functionality for parsing Gatesim's
//! main configuration file, and overlaying command line arguments on top of
//! the configuration file settings. Command line arguments always take
//! priority over the configuration file.
//!
//! Features:
//! - `use_bpaf`: Enable BPAF support for command line argument parsing.

#[cfg(feature = "use_bpaf")]
mod bpaf_config;

use std::path::{Path, PathBuf};

use cfg_if::cfg_if;
use serde_derive::Deserialize;

#[cfg(feature = "use_bpaf")]
pub use bpaf_config::{cmd_line_args, CmdLineArgs};
#[cfg(not(feature = "use_bpaf"))]
pub use plain_args::CmdLineArgs;

#[cfg(not(feature = "use_bpaf"))]
mod plain_args {
    use std::path::PathBuf;

    #[derive(Debug, Default)]
    pub struct CmdLineArgs {
        pub config_file: Option<PathBuf>,
        pub cycles: Option<usize>,
        pub seed: Option<u64>,
        pub interactive: bool,
        pub no_trace: bool,
        pub list_signals: bool,
        pub circuit: Option<PathBuf>,
    }
}

const fn _default_true() -> bool {
    true
}

const fn _default_cycles() -> usize {
    10
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Cycles to run in batch mode.
    pub cycles: usize,
    /// Seed for the cold-startup RNG. Unset means a fresh seed per run.
    pub seed: Option<u64>,
    /// Drop into the interactive command loop instead of batch mode.
    pub interactive: bool,
    /// Circuit definition file; usually given on the command line instead.
    pub circuit: Option<PathBuf>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            cycles: _default_cycles(),
            seed: None,
            interactive: false,
            circuit: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Print the waveform trace after a batch run.
    pub trace: bool,
    /// List monitored and unmonitored signals after loading.
    pub list_signals: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            trace: _default_true(),
            list_signals: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFileParams {
    pub simulation: SimulationConfig,
    pub output: OutputConfig,
}

impl ConfigFileParams {
    /// Overlay command line arguments onto the file settings. The command
    /// line always wins.
    pub fn overlay(&mut self, shell_args: CmdLineArgs) {
        if let Some(cycles) = shell_args.cycles {
            self.simulation.cycles = cycles;
        }
        if let Some(seed) = shell_args.seed {
            self.simulation.seed = Some(seed);
        }
        if shell_args.interactive {
            self.simulation.interactive = true;
        }
        if let Some(circuit) = shell_args.circuit {
            self.simulation.circuit = Some(circuit);
        }
        if shell_args.no_trace {
            self.output.trace = false;
        }
        if shell_args.list_signals {
            self.output.list_signals = true;
        }
    }
}

/// Parse a TOML configuration string and overlay the given command line
/// arguments onto it.
pub fn read_config(
    toml_string: impl AsRef<str>,
    shell_args: CmdLineArgs,
) -> Result<ConfigFileParams, anyhow::Error> {
    let mut toml_args: ConfigFileParams = toml::from_str(toml_string.as_ref())?;
    toml_args.overlay(shell_args);
    Ok(toml_args)
}

/// Read the TOML configuration from a file path, parse, and overlay command
/// line arguments. An explicitly requested configuration file must exist;
/// a missing default file just means default settings.
pub fn read_config_file<P>(default_path: P) -> Result<ConfigFileParams, anyhow::Error>
where
    P: AsRef<Path>,
{
    let shell_args: CmdLineArgs;

    cfg_if! {
        if #[cfg(feature = "use_bpaf")] {
            log::debug!("Reading command line arguments...");
            shell_args = cmd_line_args().run();
        } else {
            log::debug!("Argument reading disabled...");
            shell_args = CmdLineArgs::default();
        }
    }

    let toml_string = if let Some(config_path) = shell_args.config_file.as_ref() {
        std::fs::read_to_string(config_path)?
    }
    else if default_path.as_ref().exists() {
        std::fs::read_to_string(default_path)?
    }
    else {
        log::debug!("No configuration file found, using defaults");
        String::new()
    };

    read_config(toml_string, shell_args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_an_empty_config() {
        let config = read_config("", CmdLineArgs::default()).unwrap();
        assert_eq!(config.simulation.cycles, 10);
        assert_eq!(config.simulation.seed, None);
        assert!(config.output.trace);
        assert!(!config.output.list_signals);
        assert!(!config.simulation.interactive);
    }

    #[test]
    fn file_settings_are_read() {
        let toml = r#"
            [simulation]
            cycles = 25
            seed = 42

            [output]
            trace = false
        "#;
        let config = read_config(toml, CmdLineArgs::default()).unwrap();
        assert_eq!(config.simulation.cycles, 25);
        assert_eq!(config.simulation.seed, Some(42));
        assert!(!config.output.trace);
    }

    #[test]
    fn command_line_overrides_the_file() {
        let toml = r#"
            [simulation]
            cycles = 25

            [output]
            trace = true
        "#;
        let args = CmdLineArgs {
            cycles: Some(100),
            seed: Some(7),
            no_trace: true,
            interactive: true,
            circuit: Some(PathBuf::from("demo.gsim")),
            ..Default::default()
        };
        let config = read_config(toml, args).unwrap();
        assert_eq!(config.simulation.cycles, 100);
        assert_eq!(config.simulation.seed, Some(7));
        assert!(!config.output.trace);
        assert!(config.simulation.interactive);
        assert_eq!(config.simulation.circuit, Some(PathBuf::from("demo.gsim")));
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(read_config("[simulation\ncycles = ", CmdLineArgs::default()).is_err());
    }
}
