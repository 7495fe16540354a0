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

    lib.rs

    Headless frontend. Loads a circuit definition, reports diagnostics with
    their source line reprints, then either runs a batch simulation or
    hands control to the interactive command loop.

*/

mod interactive;

use anyhow::{anyhow, Context};
use colored::Colorize;

use gatesim_core::{parser::ParseReport, Machine, RunError};

pub const DEFAULT_CONFIG_PATH: &str = "gatesim.toml";

/// Exit codes: distinct values for parse failures and oscillation so
/// scripts can tell them apart.
pub const EXIT_OK: i32 = 0;
pub const EXIT_PARSE_ERRORS: i32 = 1;
pub const EXIT_OSCILLATION: i32 = 2;

pub fn run() -> i32 {
    env_logger::init();
    match run_frontend() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            EXIT_PARSE_ERRORS
        }
    }
}

fn run_frontend() -> Result<i32, anyhow::Error> {
    let config = gatesim_config::read_config_file(DEFAULT_CONFIG_PATH)?;

    let circuit = config
        .simulation
        .circuit
        .clone()
        .ok_or_else(|| anyhow!("no circuit definition file given"))?;

    let mut machine = Machine::new();
    if let Some(seed) = config.simulation.seed {
        log::debug!("seeding cold-startup RNG with {}", seed);
        machine.seed_random(seed);
    }

    let report = machine
        .load_path(&circuit)
        .with_context(|| format!("failed to read {}", circuit.display()))?;

    if !report.ok() {
        print_report(&report);
        return Ok(EXIT_PARSE_ERRORS);
    }
    println!(
        "Loaded {} ({} devices, {} monitors)",
        circuit.display(),
        machine.devices().count(),
        machine.monitors().len()
    );

    if config.output.list_signals {
        print_signal_names(&machine);
    }

    if config.simulation.interactive {
        interactive::command_loop(&mut machine, &config)?;
        return Ok(EXIT_OK);
    }

    match machine.run(config.simulation.cycles) {
        Ok(()) => {
            println!("Ran {} cycles", machine.cycles_completed());
            if config.output.trace {
                print!("{}", machine.trace());
            }
            Ok(EXIT_OK)
        }
        Err(e @ RunError::Oscillation { .. }) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            Ok(EXIT_OSCILLATION)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_report(report: &ParseReport) {
    for diag in &report.syntax_errors {
        eprintln!(
            "{} {}",
            format!("Syntax error on line {}:", diag.line).red().bold(),
            diag.error
        );
        eprintln!("{}", diag.report);
    }
    for diag in &report.semantic_errors {
        match diag.line {
            Some(line) => {
                eprintln!(
                    "{} {}",
                    format!("Semantic error on line {}:", line).yellow().bold(),
                    diag.error
                );
                eprintln!("{}", diag.report);
            }
            None => {
                eprintln!("{} {}", "Semantic error:".yellow().bold(), diag.error);
            }
        }
    }
    eprintln!("{} error(s) found", report.error_count());
}

pub(crate) fn print_signal_names(machine: &Machine) {
    let (monitored, unmonitored) = machine.signal_names();
    println!("Monitored signals:   {}", monitored.join(", "));
    println!("Unmonitored signals: {}", unmonitored.join(", "));
}
