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

    interactive.rs

    Interactive command loop over the simulation driver: run and continue
    the simulation, toggle switches, add and remove monitors, and inspect
    the circuit, one command per line.

*/

use std::io::{self, BufRead, Write};

use colored::Colorize;

use gatesim_config::ConfigFileParams;
use gatesim_core::{Machine, RunError};

const HELP: &str = "\
Commands:
  run [N]          run N cycles from a cold start (default from config)
  continue [N]     run N more cycles from the current state
  switch NAME 0|1  set a switch level
  monitor SIG      start monitoring a signal (DEV or DEV.PORT)
  unmonitor SIG    stop monitoring a signal
  signals          list monitored and unmonitored signals
  devices          list devices and their kinds
  trace            print the waveform trace
  reset            clear histories and the cycle counter
  help             show this help
  quit             leave the command loop";

pub fn command_loop(machine: &mut Machine, config: &ConfigFileParams) -> Result<(), anyhow::Error> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    println!("Interactive mode; type 'help' for commands.");

    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };

        match command {
            "run" | "r" => {
                let cycles = match parse_count(words.next(), config.simulation.cycles) {
                    Some(n) => n,
                    None => continue,
                };
                report_run(machine.run(cycles), machine);
            }
            "continue" | "c" => {
                let cycles = match parse_count(words.next(), config.simulation.cycles) {
                    Some(n) => n,
                    None => continue,
                };
                report_run(machine.run_continue(cycles), machine);
            }
            "switch" | "s" => {
                let (Some(name), Some(level)) = (words.next(), words.next()) else {
                    println!("usage: switch NAME 0|1");
                    continue;
                };
                let on = match level {
                    "0" => false,
                    "1" => true,
                    _ => {
                        println!("usage: switch NAME 0|1");
                        continue;
                    }
                };
                if machine.set_switch(name, on) {
                    println!("{} set to {}", name, level);
                } else {
                    println!("{} no such switch: {}", "Error:".red(), name);
                }
            }
            "monitor" | "m" => {
                let Some(signal) = words.next() else {
                    println!("usage: monitor SIG");
                    continue;
                };
                match machine.add_monitor(signal) {
                    Ok(()) => println!("monitoring {}", signal),
                    Err(e) => println!("{} {}", "Error:".red(), e),
                }
            }
            "unmonitor" | "z" => {
                let Some(signal) = words.next() else {
                    println!("usage: unmonitor SIG");
                    continue;
                };
                if machine.remove_monitor(signal) {
                    println!("stopped monitoring {}", signal);
                } else {
                    println!("{} not monitored: {}", "Error:".red(), signal);
                }
            }
            "signals" => crate::print_signal_names(machine),
            "devices" => list_devices(machine),
            "trace" | "t" => print!("{}", machine.trace()),
            "reset" => {
                machine.reset();
                println!("histories cleared");
            }
            "help" | "h" | "?" => println!("{}", HELP),
            "quit" | "q" | "exit" => break,
            other => println!("{} unknown command: {} (try 'help')", "Error:".red(), other),
        }
    }
    Ok(())
}

fn parse_count(word: Option<&str>, default: usize) -> Option<usize> {
    match word {
        None => Some(default),
        Some(w) => match w.parse::<usize>() {
            Ok(0) => {
                println!("cycle count must be positive");
                None
            }
            Ok(n) => Some(n),
            Err(_) => {
                println!("not a cycle count: {}", w);
                None
            }
        },
    }
}

fn report_run(result: Result<(), RunError>, machine: &Machine) {
    match result {
        Ok(()) => {
            println!("{} cycle(s) completed", machine.cycles_completed());
            print!("{}", machine.trace());
        }
        Err(e) => println!("{} {}", "Error:".red(), e),
    }
}

fn list_devices(machine: &Machine) {
    for id in machine.devices().find_devices(None) {
        let Some(device) = machine.devices().get(id) else {
            continue;
        };
        let name = machine.names().get(id).unwrap_or("?");
        println!("{:<12} {}", name, device.kind);
    }
}
