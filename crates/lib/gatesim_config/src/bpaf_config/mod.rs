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

use std::path::PathBuf;

use bpaf::Bpaf;

#[derive(Bpaf, Debug, Default)]
#[bpaf(options, version, generate(cmd_line_args))]
pub struct CmdLineArgs {
    #[bpaf(long("config_file"), long("configfile"))]
    pub config_file: Option<PathBuf>,

    /// Number of cycles to run in batch mode.
    #[bpaf(long, argument("CYCLES"))]
    pub cycles: Option<usize>,

    /// Seed for the cold-startup RNG, for reproducible clock phases.
    #[bpaf(long, argument("SEED"))]
    pub seed: Option<u64>,

    /// Start the interactive command loop after loading the circuit.
    #[bpaf(long, switch)]
    pub interactive: bool,

    /// Suppress the waveform trace after a batch run.
    #[bpaf(long("no_trace"), long("notrace"), switch)]
    pub no_trace: bool,

    /// List monitored and unmonitored signals after loading.
    #[bpaf(long("list_signals"), long("listsignals"), switch)]
    pub list_signals: bool,

    /// Circuit definition file.
    #[bpaf(positional("CIRCUIT"))]
    pub circuit: Option<PathBuf>,
}
