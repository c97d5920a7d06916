//! Command-line driver: wires [`config`] (CLI/TOML/default resolution),
//! [`pipeline`] (the Runner's single-run and sweep modes), and
//! [`duplicates`] (the standalone duplicate-function scan) behind the
//! [`cli`] surface consumed by `src/bin/lexigram.rs`.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod pipeline;

pub use cli::{Cli, Commands};
pub use config::{LogFormat, RunnerConfig, RunnerConfigInput, SplitModeArg};
pub use duplicates::{find_duplicate_functions, render_duplicate_report, DuplicateFunctionGroup};
pub use pipeline::{run_single, run_sweep, SingleRunOutcome, SweepOutcome};
