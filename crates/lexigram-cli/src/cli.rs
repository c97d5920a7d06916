//! `clap` surface: global flags plus the `analyze`, `sweep`, and
//! `duplicates` subcommands (§6).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{LogFormat, RunnerConfigInput};

#[derive(Parser, Debug)]
#[command(name = "lexigram", about = "Statistically improbable code fragment detector", version)]
pub struct Cli {
    /// Path to a TOML config file; CLI flags on the subcommand still win.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Overrides the config/default log format.
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Repeatable: `-v` for debug, `-vv` for trace.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs a single count/n-gram/report pass over a project.
    Analyze {
        project_path: PathBuf,
        #[command(flatten)]
        config: RunnerConfigInput,
    },
    /// Runs a parameter sweep over a project, writing one report per tuple.
    Sweep {
        project_path: PathBuf,
        #[command(flatten)]
        config: RunnerConfigInput,
    },
    /// Scans a project for top-level functions declared in more than one
    /// module.
    Duplicates { project_path: PathBuf },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_parses_project_path_and_flattened_flags() {
        let cli = Cli::parse_from(["lexigram", "analyze", "proj", "--gram-size", "4"]);
        let Commands::Analyze { project_path, config } = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(project_path, PathBuf::from("proj"));
        assert_eq!(config.gram_size, Some(4));
    }

    #[test]
    fn global_flags_are_accepted_before_the_subcommand() {
        let cli = Cli::parse_from(["lexigram", "-vv", "--log-format", "json", "duplicates", "proj"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_format, Some(LogFormat::Json));
    }
}
