//! [`RunnerConfig`]: resolves CLI flags merged with an optional TOML file
//! into the fully-defaulted, validated configuration the [`crate::pipeline`]
//! module consumes.
//!
//! Precedence is CLI flags first, the `--config` file second, hardcoded
//! defaults last. Both layers are collected into [`RunnerConfigInput`] (every
//! field `Option`, unset = "not specified") so the same struct doubles as a
//! `clap::Args` fragment and a `serde`-deserialized TOML fragment; unknown
//! TOML keys are rejected, matching "recognized options; all others
//! rejected".

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context};
use clap::ValueEnum;
use serde::Deserialize;

use lexigram_common::limits::DEFAULT_EXCLUDE_DIRS;
use lexigram_model::SplitMode;

/// Output format for `tracing` events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Tree,
}

/// `clap`/`serde` front for [`lexigram_model::SplitMode`] — kept local to
/// this crate so the model crate stays free of a `clap` dependency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitModeArg {
    #[default]
    Sliding,
    Hard,
}

impl From<SplitModeArg> for SplitMode {
    fn from(value: SplitModeArg) -> Self {
        match value {
            SplitModeArg::Sliding => SplitMode::Sliding,
            SplitModeArg::Hard => SplitMode::Hard,
        }
    }
}

/// Every recognized option, optional so CLI/TOML/default layers can be
/// merged field-by-field. Shared by `clap`'s `#[command(flatten)]` on
/// `analyze`/`sweep` and by `toml::from_str` on `--config`.
#[derive(clap::Args, Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfigInput {
    #[arg(long)]
    pub use_type_info: Option<bool>,
    #[arg(long)]
    pub gram_size: Option<usize>,
    #[arg(long)]
    pub sequence_length: Option<usize>,
    #[arg(long)]
    pub minimum_token_occurrence: Option<u64>,
    #[arg(long)]
    pub reporting_size: Option<usize>,
    #[arg(long)]
    pub save_token_line_numbers: Option<bool>,
    #[arg(long)]
    pub do_analysis_run: Option<bool>,
    #[arg(long, value_delimiter = ',')]
    pub gram_sizes: Option<Vec<usize>>,
    #[arg(long, value_delimiter = ',')]
    pub sequence_lengths: Option<Vec<usize>>,
    #[arg(long, value_delimiter = ',')]
    pub minimum_token_occurrences: Option<Vec<u64>>,
    #[arg(long)]
    pub typed: Option<bool>,
    #[arg(long)]
    pub untyped: Option<bool>,
    #[arg(long)]
    pub report_name_prefix: Option<String>,
    #[arg(long)]
    pub analysis_result_folder: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
    #[arg(long, value_delimiter = ',')]
    pub exclude_dirs: Option<Vec<String>>,
    #[arg(long)]
    pub saved_count_model_path: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub split_mode: Option<SplitModeArg>,
}

impl RunnerConfigInput {
    /// `self` is CLI, `base` is the `--config` file; CLI wins field-by-field.
    #[must_use]
    fn merge_over(self, base: Self) -> Self {
        Self {
            use_type_info: self.use_type_info.or(base.use_type_info),
            gram_size: self.gram_size.or(base.gram_size),
            sequence_length: self.sequence_length.or(base.sequence_length),
            minimum_token_occurrence: self.minimum_token_occurrence.or(base.minimum_token_occurrence),
            reporting_size: self.reporting_size.or(base.reporting_size),
            save_token_line_numbers: self.save_token_line_numbers.or(base.save_token_line_numbers),
            do_analysis_run: self.do_analysis_run.or(base.do_analysis_run),
            gram_sizes: self.gram_sizes.or(base.gram_sizes),
            sequence_lengths: self.sequence_lengths.or(base.sequence_lengths),
            minimum_token_occurrences: self.minimum_token_occurrences.or(base.minimum_token_occurrences),
            typed: self.typed.or(base.typed),
            untyped: self.untyped.or(base.untyped),
            report_name_prefix: self.report_name_prefix.or(base.report_name_prefix),
            analysis_result_folder: self.analysis_result_folder.or(base.analysis_result_folder),
            log_format: self.log_format.or(base.log_format),
            exclude_dirs: self.exclude_dirs.or(base.exclude_dirs),
            saved_count_model_path: self.saved_count_model_path.or(base.saved_count_model_path),
            split_mode: self.split_mode.or(base.split_mode),
        }
    }
}

/// Fully-resolved, validated configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub use_type_info: bool,
    pub gram_size: usize,
    pub sequence_length: usize,
    pub minimum_token_occurrence: u64,
    pub reporting_size: usize,
    pub save_token_line_numbers: bool,
    pub do_analysis_run: bool,
    pub gram_sizes: Vec<usize>,
    pub sequence_lengths: Vec<usize>,
    pub minimum_token_occurrences: Vec<u64>,
    pub typed: bool,
    pub untyped: bool,
    pub report_name_prefix: String,
    pub analysis_result_folder: PathBuf,
    pub log_format: LogFormat,
    pub exclude_dirs: Vec<String>,
    pub saved_count_model_path: Option<PathBuf>,
    pub split_mode: SplitMode,
}

impl RunnerConfig {
    /// Merges `cli` over the file at `config_path` (if any) and fills every
    /// remaining field with its hardcoded default, then validates.
    pub fn resolve(cli: RunnerConfigInput, config_path: Option<&Path>) -> anyhow::Result<Self> {
        let file_input = match config_path {
            Some(path) => {
                let text = fs::read_to_string(path).with_context(|| format!("reading config file {}", path.display()))?;
                toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => RunnerConfigInput::default(),
        };

        let merged = cli.merge_over(file_input);
        let config = Self {
            use_type_info: merged.use_type_info.unwrap_or(false),
            gram_size: merged.gram_size.unwrap_or(3),
            sequence_length: merged.sequence_length.unwrap_or(5),
            minimum_token_occurrence: merged.minimum_token_occurrence.unwrap_or(1),
            reporting_size: merged.reporting_size.unwrap_or(50),
            save_token_line_numbers: merged.save_token_line_numbers.unwrap_or(true),
            do_analysis_run: merged.do_analysis_run.unwrap_or(true),
            gram_sizes: merged.gram_sizes.unwrap_or_default(),
            sequence_lengths: merged.sequence_lengths.unwrap_or_default(),
            minimum_token_occurrences: merged.minimum_token_occurrences.unwrap_or_default(),
            typed: merged.typed.unwrap_or(false),
            untyped: merged.untyped.unwrap_or(true),
            report_name_prefix: merged.report_name_prefix.unwrap_or_else(|| "lexigram_report".to_string()),
            analysis_result_folder: merged.analysis_result_folder.unwrap_or_else(|| PathBuf::from("lexigram-results")),
            log_format: merged.log_format.unwrap_or_default(),
            exclude_dirs: merged
                .exclude_dirs
                .unwrap_or_else(|| DEFAULT_EXCLUDE_DIRS.iter().map(ToString::to_string).collect()),
            saved_count_model_path: merged.saved_count_model_path,
            split_mode: merged.split_mode.unwrap_or_default().into(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.gram_size >= 1, "gram_size must be >= 1");
        ensure!(self.sequence_length >= self.gram_size, "sequence_length must be >= gram_size");
        ensure!(self.minimum_token_occurrence >= 1, "minimum_token_occurrence must be >= 1");
        ensure!(self.reporting_size >= 1, "reporting_size must be >= 1");
        for &g in &self.gram_sizes {
            ensure!(g >= 1, "every gram_sizes entry must be >= 1");
        }
        for &m in &self.minimum_token_occurrences {
            ensure!(m >= 1, "every minimum_token_occurrences entry must be >= 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_nothing_is_specified() {
        let config = RunnerConfig::resolve(RunnerConfigInput::default(), None).unwrap();
        assert_eq!(config.gram_size, 3);
        assert_eq!(config.sequence_length, 5);
        assert!(config.untyped);
        assert!(!config.typed);
    }

    #[test]
    fn cli_value_wins_over_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexigram.toml");
        fs::write(&path, "gram_size = 4\nreporting_size = 20\n").unwrap();

        let cli = RunnerConfigInput {
            gram_size: Some(9),
            ..Default::default()
        };
        let config = RunnerConfig::resolve(cli, Some(&path)).unwrap();
        assert_eq!(config.gram_size, 9, "CLI flag must win over config file");
        assert_eq!(config.reporting_size, 20, "config-file-only field still applies");
    }

    #[test]
    fn unknown_config_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lexigram.toml");
        fs::write(&path, "not_a_real_option = true\n").unwrap();
        assert!(RunnerConfig::resolve(RunnerConfigInput::default(), Some(&path)).is_err());
    }

    #[test]
    fn sequence_length_below_gram_size_is_rejected() {
        let cli = RunnerConfigInput {
            gram_size: Some(5),
            sequence_length: Some(2),
            ..Default::default()
        };
        assert!(RunnerConfig::resolve(cli, None).is_err());
    }
}
