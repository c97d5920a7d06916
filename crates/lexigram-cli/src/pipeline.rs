//! [`run_single`]/[`run_sweep`]: the Runner's two modes. Single builds one
//! `CountModel` (optionally loaded from disk), one `NGramModel`, and one
//! report. Sweep builds a `CountModel` per requested side (typed/untyped)
//! and iterates every `(gram_size, window_length, min_occurrence)` tuple
//! with `window_length >= gram_size`, writing one report file per tuple into
//! a timestamped result folder.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Context;
use rayon::prelude::*;
use rustpython_ast::Mod;
use rustpython_parser::{parse, Mode};
use tracing::{error, instrument};

use lexigram_common::{Sequence, SequenceSet};
use lexigram_model::{CountModel, NGramModel};
use lexigram_report::{build_report, Report};
use lexigram_resolver::{discover_project_files, preprocess_project, DiscoveredFile, ProjectTypeCache};
use lexigram_tokenizer::{tokenize_module, tokenize_module_typed, RunDiagnostics};

use crate::config::RunnerConfig;

/// Result of a single run: the `CountModel` (built fresh or loaded from
/// disk), and — unless `do_analysis_run` is `false` — the `NGramModel`'s
/// report.
pub struct SingleRunOutcome {
    pub count_model: CountModel,
    pub report: Option<Report>,
}

/// Result of a sweep: every report file written, and the folder they live
/// in.
pub struct SweepOutcome {
    pub result_folder: PathBuf,
    pub report_paths: Vec<PathBuf>,
}

fn project_name(project_root: &Path) -> String {
    project_root.file_name().and_then(|n| n.to_str()).unwrap_or("project").to_string()
}

#[instrument(skip(files))]
fn preprocess(project_name: &str, files: &[DiscoveredFile]) -> ProjectTypeCache {
    preprocess_project(project_name, files)
}

/// Tokenizes every file, in parallel (each file is independent given a
/// read-only type cache), merging the per-file results sequentially
/// afterward — a fork-join, not a concurrent map, so no cache needs interior
/// mutability or locking (§5).
#[instrument(skip(files, type_cache))]
fn tokenize(files: &[DiscoveredFile], type_cache: Option<&ProjectTypeCache>) -> (SequenceSet, RunDiagnostics) {
    let per_file: Vec<(String, Vec<Sequence>, RunDiagnostics)> = files
        .par_iter()
        .filter_map(|file| {
            let source = match fs::read_to_string(&file.path) {
                Ok(source) => source,
                Err(err) => {
                    error!(path = %file.path.display(), error = %err, "could not read file");
                    return None;
                }
            };
            let parsed = match parse(&source, Mode::Module, file.path.to_str().unwrap_or_default()) {
                Ok(parsed) => parsed,
                Err(err) => {
                    error!(path = %file.path.display(), error = %err, "could not parse file");
                    return None;
                }
            };
            let Mod::Module(module) = parsed else {
                error!(path = %file.path.display(), "expected a module, got an expression");
                return None;
            };

            let (sequences, diagnostics) = match type_cache {
                Some(cache) => tokenize_module_typed(&file.module_path, &source, &module.body, cache),
                None => tokenize_module(&file.module_path, &source, &module.body),
            };
            Some((file.module_path.clone(), sequences, diagnostics))
        })
        .collect();

    let mut sequences = SequenceSet::new();
    let mut diagnostics = RunDiagnostics::new();
    for (module_path, file_sequences, file_diagnostics) in per_file {
        sequences.insert(module_path, file_sequences);
        diagnostics.merge(file_diagnostics);
    }
    (sequences, diagnostics)
}

#[instrument(skip(sequences))]
fn build_count_model(project_name: &str, sequences: &SequenceSet, save_line_numbers: bool, max_window_length: usize) -> CountModel {
    CountModel::build(project_name, sequences, save_line_numbers, Some(max_window_length))
}

#[instrument(skip(count_model))]
fn build_n_gram_model(count_model: &CountModel, gram_size: usize, window_length: usize, min_occurrence: u64, config: &RunnerConfig) -> NGramModel {
    NGramModel::build(count_model, gram_size, window_length, min_occurrence, config.split_mode)
}

#[instrument(skip(ngram_model, count_model))]
fn report(ngram_model: &NGramModel, count_model: &CountModel, reporting_size: usize) -> Report {
    build_report(ngram_model, count_model.sequences(), reporting_size)
}

/// Single-run mode: one `CountModel`, one `NGramModel`, one report.
pub fn run_single(project_root: &Path, config: &RunnerConfig) -> anyhow::Result<SingleRunOutcome> {
    let count_model = if let Some(saved_path) = &config.saved_count_model_path {
        CountModel::load(saved_path).with_context(|| format!("loading saved count model from {}", saved_path.display()))?
    } else {
        let files = discover_project_files(project_root);
        let name = project_name(project_root);

        let type_cache = config.use_type_info.then(|| preprocess(&name, &files));
        let (sequences, diagnostics) = tokenize(&files, type_cache.as_ref());
        diagnostics.report();

        build_count_model(&name, &sequences, config.save_token_line_numbers, config.sequence_length)
    };

    if !config.do_analysis_run {
        return Ok(SingleRunOutcome { count_model, report: None });
    }

    let ngram_model = build_n_gram_model(&count_model, config.gram_size, config.sequence_length, config.minimum_token_occurrence, config);
    let rendered = report(&ngram_model, &count_model, config.reporting_size);

    Ok(SingleRunOutcome {
        count_model,
        report: Some(rendered),
    })
}

/// One `(typed | untyped)` side to build a `CountModel` for during a sweep.
struct Side {
    name: &'static str,
    use_type_info: bool,
}

fn requested_sides(config: &RunnerConfig) -> Vec<Side> {
    let mut sides = Vec::new();
    if config.untyped {
        sides.push(Side {
            name: "untyped",
            use_type_info: false,
        });
    }
    if config.typed {
        sides.push(Side {
            name: "typed",
            use_type_info: true,
        });
    }
    if sides.is_empty() {
        sides.push(Side {
            name: "untyped",
            use_type_info: false,
        });
    }
    sides
}

/// Every `(gram_size, window_length, min_occurrence)` tuple to sweep,
/// restricted to `window_length >= gram_size`.
fn sweep_tuples(config: &RunnerConfig) -> Vec<(usize, usize, u64)> {
    let gram_sizes = if config.gram_sizes.is_empty() { vec![config.gram_size] } else { config.gram_sizes.clone() };
    let window_lengths = if config.sequence_lengths.is_empty() {
        vec![config.sequence_length]
    } else {
        config.sequence_lengths.clone()
    };
    let min_occurrences = if config.minimum_token_occurrences.is_empty() {
        vec![config.minimum_token_occurrence]
    } else {
        config.minimum_token_occurrences.clone()
    };

    let mut tuples = Vec::new();
    for &m in &min_occurrences {
        for &g in &gram_sizes {
            for &w in &window_lengths {
                if w >= g {
                    tuples.push((g, w, m));
                }
            }
        }
    }
    tuples
}

/// Sweep mode: builds one `CountModel` per requested side, then parallelizes
/// independent parameter tuples with `rayon` (§5's stated fork-join
/// freedom), writing one report file per tuple into a timestamped result
/// folder under `analysis_result_folder`.
pub fn run_sweep(project_root: &Path, config: &RunnerConfig) -> anyhow::Result<SweepOutcome> {
    let files = discover_project_files(project_root);
    let name = project_name(project_root);
    let tuples = sweep_tuples(config);
    let max_window_length = tuples.iter().map(|&(_, w, _)| w).max().unwrap_or(config.sequence_length);

    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
    let result_folder = config.analysis_result_folder.join(format!("{}_{timestamp}", config.report_name_prefix));
    fs::create_dir_all(&result_folder).with_context(|| format!("creating result folder {}", result_folder.display()))?;

    let mut report_paths = Vec::new();
    for side in requested_sides(config) {
        let type_cache = side.use_type_info.then(|| preprocess(&name, &files));
        let (sequences, diagnostics) = tokenize(&files, type_cache.as_ref());
        diagnostics.report();
        let count_model = build_count_model(&name, &sequences, config.save_token_line_numbers, max_window_length);

        let side_paths: Vec<PathBuf> = tuples
            .par_iter()
            .map(|&(g, w, m)| -> anyhow::Result<PathBuf> {
                let ngram_model = build_n_gram_model(&count_model, g, w, m, config);
                let rendered = report(&ngram_model, &count_model, config.reporting_size);
                let file_name = format!("{}_{}_g{g}_w{w}_m{m}.txt", config.report_name_prefix, side.name);
                let path = result_folder.join(file_name);
                fs::write(&path, rendered.render()).with_context(|| format!("writing report {}", path.display()))?;
                Ok(path)
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        report_paths.extend(side_paths);
    }

    Ok(SweepOutcome { result_folder, report_paths })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunnerConfigInput;
    use std::fs;

    fn write_project(root: &Path) {
        fs::create_dir_all(root).unwrap();
        fs::write(root.join("mod_a.py"), "def f():\n    if a():\n        b()\n    else:\n        c()\n").unwrap();
        fs::write(root.join("mod_b.py"), "def g():\n    b()\n    a()\n").unwrap();
    }

    #[test]
    fn single_run_produces_a_non_empty_report_when_thresholds_allow_it() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("proj");
        write_project(&root);

        let cli = RunnerConfigInput {
            gram_size: Some(2),
            sequence_length: Some(3),
            minimum_token_occurrence: Some(1),
            ..Default::default()
        };
        let config = RunnerConfig::resolve(cli, None).unwrap();

        let outcome = run_single(&root, &config).unwrap();
        assert!(outcome.report.is_some());
        assert!(outcome.count_model.subsequence_count("a()") >= 1 || outcome.count_model.single_token_count("a()") >= 1);
    }

    #[test]
    fn do_analysis_run_false_skips_the_report() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("proj");
        write_project(&root);

        let cli = RunnerConfigInput {
            do_analysis_run: Some(false),
            ..Default::default()
        };
        let config = RunnerConfig::resolve(cli, None).unwrap();

        let outcome = run_single(&root, &config).unwrap();
        assert!(outcome.report.is_none());
    }

    #[test]
    fn sweep_tuples_excludes_window_shorter_than_gram_size() {
        let cli = RunnerConfigInput {
            gram_sizes: Some(vec![3]),
            sequence_lengths: Some(vec![2, 5]),
            minimum_token_occurrences: Some(vec![1]),
            ..Default::default()
        };
        let config = RunnerConfig::resolve(cli, None).unwrap();
        let tuples = sweep_tuples(&config);
        assert_eq!(tuples, vec![(3, 5, 1)]);
    }

    #[test]
    fn sweep_writes_one_report_file_per_tuple_per_side() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("proj");
        write_project(&root);
        let out_dir = dir.path().join("out");

        let cli = RunnerConfigInput {
            gram_sizes: Some(vec![2]),
            sequence_lengths: Some(vec![3, 4]),
            minimum_token_occurrences: Some(vec![1]),
            analysis_result_folder: Some(out_dir.clone()),
            untyped: Some(true),
            typed: Some(false),
            ..Default::default()
        };
        let config = RunnerConfig::resolve(cli, None).unwrap();

        let outcome = run_sweep(&root, &config).unwrap();
        assert_eq!(outcome.report_paths.len(), 2);
        for path in &outcome.report_paths {
            assert!(path.exists());
        }
    }
}
