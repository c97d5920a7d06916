//! [`CountModel`]: counts every contiguous subsequence anchored at each
//! position of each [`Sequence`], plus per-token totals, and persists the
//! result as the schema in the design's "Persisted CountModel schema".

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use lexigram_common::{Lexeme, Sequence, SequenceKind, SequenceSet, Token};

use crate::error::ModelError;

/// Subsequence and single-token occurrence counts over a project's
/// [`SequenceSet`], plus the sequences themselves (needed by
/// [`crate::NGramModel::build`] for per-token validity filtering and by the
/// reporter for line lookups).
#[derive(Clone, Debug)]
pub struct CountModel {
    project: String,
    saved_line_numbers: bool,
    shortest_sequence_length: usize,
    longest_sequence_length: usize,
    single_token_count: FxHashMap<String, u64>,
    subsequence_count: FxHashMap<String, u64>,
    sequences: SequenceSet,
}

impl CountModel {
    /// Builds a model over every sequence in `sequences`. `max_window_length`
    /// caps how long a subsequence is extended before counting stops widening
    /// it further (§4.6's "may stop extending" cutoff); `None` performs the
    /// full quadratic build, matching the host, which never caps it.
    #[instrument(skip(sequences), fields(project = project))]
    #[must_use]
    pub fn build(project: &str, sequences: &SequenceSet, save_line_numbers: bool, max_window_length: Option<usize>) -> Self {
        let mut single_token_count: FxHashMap<String, u64> = FxHashMap::default();
        let mut subsequence_count: FxHashMap<String, u64> = FxHashMap::default();
        let mut shortest_sequence_length = usize::MAX;
        let mut longest_sequence_length = 0usize;

        for sequence in sequences.iter_all_sequences() {
            let len = sequence.len();
            if len == 0 {
                continue;
            }
            shortest_sequence_length = shortest_sequence_length.min(len);
            longest_sequence_length = longest_sequence_length.max(len);

            for token in &sequence.tokens {
                *single_token_count.entry(token.lexeme.as_text().into_owned()).or_insert(0) += 1;
            }

            for start in 0..len {
                let mut concat = String::new();
                let cap = max_window_length.map_or(len, |cap| len.min(start + cap));
                for end in start..cap {
                    concat.push_str(&sequence.tokens[end].lexeme.as_text());
                    *subsequence_count.entry(concat.clone()).or_insert(0) += 1;
                }
            }
        }

        if shortest_sequence_length == usize::MAX {
            shortest_sequence_length = 0;
        }

        info!(
            sequences = sequences.iter_all_sequences().count(),
            distinct_subsequences = subsequence_count.len(),
            distinct_tokens = single_token_count.len(),
            shortest_sequence_length,
            longest_sequence_length,
            "count model built"
        );

        Self {
            project: project.to_string(),
            saved_line_numbers: save_line_numbers,
            shortest_sequence_length,
            longest_sequence_length,
            single_token_count,
            subsequence_count,
            sequences: sequences.clone(),
        }
    }

    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    #[must_use]
    pub fn saved_line_numbers(&self) -> bool {
        self.saved_line_numbers
    }

    #[must_use]
    pub fn shortest_sequence_length(&self) -> usize {
        self.shortest_sequence_length
    }

    #[must_use]
    pub fn longest_sequence_length(&self) -> usize {
        self.longest_sequence_length
    }

    #[must_use]
    pub fn single_token_count(&self, lexeme: &str) -> u64 {
        self.single_token_count.get(lexeme).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn subsequence_count(&self, key: &str) -> u64 {
        self.subsequence_count.get(key).copied().unwrap_or(0)
    }

    /// Every distinct single-token lexeme paired with its count.
    pub fn single_tokens(&self) -> impl Iterator<Item = (&str, u64)> {
        self.single_token_count.iter().map(|(k, v)| (k.as_str(), *v))
    }

    #[must_use]
    pub fn sequences(&self) -> &SequenceSet {
        &self.sequences
    }

    /// Writes the persisted schema to `path` atomically: a temp file is
    /// created alongside `path` and renamed into place, so a crash mid-write
    /// never leaves a truncated artifact (§5).
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let persisted = PersistedCountModel::from_model(self);
        let json = serde_json::to_string_pretty(&persisted)
            .map_err(|err| ModelError::Persistence(format!("could not serialize count model: {err}")))?;

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|err| ModelError::Persistence(format!("could not create temp file: {err}")))?;
        tmp.write_all(json.as_bytes())
            .map_err(|err| ModelError::Persistence(format!("could not write temp file: {err}")))?;
        tmp.persist(path)
            .map_err(|err| ModelError::Persistence(format!("could not rename temp file into place: {err}")))?;
        Ok(())
    }

    /// Loads a previously saved model. Refuses models saved without line
    /// numbers (§7 `PersistenceError`) since downstream analysis depends on
    /// being able to map a window back to a source line.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let text = fs::read_to_string(path)
            .map_err(|err| ModelError::Persistence(format!("could not read {}: {err}", path.display())))?;
        let persisted: PersistedCountModel = serde_json::from_str(&text)
            .map_err(|err| ModelError::Persistence(format!("malformed count model schema: {err}")))?;
        persisted.into_model()
    }
}

/// The logical schema from the design's persisted-model section, encoded as
/// JSON. `BTreeMap` keys sort lexicographically so two saves of an equal
/// model produce byte-identical JSON.
#[derive(Serialize, Deserialize)]
struct PersistedCountModel {
    project: String,
    saved_line_numbers: bool,
    shortest_sequence_length: usize,
    longest_sequence_length: usize,
    single_tokens: BTreeMap<String, u64>,
    token_sequences: BTreeMap<String, Vec<Vec<(String, u32)>>>,
    count_model: BTreeMap<String, u64>,
}

impl PersistedCountModel {
    fn from_model(model: &CountModel) -> Self {
        let mut token_sequences = BTreeMap::new();
        for (module_path, sequences) in model.sequences.iter_sorted() {
            let encoded: Vec<Vec<(String, u32)>> = sequences
                .iter()
                .map(|seq| seq.tokens.iter().map(|t| (t.lexeme.as_text().into_owned(), t.line)).collect())
                .collect();
            token_sequences.insert(module_path.to_string(), encoded);
        }

        Self {
            project: model.project.clone(),
            saved_line_numbers: model.saved_line_numbers,
            shortest_sequence_length: model.shortest_sequence_length,
            longest_sequence_length: model.longest_sequence_length,
            single_tokens: model.single_token_count.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            token_sequences,
            count_model: model.subsequence_count.iter().map(|(k, v)| (k.clone(), *v)).collect(),
        }
    }

    fn into_model(self) -> Result<CountModel, ModelError> {
        if !self.saved_line_numbers {
            return Err(ModelError::Persistence(
                "count model was saved without line numbers; invalid for downstream analysis".to_string(),
            ));
        }

        let mut sequences = SequenceSet::new();
        for (module_path, encoded) in self.token_sequences {
            let decoded: Vec<Sequence> = encoded
                .into_iter()
                .map(|tokens| {
                    let mut sequence = Sequence::new(module_path.clone(), SequenceKind::Residue);
                    for (text, line) in tokens {
                        sequence.push(Token::new(Lexeme::parse(&text), line));
                    }
                    sequence
                })
                .collect();
            sequences.insert(module_path, decoded);
        }

        Ok(CountModel {
            project: self.project,
            saved_line_numbers: self.saved_line_numbers,
            shortest_sequence_length: self.shortest_sequence_length,
            longest_sequence_length: self.longest_sequence_length,
            single_token_count: self.single_tokens.into_iter().collect(),
            subsequence_count: self.count_model.into_iter().collect(),
            sequences,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexigram_common::token::StructuralMarker;

    fn sequence_abc() -> Sequence {
        let mut seq = Sequence::new("pkg.mod", SequenceKind::Def);
        seq.push(Token::call("A()", 1));
        seq.push(Token::call("B()", 2));
        seq.push(Token::call("C()", 3));
        seq
    }

    #[test]
    fn scenario_four_counts_match_design() {
        let mut set = SequenceSet::new();
        set.insert("pkg.mod", vec![sequence_abc()]);
        let model = CountModel::build("proj", &set, true, None);

        assert_eq!(model.single_token_count("A()"), 1);
        assert_eq!(model.single_token_count("B()"), 1);
        assert_eq!(model.single_token_count("C()"), 1);
        assert_eq!(model.subsequence_count("A()"), 1);
        assert_eq!(model.subsequence_count("A()B()"), 1);
        assert_eq!(model.subsequence_count("A()B()C()"), 1);
        assert_eq!(model.subsequence_count("B()C()"), 1);
        assert_eq!(model.shortest_sequence_length(), 3);
        assert_eq!(model.longest_sequence_length(), 3);
    }

    #[test]
    fn empty_sequences_are_excluded_from_length_metrics() {
        let mut set = SequenceSet::new();
        set.insert("pkg.mod", vec![Sequence::new("pkg.mod", SequenceKind::Residue)]);
        let model = CountModel::build("proj", &set, true, None);
        assert_eq!(model.shortest_sequence_length(), 0);
        assert_eq!(model.longest_sequence_length(), 0);
    }

    #[test]
    fn max_window_length_caps_subsequence_extension() {
        let mut set = SequenceSet::new();
        set.insert("pkg.mod", vec![sequence_abc()]);
        let model = CountModel::build("proj", &set, true, Some(2));
        assert_eq!(model.subsequence_count("A()B()"), 1);
        assert_eq!(model.subsequence_count("A()B()C()"), 0);
    }

    #[test]
    fn structural_marker_round_trips_through_persistence() {
        let mut seq = Sequence::new("pkg.mod", SequenceKind::Def);
        seq.push(Token::structural(StructuralMarker::Def, 1));
        seq.push(Token::call("f()", 1));
        seq.push(Token::structural(StructuralMarker::EndDef, 2));
        let mut set = SequenceSet::new();
        set.insert("pkg.mod", vec![seq]);
        let model = CountModel::build("proj", &set, true, None);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        model.save(&path).unwrap();
        let loaded = CountModel::load(&path).unwrap();

        assert_eq!(loaded.single_token_count("<DEF>"), 1);
        assert_eq!(loaded.single_token_count("f()"), 1);
        assert_eq!(loaded.subsequence_count("<DEF>f()<END_DEF>"), 1);
        assert_eq!(loaded.project(), "proj");
    }

    #[test]
    fn loading_a_model_saved_without_line_numbers_is_rejected() {
        let mut set = SequenceSet::new();
        set.insert("pkg.mod", vec![sequence_abc()]);
        let model = CountModel::build("proj", &set, false, None);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        model.save(&path).unwrap();

        assert!(matches!(CountModel::load(&path), Err(ModelError::Persistence(_))));
    }

    #[test]
    fn malformed_schema_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        fs::write(&path, "{\"not\": \"a count model\"}").unwrap();
        assert!(matches!(CountModel::load(&path), Err(ModelError::Persistence(_))));
    }
}
