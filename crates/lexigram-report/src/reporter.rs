//! [`Report`]/[`build_report`]: selects the lowest-probability windows from
//! an [`NGramModel`], resolves their originating (module, line) occurrences,
//! and renders the result as deterministic plain text.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use tracing::instrument;

use lexigram_common::SequenceSet;
use lexigram_model::{Decimal4, NGramModel};

/// `g = w` reports the first 30 entries regardless of `reporting_size`
/// (§4.8 point 2).
const GRAM_EQUALS_WINDOW_REPORT_SIZE: usize = 30;

/// One selected window: its text, probability, and every (module, line)
/// occurrence, sorted by module path with lines ascending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportEntry {
    pub window: String,
    pub probability: Decimal4,
    pub occurrences: BTreeMap<String, Vec<u32>>,
}

/// The header parameters plus the selected entries, in reporting order
/// (lowest probability first).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub gram_size: usize,
    pub window_length: usize,
    pub min_occurrence: u64,
    pub entries: Vec<ReportEntry>,
}

impl Report {
    /// Renders the deterministic plain-text layout: a header line, then each
    /// entry terminated by a fixed divider. Byte-identical across runs for
    /// identical input and parameters (P4).
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Gram Size: {}, Sequence Length: {}, Minimum Token Occurrence: {}\n",
            self.gram_size, self.window_length, self.min_occurrence
        ));

        if self.entries.is_empty() {
            out.push_str("No n-grams met the minimum occurrence threshold; report is empty.\n");
            return out;
        }

        const DIVIDER: &str = "----------------------------------------";
        for entry in &self.entries {
            out.push_str(DIVIDER);
            out.push('\n');
            out.push_str(&format!("Window: {}\n", entry.window));
            out.push_str(&format!("Probability: {}\n", entry.probability));
            out.push_str("Occurrences:\n");
            for (module, lines) in &entry.occurrences {
                let rendered_lines: Vec<String> = lines.iter().map(ToString::to_string).collect();
                out.push_str(&format!("  {module}: [{}]\n", rendered_lines.join(", ")));
            }
        }
        out.push_str(DIVIDER);
        out.push('\n');
        out
    }
}

/// Builds a [`Report`] from `model`, looking up each selected window's
/// occurrences in `sequences`. `reporting_size` is ignored when
/// `gram_size == window_length` (§4.8 point 2).
#[instrument(skip(model, sequences), fields(gram_size = model.gram_size(), window_length = model.window_length()))]
#[must_use]
pub fn build_report(model: &NGramModel, sequences: &SequenceSet, reporting_size: usize) -> Report {
    let mut ranked: Vec<(&str, Decimal4)> = model.iter().collect();
    ranked.sort_by(|(a_key, a_prob), (b_key, b_prob)| a_prob.cmp(b_prob).then_with(|| a_key.cmp(b_key)));

    let take = if model.gram_size() == model.window_length() {
        GRAM_EQUALS_WINDOW_REPORT_SIZE
    } else {
        reporting_size
    };

    let entries = ranked
        .into_iter()
        .take(take)
        .map(|(window, probability)| ReportEntry {
            window: window.to_string(),
            probability,
            occurrences: find_occurrences(sequences, window),
        })
        .collect();

    Report {
        gram_size: model.gram_size(),
        window_length: model.window_length(),
        min_occurrence: model.min_occurrence(),
        entries,
    }
}

/// Locates every (module, starting line) pair where `window` appears as a
/// substring of a sequence's concatenated lexemes. Overlapping matches are
/// all counted (§9's open question: a match may land inside a call token's
/// parenthesis-suffix boundary; this is accepted as intended rather than
/// guarded against).
fn find_occurrences(sequences: &SequenceSet, window: &str) -> BTreeMap<String, Vec<u32>> {
    let mut by_module: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();

    for (module_path, module_sequences) in sequences.iter_sorted() {
        for sequence in module_sequences {
            let concat = sequence.concat_lexemes();
            if concat.len() < window.len() {
                continue;
            }

            let mut offsets = Vec::with_capacity(sequence.tokens.len());
            let mut cursor = 0usize;
            for token in &sequence.tokens {
                let text = token.lexeme.as_text();
                offsets.push((cursor, cursor + text.len()));
                cursor += text.len();
            }

            let mut search_from = 0usize;
            while let Some(relative) = concat.get(search_from..).and_then(|s| s.find(window)) {
                let absolute = search_from + relative;
                if let Some(idx) = offsets.iter().position(|&(start, end)| absolute >= start && absolute < end) {
                    by_module.entry(module_path.to_string()).or_default().insert(sequence.tokens[idx].line);
                }
                search_from = absolute + 1;
                if search_from >= concat.len() {
                    break;
                }
            }
        }
    }

    by_module.into_iter().map(|(module, lines)| (module, lines.into_iter().collect())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexigram_common::{Sequence, SequenceKind, Token};
    use lexigram_model::{CountModel, SplitMode};

    fn sequence_abc(module: &str) -> Sequence {
        let mut seq = Sequence::new(module, SequenceKind::Def);
        seq.push(Token::call("A()", 10));
        seq.push(Token::call("B()", 11));
        seq.push(Token::call("C()", 12));
        seq
    }

    #[test]
    fn scenario_five_report_locates_the_window_occurrence() {
        let mut sequences = SequenceSet::new();
        sequences.insert("pkg.mod", vec![sequence_abc("pkg.mod")]);
        let counts = CountModel::build("proj", &sequences, true, None);
        let model = NGramModel::build(&counts, 2, 3, 1, SplitMode::Sliding);

        let report = build_report(&model, &sequences, 10);
        assert_eq!(report.entries.len(), 1);
        let entry = &report.entries[0];
        assert_eq!(entry.window, "A()B()C()");
        assert_eq!(entry.probability.to_string(), "0.3333");
        assert_eq!(entry.occurrences.get("pkg.mod"), Some(&vec![10]));
    }

    #[test]
    fn scenario_six_empty_model_renders_an_empty_report() {
        let mut sequences = SequenceSet::new();
        sequences.insert("pkg.mod", vec![sequence_abc("pkg.mod")]);
        let counts = CountModel::build("proj", &sequences, true, None);
        let model = NGramModel::build(&counts, 2, 3, 2, SplitMode::Sliding);

        let report = build_report(&model, &sequences, 10);
        assert!(report.entries.is_empty());
        assert!(report.render().contains("report is empty"));
    }

    #[test]
    fn gram_size_equals_window_length_caps_at_thirty_regardless_of_reporting_size() {
        let mut sequences = SequenceSet::new();
        let mut seq = Sequence::new("pkg.mod", SequenceKind::Def);
        for i in 0..50 {
            seq.push(Token::call(format!("f{i}()"), i as u32 + 1));
        }
        sequences.insert("pkg.mod", vec![seq]);
        let counts = CountModel::build("proj", &sequences, true, None);
        let model = NGramModel::build(&counts, 2, 2, 1, SplitMode::Sliding);

        let report = build_report(&model, &sequences, 5);
        assert!(report.entries.len() <= GRAM_EQUALS_WINDOW_REPORT_SIZE);
        assert!(report.entries.len() > 5);
    }

    #[test]
    fn render_is_deterministic_across_calls() {
        let mut sequences = SequenceSet::new();
        sequences.insert("pkg.mod", vec![sequence_abc("pkg.mod")]);
        let counts = CountModel::build("proj", &sequences, true, None);
        let model = NGramModel::build(&counts, 2, 3, 1, SplitMode::Sliding);

        let first = build_report(&model, &sequences, 10).render();
        let second = build_report(&model, &sequences, 10).render();
        assert_eq!(first, second);
    }

    #[test]
    fn report_header_reflects_model_parameters() {
        let mut sequences = SequenceSet::new();
        sequences.insert("pkg.mod", vec![sequence_abc("pkg.mod")]);
        let counts = CountModel::build("proj", &sequences, true, None);
        let model = NGramModel::build(&counts, 2, 3, 1, SplitMode::Sliding);
        let report = build_report(&model, &sequences, 10);
        assert!(report.render().starts_with("Gram Size: 2, Sequence Length: 3, Minimum Token Occurrence: 1\n"));
    }
}
