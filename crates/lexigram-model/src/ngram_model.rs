//! [`NGramModel`]: Markov-`n` probability estimate over fixed-length windows
//! drawn from a project's sequences, built from an immutable [`CountModel`].

use std::collections::BTreeMap;

use tracing::instrument;

use lexigram_common::Token;

use crate::count_model::CountModel;
use crate::decimal::Decimal4;

/// How a sequence longer than the window length is split into windows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SplitMode {
    /// Stride 1: every position starts a window (§4.7's default).
    #[default]
    Sliding,
    /// Stride = window length: non-overlapping chunks, short tail discarded.
    Hard,
}

/// Probability table over every distinct window that passed the validity
/// filter, keyed by the window's concatenated lexeme text.
#[derive(Clone, Debug)]
pub struct NGramModel {
    gram_size: usize,
    window_length: usize,
    min_occurrence: u64,
    probabilities: BTreeMap<String, Decimal4>,
}

impl NGramModel {
    /// Builds the model. `gram_size` (`g`) bounds how many preceding tokens
    /// condition each factor; `window_length` (`w`, `w >= g`) is the size of
    /// the sliding window; `min_occurrence` (`m`) is the validity-filter
    /// threshold on `single_token_count`.
    #[instrument(skip(counts), fields(gram_size, window_length, min_occurrence))]
    #[must_use]
    pub fn build(counts: &CountModel, gram_size: usize, window_length: usize, min_occurrence: u64, split_mode: SplitMode) -> Self {
        debug_assert!(gram_size >= 1, "gram_size must be at least 1");
        debug_assert!(window_length >= gram_size, "window_length must be at least gram_size");

        let total_valid_single_count: u64 = counts
            .single_tokens()
            .filter(|(_, count)| *count >= min_occurrence)
            .map(|(_, count)| count)
            .sum();

        let mut probabilities = BTreeMap::new();

        for sequence in counts.sequences().iter_all_sequences() {
            for window in split_windows(&sequence.tokens, window_length, split_mode) {
                if window.len() < gram_size {
                    continue;
                }
                let key = concat_window(window);
                if probabilities.contains_key(&key) {
                    continue;
                }
                if let Some(probability) = probability_for_window(counts, window, gram_size, min_occurrence, total_valid_single_count) {
                    probabilities.insert(key, probability);
                }
            }
        }

        Self {
            gram_size,
            window_length,
            min_occurrence,
            probabilities,
        }
    }

    #[must_use]
    pub fn gram_size(&self) -> usize {
        self.gram_size
    }

    #[must_use]
    pub fn window_length(&self) -> usize {
        self.window_length
    }

    #[must_use]
    pub fn min_occurrence(&self) -> u64 {
        self.min_occurrence
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    /// Iterates every window with its probability, in key order. The
    /// reporter re-sorts these by probability; key order here only matters
    /// for reproducible iteration, not for the reported ranking.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal4)> {
        self.probabilities.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

fn concat_window(window: &[Token]) -> String {
    window.iter().map(|t| t.lexeme.as_text()).collect()
}

/// `None` means the window failed the validity filter (some token's single
/// count is below `min_occurrence`); the window contributes nothing.
fn probability_for_window(counts: &CountModel, window: &[Token], gram_size: usize, min_occurrence: u64, total_valid_single_count: u64) -> Option<Decimal4> {
    for token in window {
        if counts.single_token_count(&token.lexeme.as_text()) < min_occurrence {
            return None;
        }
    }

    let first_text = window[0].lexeme.as_text();
    let mut probability = Decimal4::from_ratio(counts.single_token_count(&first_text), total_valid_single_count);

    for i in 1..window.len() {
        let prefix_len = gram_size.saturating_sub(1).min(i);
        let prefix: String = window[i - prefix_len..i].iter().map(|t| t.lexeme.as_text()).collect();
        let prefix_with_token = format!("{prefix}{}", window[i].lexeme.as_text());

        let denominator = counts.subsequence_count(&prefix);
        let numerator = counts.subsequence_count(&prefix_with_token);
        probability = probability.mul(Decimal4::from_ratio(numerator, denominator));
    }

    Some(probability)
}

/// Splits `tokens` into windows per §4.7: a sequence no longer than `w` is
/// one window regardless of split mode; longer sequences split per
/// `split_mode`.
fn split_windows(tokens: &[Token], window_length: usize, split_mode: SplitMode) -> Vec<&[Token]> {
    if tokens.len() <= window_length || window_length == 0 {
        return vec![tokens];
    }
    match split_mode {
        SplitMode::Sliding => (0..=tokens.len() - window_length).map(|start| &tokens[start..start + window_length]).collect(),
        SplitMode::Hard => tokens.chunks_exact(window_length).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexigram_common::{Sequence, SequenceKind, SequenceSet, Token};

    fn sequence_abc() -> Sequence {
        let mut seq = Sequence::new("pkg.mod", SequenceKind::Def);
        seq.push(Token::call("A()", 1));
        seq.push(Token::call("B()", 2));
        seq.push(Token::call("C()", 3));
        seq
    }

    #[test]
    fn scenario_five_single_window_probability() {
        let mut set = SequenceSet::new();
        set.insert("pkg.mod", vec![sequence_abc()]);
        let counts = CountModel::build("proj", &set, true, None);

        let model = NGramModel::build(&counts, 2, 3, 1, SplitMode::Sliding);
        assert_eq!(model.len(), 1);
        let (key, probability) = model.iter().next().unwrap();
        assert_eq!(key, "A()B()C()");
        assert_eq!(probability.to_string(), "0.3333");
    }

    #[test]
    fn scenario_six_filter_empties_the_model() {
        let mut set = SequenceSet::new();
        set.insert("pkg.mod", vec![sequence_abc()]);
        let counts = CountModel::build("proj", &set, true, None);

        let model = NGramModel::build(&counts, 2, 3, 2, SplitMode::Sliding);
        assert!(model.is_empty());
    }

    #[test]
    fn sliding_windows_overlap_with_stride_one() {
        let mut seq = Sequence::new("pkg.mod", SequenceKind::Def);
        for name in ["A", "B", "C", "D"] {
            seq.push(Token::call(format!("{name}()"), 1));
        }
        let windows = split_windows(&seq.tokens, 2, SplitMode::Sliding);
        assert_eq!(windows.len(), 3);
        assert_eq!(concat_window(windows[0]), "A()B()");
        assert_eq!(concat_window(windows[2]), "C()D()");
    }

    #[test]
    fn hard_split_discards_short_tail() {
        let mut seq = Sequence::new("pkg.mod", SequenceKind::Def);
        for name in ["A", "B", "C", "D", "E"] {
            seq.push(Token::call(format!("{name}()"), 1));
        }
        let windows = split_windows(&seq.tokens, 2, SplitMode::Hard);
        assert_eq!(windows.len(), 2);
        assert_eq!(concat_window(windows[1]), "C()D()");
    }

    #[test]
    fn window_shorter_than_gram_size_never_contributes() {
        let mut seq = Sequence::new("pkg.mod", SequenceKind::Def);
        seq.push(Token::call("A()", 1));
        let mut set = SequenceSet::new();
        set.insert("pkg.mod", vec![seq]);
        let counts = CountModel::build("proj", &set, true, None);

        let model = NGramModel::build(&counts, 2, 5, 1, SplitMode::Sliding);
        assert!(model.is_empty());
    }

    #[test]
    fn every_probability_is_within_unit_bounds() {
        let mut seq = Sequence::new("pkg.mod", SequenceKind::Def);
        for name in ["A", "B", "A", "C", "B", "A"] {
            seq.push(Token::call(format!("{name}()"), 1));
        }
        let mut set = SequenceSet::new();
        set.insert("pkg.mod", vec![seq]);
        let counts = CountModel::build("proj", &set, true, None);

        let model = NGramModel::build(&counts, 2, 3, 1, SplitMode::Sliding);
        for (_, probability) in model.iter() {
            assert!(probability >= Decimal4::ZERO && probability <= Decimal4::ONE);
        }
    }
}
