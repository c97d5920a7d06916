//! Subsequence counting and Markov-`n` probability estimation over a
//! project's extracted token sequences.
//!
//! [`CountModel`] counts every contiguous subsequence starting at each
//! position of each [`lexigram_common::Sequence`]; [`NGramModel`] is built
//! from an immutable `CountModel` and assigns a probability to each
//! fixed-length window.

pub mod count_model;
pub mod decimal;
pub mod error;
pub mod ngram_model;

pub use count_model::CountModel;
pub use decimal::Decimal4;
pub use error::ModelError;
pub use ngram_model::{NGramModel, SplitMode};
