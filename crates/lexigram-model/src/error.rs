//! This crate's fatal error type.
//!
//! §7 calls for "a small `#[derive(Debug)]` error enum per crate (e.g.
//! `lexigram_model::ModelError`)" covering persistence and invariant
//! violations. [`lexigram_common::CoreError`] already defines exactly those
//! two variants for exactly this purpose, so rather than duplicate it this
//! crate re-exports it under the name the design calls for.

pub use lexigram_common::CoreError as ModelError;
