//! AST-to-[`lexigram_common::Sequence`] extraction.
//!
//! Two entry points share one dispatch table ([`walker`]): [`tokenize_module`]
//! produces bare call tokens with no project knowledge, and
//! [`tokenize_module_typed`] additionally qualifies call tokens with inferred
//! receiver/return types from a prebuilt [`lexigram_resolver::ProjectTypeCache`].

mod diagnostics;
mod line_index;
mod tokenizer;
mod type_tokenizer;
mod walker;

pub use diagnostics::RunDiagnostics;
pub use tokenizer::tokenize_module;
pub use type_tokenizer::tokenize_module_typed;
