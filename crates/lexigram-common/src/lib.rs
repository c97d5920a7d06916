//! Shared data model for the lexigram static-analysis pipeline.
//!
//! This crate has no dependency on the parser, the resolver, or the count/n-gram
//! models — it only defines the vocabulary every other crate shares:
//! [`Token`]/[`Lexeme`], [`Sequence`]/[`SequenceSet`], [`TypeInfo`], and the
//! handful of limits and error kinds that cross crate boundaries.

pub mod error;
pub mod limits;
pub mod sequence;
pub mod token;
pub mod type_info;

pub use error::CoreError;
pub use sequence::{Sequence, SequenceKind, SequenceSet};
pub use token::{Lexeme, StructuralMarker, Token};
pub use type_info::TypeInfo;
