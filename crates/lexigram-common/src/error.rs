//! Error kinds that cross crate boundaries.
//!
//! `ParseError`/`ResolutionError`/`NavigationError` are recovered inline by
//! the component that encounters them (logged, degraded to a best-effort
//! value) and never reach this type. [`CoreError`] covers only the two kinds
//! the design declares fatal-to-the-caller: persistence and invariant
//! violations.

use std::fmt;

#[derive(Debug)]
pub enum CoreError {
    /// A saved model has missing or mismatched schema fields, or was saved
    /// without line numbers.
    Persistence(String),
    /// An invariant the validity filter is supposed to guarantee did not
    /// hold. Indicates a programming bug, not bad input.
    InvariantViolation(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persistence(msg) => write!(f, "persistence error: {msg}"),
            Self::InvariantViolation(msg) => write!(f, "invariant violation: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}
