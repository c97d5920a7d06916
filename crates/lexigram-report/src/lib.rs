//! Selects the lowest-probability windows from an n-gram model, resolves
//! their originating (module, line) occurrences, and renders a deterministic
//! plain-text report.

pub mod reporter;

pub use reporter::{build_report, Report, ReportEntry};
