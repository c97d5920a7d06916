//! Type-aware tokenization entry point: call tokens qualified with inferred
//! receiver/return types, consulting a prebuilt project-wide type cache.

use rustpython_ast::Stmt;

use lexigram_common::Sequence;
use lexigram_resolver::ProjectTypeCache;

use crate::diagnostics::RunDiagnostics;
use crate::walker::Walker;

/// Same shape as [`crate::tokenize_module`], but every call token is
/// qualified with a module, receiver type, or return type whenever the
/// project-wide cache can resolve one.
#[must_use]
pub fn tokenize_module_typed(
    module_path: &str,
    source: &str,
    body: &[Stmt],
    type_cache: &ProjectTypeCache,
) -> (Vec<Sequence>, RunDiagnostics) {
    Walker::run_typed(module_path, source, body, type_cache)
}
