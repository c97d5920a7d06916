//! Project-wide type resolution: import tracking, function/method return
//! types, and per-file variable scope tracking.
//!
//! This crate turns a directory of source files into the caches the typed
//! tokenizer consults while qualifying call tokens with inferred types. It
//! never inspects call sites itself — that is `lexigram-tokenizer`'s job.

pub mod annotation;
pub mod import_cache;
pub mod preprocessor;
pub mod type_cache;
pub mod variable_cache;

pub use annotation::type_info_from_annotation;
pub use import_cache::ImportCache;
pub use preprocessor::{discover_project_files, preprocess_project, DiscoveredFile};
pub use type_cache::{ClassCache, FileCache, ProjectTypeCache};
pub use variable_cache::{Scope, VariableTypeCache};
