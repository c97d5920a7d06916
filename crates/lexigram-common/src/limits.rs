//! Centralized limits for the tokenizer and model builders.
//!
//! Kept small and close to the algorithms that use them, rather than a
//! sprawling catalog — this pipeline has two genuinely unbounded recursions
//! (AST depth during tokenization, TypeInfo depth during navigation) and one
//! genuinely quadratic loop (count-model build).

/// Maximum AST recursion depth during tokenization. Deeply nested
/// control-flow or expressions beyond this depth abort the current sequence
/// rather than overflow the stack.
pub const MAX_AST_DEPTH: u32 = 512;

/// Maximum TypeInfo nesting depth considered during navigation. Annotation
/// nesting beyond this is treated as `NavigationError` (unknown receiver
/// type) rather than walked indefinitely.
pub const MAX_TYPE_INFO_DEPTH: usize = 32;

/// Default set of directory names excluded from a project walk.
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &["venv", ".venv", "__pycache__", ".git", "node_modules"];
