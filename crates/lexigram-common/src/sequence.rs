//! [`Sequence`] and [`SequenceSet`]: the unit of analysis the tokenizer
//! produces and the count/n-gram models consume.

use indexmap::IndexMap;

use crate::token::Token;

/// Whether a [`Sequence`] is a function/method body or the left-over
/// top-level statements of a module or class body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceKind {
    /// Bracketed by `<DEF>`/`<END_DEF>` (optionally `<ASYNC>`-prefixed).
    Def,
    /// Module-level or class-level statements outside any nested def.
    Residue,
}

/// An ordered, cohesive run of [`Token`]s anchored to one module path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sequence {
    pub module_path: String,
    pub kind: SequenceKind,
    pub tokens: Vec<Token>,
}

impl Sequence {
    #[must_use]
    pub fn new(module_path: impl Into<String>, kind: SequenceKind) -> Self {
        Self {
            module_path: module_path.into(),
            kind,
            tokens: Vec::new(),
        }
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The concatenation of every token's lexeme text, in order. This is the
    /// string used as a count-model key and as the substring the reporter
    /// searches for a window's occurrences.
    #[must_use]
    pub fn concat_lexemes(&self) -> String {
        self.tokens.iter().map(|t| t.lexeme.as_text()).collect()
    }
}

/// Mapping from dotted module path to the ordered sequences extracted from
/// that module, sorted by module path for deterministic iteration.
#[derive(Clone, Debug, Default)]
pub struct SequenceSet {
    modules: IndexMap<String, Vec<Sequence>>,
}

impl SequenceSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module_path: impl Into<String>, sequences: Vec<Sequence>) {
        self.modules.insert(module_path.into(), sequences);
    }

    #[must_use]
    pub fn get(&self, module_path: &str) -> Option<&[Sequence]> {
        self.modules.get(module_path).map(Vec::as_slice)
    }

    /// Iterates modules in sorted (deterministic) order regardless of
    /// insertion order, per the "sort module paths" requirement.
    pub fn iter_sorted(&self) -> impl Iterator<Item = (&str, &[Sequence])> {
        let mut keys: Vec<&String> = self.modules.keys().collect();
        keys.sort();
        keys.into_iter()
            .map(move |k| (k.as_str(), self.modules[k].as_slice()))
    }

    pub fn iter_all_sequences(&self) -> impl Iterator<Item = &Sequence> {
        self.modules.values().flatten()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
