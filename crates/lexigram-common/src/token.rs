//! [`Token`] and the closed [`StructuralMarker`] enumeration.

use std::fmt;

/// The closed set of structural bracket markers a tokenizer may emit.
///
/// This is the full enumeration from the external token-set contract; no
/// other spelling is ever produced for structural control flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StructuralMarker {
    If,
    Else,
    EndIf,
    For,
    EndFor,
    While,
    EndWhile,
    Try,
    Except,
    EndExcept,
    Finally,
    EndFinally,
    With,
    EndWith,
    Match,
    Case,
    EndCase,
    EndMatch,
    Def,
    EndDef,
    Async,
    Await,
    Return,
    Raise,
    Yield,
    YieldFrom,
    Break,
    Continue,
    Pass,
    Assert,
    Global,
    Nonlocal,
    Del,
}

impl StructuralMarker {
    /// The canonical bracket text, exactly as it appears in concatenated
    /// lexeme strings (count-model keys, report window text, etc.).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::If => "<IF>",
            Self::Else => "<ELSE>",
            Self::EndIf => "<END_IF>",
            Self::For => "<FOR>",
            Self::EndFor => "<END_FOR>",
            Self::While => "<WHILE>",
            Self::EndWhile => "<END_WHILE>",
            Self::Try => "<TRY>",
            Self::Except => "<EXCEPT>",
            Self::EndExcept => "<END_EXCEPT>",
            Self::Finally => "<FINALLY>",
            Self::EndFinally => "<END_FINALLY>",
            Self::With => "<WITH>",
            Self::EndWith => "<END_WITH>",
            Self::Match => "<MATCH>",
            Self::Case => "<CASE>",
            Self::EndCase => "<END_CASE>",
            Self::EndMatch => "<END_MATCH>",
            Self::Def => "<DEF>",
            Self::EndDef => "<END_DEF>",
            Self::Async => "<ASYNC>",
            Self::Await => "<AWAIT>",
            Self::Return => "<RETURN>",
            Self::Raise => "<RAISE>",
            Self::Yield => "<YIELD>",
            Self::YieldFrom => "<YIELD_FROM>",
            Self::Break => "<BREAK>",
            Self::Continue => "<CONTINUE>",
            Self::Pass => "<PASS>",
            Self::Assert => "<ASSERT>",
            Self::Global => "<GLOBAL>",
            Self::Nonlocal => "<NONLOCAL>",
            Self::Del => "<DEL>",
        }
    }

    /// The opening marker this closer matches, if any (used by the bracket
    /// balance check, P6).
    #[must_use]
    pub const fn opener(self) -> Option<Self> {
        match self {
            Self::EndIf => Some(Self::If),
            Self::EndFor => Some(Self::For),
            Self::EndWhile => Some(Self::While),
            Self::EndExcept => Some(Self::Except),
            Self::EndFinally => Some(Self::Finally),
            Self::EndWith => Some(Self::With),
            Self::EndCase => Some(Self::Case),
            Self::EndMatch => Some(Self::Match),
            Self::EndDef => Some(Self::Def),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_closer(self) -> bool {
        self.opener().is_some()
    }

    /// Parses a marker back from its canonical text, the inverse of
    /// [`Self::as_str`]. Used when restoring a persisted [`Lexeme`].
    #[must_use]
    pub fn from_str(text: &str) -> Option<Self> {
        Some(match text {
            "<IF>" => Self::If,
            "<ELSE>" => Self::Else,
            "<END_IF>" => Self::EndIf,
            "<FOR>" => Self::For,
            "<END_FOR>" => Self::EndFor,
            "<WHILE>" => Self::While,
            "<END_WHILE>" => Self::EndWhile,
            "<TRY>" => Self::Try,
            "<EXCEPT>" => Self::Except,
            "<END_EXCEPT>" => Self::EndExcept,
            "<FINALLY>" => Self::Finally,
            "<END_FINALLY>" => Self::EndFinally,
            "<WITH>" => Self::With,
            "<END_WITH>" => Self::EndWith,
            "<MATCH>" => Self::Match,
            "<CASE>" => Self::Case,
            "<END_CASE>" => Self::EndCase,
            "<END_MATCH>" => Self::EndMatch,
            "<DEF>" => Self::Def,
            "<END_DEF>" => Self::EndDef,
            "<ASYNC>" => Self::Async,
            "<AWAIT>" => Self::Await,
            "<RETURN>" => Self::Return,
            "<RAISE>" => Self::Raise,
            "<YIELD>" => Self::Yield,
            "<YIELD_FROM>" => Self::YieldFrom,
            "<BREAK>" => Self::Break,
            "<CONTINUE>" => Self::Continue,
            "<PASS>" => Self::Pass,
            "<ASSERT>" => Self::Assert,
            "<GLOBAL>" => Self::Global,
            "<NONLOCAL>" => Self::Nonlocal,
            "<DEL>" => Self::Del,
            _ => return None,
        })
    }
}

impl fmt::Display for StructuralMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single lexeme: either a structural marker, a resolved/unresolved call
/// token, or the reserved `UNKNOWN` sentinel for an unresolvable callee.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Lexeme {
    Structural(StructuralMarker),
    /// A call token, already rendered as `[module.][Type.]name()`.
    Call(String),
    /// Reserved for a callee that could not be named at all.
    Unknown,
}

impl Lexeme {
    #[must_use]
    pub fn call(text: impl Into<String>) -> Self {
        Self::Call(text.into())
    }

    /// Parses a lexeme back from its rendered text, the inverse of
    /// [`Self::as_text`]: a known structural spelling becomes that marker,
    /// the literal `UNKNOWN` becomes [`Self::Unknown`], anything else is
    /// treated as a call token. Used when restoring a persisted [`Token`].
    #[must_use]
    pub fn parse(text: &str) -> Self {
        if text == "UNKNOWN" {
            return Self::Unknown;
        }
        match StructuralMarker::from_str(text) {
            Some(marker) => Self::Structural(marker),
            None => Self::Call(text.to_string()),
        }
    }

    #[must_use]
    pub fn as_text(&self) -> std::borrow::Cow<'_, str> {
        match self {
            Self::Structural(marker) => std::borrow::Cow::Borrowed(marker.as_str()),
            Self::Call(text) => std::borrow::Cow::Borrowed(text.as_str()),
            Self::Unknown => std::borrow::Cow::Borrowed("UNKNOWN"),
        }
    }
}

impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

/// A lexeme paired with the source line it originated from (0 when
/// unavailable).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Token {
    pub lexeme: Lexeme,
    pub line: u32,
}

impl Token {
    #[must_use]
    pub fn new(lexeme: Lexeme, line: u32) -> Self {
        Self { lexeme, line }
    }

    #[must_use]
    pub fn structural(marker: StructuralMarker, line: u32) -> Self {
        Self::new(Lexeme::Structural(marker), line)
    }

    #[must_use]
    pub fn call(text: impl Into<String>, line: u32) -> Self {
        Self::new(Lexeme::call(text), line)
    }

    #[must_use]
    pub fn unknown(line: u32) -> Self {
        Self::new(Lexeme::Unknown, line)
    }
}
