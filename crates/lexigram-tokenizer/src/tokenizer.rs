//! Untyped tokenization entry point: bare call tokens, no variable or return
//! type resolution.

use rustpython_ast::Stmt;

use lexigram_common::Sequence;

use crate::diagnostics::RunDiagnostics;
use crate::walker::Walker;

/// Extracts one [`Sequence`] per top-level/class-level function (and, if any
/// statements sit outside every def, one trailing residue sequence) from an
/// already-parsed module body.
#[must_use]
pub fn tokenize_module(module_path: &str, source: &str, body: &[Stmt]) -> (Vec<Sequence>, RunDiagnostics) {
    Walker::run_untyped(module_path, source, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustpython_ast::Mod;
    use rustpython_parser::{parse, Mode};

    fn parse_module(source: &str) -> Vec<Stmt> {
        let Mod::Module(module) = parse(source, Mode::Module, "<test>").expect("valid module") else {
            panic!("expected module");
        };
        module.body
    }

    #[test]
    fn class_with_method_and_self_receiver_yields_one_sequence_per_method() {
        let source = concat!(
            "class Widget:\n",
            "    def __init__(self):\n",
            "        self.state = load()\n",
            "    def tick(self):\n",
            "        self.render()\n"
        );
        let body = parse_module(source);
        let (sequences, diagnostics) = tokenize_module("pkg.widget", source, &body);
        assert_eq!(sequences.len(), 2);
        assert!(sequences[0].concat_lexemes().contains("load()"));
        assert!(sequences[1].concat_lexemes().contains("render()"));
        assert_eq!(diagnostics.type_inferred_call_tokens, 0);
        assert!(diagnostics.total_call_tokens >= 2);
    }

    #[test]
    fn module_level_statements_become_one_residue_sequence() {
        let source = "CONFIG = load_config()\ndef f():\n    pass\n";
        let body = parse_module(source);
        let (sequences, _) = tokenize_module("pkg.mod", source, &body);
        assert_eq!(sequences.len(), 2);
        assert!(sequences[1].concat_lexemes().contains("load_config()"));
    }

    #[test]
    fn nested_def_opens_its_own_sequence_instead_of_inlining() {
        let source = "def outer():\n    def inner():\n        helper()\n    inner()\n";
        let body = parse_module(source);
        let (sequences, _) = tokenize_module("pkg.mod", source, &body);
        assert_eq!(sequences.len(), 2);
        assert!(sequences.iter().any(|s| s.concat_lexemes().contains("helper()")));
        assert!(sequences.iter().any(|s| s.concat_lexemes().contains("inner()")));
    }
}
