//! [`LineIndex`]: converts a byte offset into a parsed source file into a
//! 1-indexed line number.
//!
//! `rustpython_ast` nodes carry a byte-range (`Ranged::range`), not a line
//! number directly, so every tokenizer entry point builds one of these once
//! per file and looks up each node's starting line as it visits it.

use rustpython_ast::text_size::TextSize;

pub struct LineIndex {
    /// Byte offset of the start of each line; `line_starts[0] == 0`.
    line_starts: Vec<u32>,
}

impl LineIndex {
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((offset + 1) as u32);
            }
        }
        Self { line_starts }
    }

    /// 1-indexed line number containing `offset`. Clamps to the last known
    /// line rather than panicking on an out-of-range offset.
    #[must_use]
    pub fn line_number(&self, offset: TextSize) -> u32 {
        let offset: u32 = offset.into();
        match self.line_starts.binary_search(&offset) {
            Ok(idx) => (idx + 1) as u32,
            Err(idx) => idx.max(1) as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_is_one() {
        let index = LineIndex::new("a = 1\nb = 2\n");
        assert_eq!(index.line_number(TextSize::from(0)), 1);
    }

    #[test]
    fn offset_on_second_line() {
        let index = LineIndex::new("a = 1\nb = 2\n");
        assert_eq!(index.line_number(TextSize::from(6)), 2);
    }

    #[test]
    fn offset_past_last_newline_is_third_line() {
        let index = LineIndex::new("a = 1\nb = 2\nc = 3");
        assert_eq!(index.line_number(TextSize::from(12)), 3);
    }
}
