//! Maps byte offsets to 1-based (line, column) locations.
//!
//! Plays the same role here as `swc_common::SourceMap::lookup_char_pos`
//! does for the script dialect, but hand-rolled for the markup dialect,
//! which has no swc `SourceMap` of its own — shared by both dialects so
//! offsets agree on one coordinate system.

use crate::diagnostics::SourceLocation;

/// A prefix index of line-start byte offsets, built once per file.
pub struct SourceIndex<'a> {
    file: &'a str,
    /// Byte offset of the start of each line; `line_starts[0] == 0`.
    line_starts: Vec<usize>,
    len: usize,
}

impl<'a> SourceIndex<'a> {
    pub fn new(file: &'a str, source: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            file,
            line_starts,
            len: source.len(),
        }
    }

    /// Locate the (line, column) for a byte offset. Offsets beyond the end
    /// of the source clamp to the last line.
    pub fn locate(&self, offset: usize) -> SourceLocation {
        let offset = offset.min(self.len);
        // Binary search for the last line start <= offset.
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let line_start = self.line_starts[line_idx];
        let column = offset - line_start + 1;
        SourceLocation::new(self.file, line_idx + 1, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_first_line_first_column() {
        let idx = SourceIndex::new("f.ts", "abc\ndef");
        assert_eq!(idx.locate(0), SourceLocation::new("f.ts", 1, 1));
    }

    #[test]
    fn locate_after_newline_starts_new_line() {
        let idx = SourceIndex::new("f.ts", "abc\ndef");
        // byte 4 is 'd', first char of line 2
        assert_eq!(idx.locate(4), SourceLocation::new("f.ts", 2, 1));
    }

    #[test]
    fn locate_is_log_n_binary_search_correct_mid_file() {
        let src = "a\nbb\nccc\ndddd\n";
        let idx = SourceIndex::new("f.ts", src);
        // line 3 starts at offset 5 ("a\nbb\n" = 5 bytes)
        assert_eq!(idx.locate(5), SourceLocation::new("f.ts", 3, 1));
        assert_eq!(idx.locate(7), SourceLocation::new("f.ts", 3, 3));
    }

    #[test]
    fn locate_clamps_offsets_past_end() {
        let idx = SourceIndex::new("f.ts", "abc");
        assert_eq!(idx.locate(1000), idx.locate(3));
    }

    #[test]
    fn locate_empty_source() {
        let idx = SourceIndex::new("f.ts", "");
        assert_eq!(idx.locate(0), SourceLocation::new("f.ts", 1, 1));
    }
}
