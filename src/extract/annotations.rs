//! Shared `@fuz-classes` annotation-comment scanner, a plain text scan
//! rather than an AST pass so it behaves identically for both dialects and
//! for text that a dialect's parser cannot handle.

use crate::source_index::SourceIndex;

use super::shared::ExtractionResult;

const MARKER: &str = "@fuz-classes";

/// Scan `source` for `@fuz-classes` annotation comments, in both
/// single-line (`// @fuz-classes a b c`) and block (`/* @fuz-classes a b c
/// */`) forms, recording every whitespace-separated class name that
/// follows the marker on the same comment.
pub fn scan_annotations(source: &str, index: &SourceIndex, result: &mut ExtractionResult) {
    let mut search_from = 0;
    while search_from < source.len() {
        let Some(rel) = source[search_from..].find(MARKER) else {
            break;
        };
        let marker_start = search_from + rel;
        let after = marker_start + MARKER.len();

        let line_end = source[after..]
            .find('\n')
            .map(|i| after + i)
            .unwrap_or(source.len());
        let block_end = source[after..].find("*/").map(|i| after + i);
        let end = match block_end {
            Some(b) if b < line_end => b,
            _ => line_end,
        };

        let names_text = &source[after..end];
        let location = index.locate(marker_start);
        for name in names_text.split_whitespace() {
            result.add_class(name.to_string(), location.clone());
        }

        search_from = after.max(end);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_annotation_is_scanned() {
        let source = "// @fuz-classes btn card\nconst x = 1;";
        let index = SourceIndex::new("f.ts", source);
        let mut result = ExtractionResult::default();
        scan_annotations(source, &index, &mut result);
        assert!(result.classes.contains_key("btn"));
        assert!(result.classes.contains_key("card"));
    }

    #[test]
    fn block_annotation_stops_at_comment_close() {
        let source = "/* @fuz-classes btn */\nconst x = 1;";
        let index = SourceIndex::new("f.ts", source);
        let mut result = ExtractionResult::default();
        scan_annotations(source, &index, &mut result);
        assert_eq!(result.classes.len(), 1);
        assert!(result.classes.contains_key("btn"));
    }

    #[test]
    fn no_annotation_yields_empty_result() {
        let source = "const x = 1;";
        let index = SourceIndex::new("f.ts", source);
        let mut result = ExtractionResult::default();
        scan_annotations(source, &index, &mut result);
        assert!(result.classes.is_empty());
    }
}
