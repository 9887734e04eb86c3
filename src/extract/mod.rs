//! Per-file class extraction, dispatched by file extension.

mod annotations;
mod markup;
mod script;
mod shared;

pub use shared::{ExtractionResult, looks_like_class_identifier, normalize_identifier};

/// Extract classes (and, for markup files, elements) from one file's
/// contents. `file` is used only for diagnostics and source locations —
/// this crate never touches the filesystem itself.
///
/// Returns `None` when `file`'s extension is not one of the recognized
/// dialects; callers are expected to have already filtered the file list
/// (file enumeration and filtering is the embedder's responsibility).
///
/// `.html` is markup dialect without script parse: its `<script>` bodies
/// are not forwarded to the script dialect, matching the markup dialect's
/// own template/component file format, which does parse them.
pub fn extract_file(file: &str, source: &str) -> Option<ExtractionResult> {
    if file.ends_with(".svelte") {
        Some(markup::extract(file, source, true))
    } else if file.ends_with(".html") {
        Some(markup::extract(file, source, false))
    } else if file.ends_with(".ts")
        || file.ends_with(".js")
        || file.ends_with(".tsx")
        || file.ends_with(".jsx")
    {
        Some(script::extract(file, source))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_markup_dialect_for_svelte() {
        let result = extract_file("f.svelte", r#"<div class="btn"></div>"#).unwrap();
        assert!(result.classes.contains_key("btn"));
    }

    #[test]
    fn dispatches_script_dialect_for_tsx() {
        let result = extract_file("f.tsx", r#"const x = <div className="btn" />;"#).unwrap();
        assert!(result.classes.contains_key("btn"));
    }

    #[test]
    fn unrecognized_extension_returns_none() {
        assert!(extract_file("f.json", "{}").is_none());
    }

    #[test]
    fn html_does_not_parse_embedded_script() {
        let src = "<div></div>\n<script>\n  const x = <div className=\"inner-btn\" />;\n</script>";
        let result = extract_file("f.html", src).unwrap();
        assert!(!result.classes.contains_key("inner-btn"));
    }
}
