//! Markup dialect extractor: hand-rolled tag/attribute scanner for
//! `.svelte`/`.html` files. Deliberately not a full HTML/Svelte AST — it
//! only scans for tag opens, `class` attributes and embedded
//! `<script>`/`<style>` bodies.

use crate::source_index::SourceIndex;
use crate::var_graph::extract_var_refs;

use super::annotations::scan_annotations;
use super::script;
use super::shared::ExtractionResult;

/// Tag name prefixes belonging to framework meta-elements: never treated as
/// elements themselves, but their children are still scanned.
const FRAMEWORK_META_PREFIXES: &[&str] = &["svelte:"];

/// `parse_script` is false for `.html` (markup dialect without script
/// parse): `<script>` bodies are then skipped whole rather than forwarded
/// to the script dialect, the same way `<style>` bodies always are.
pub fn extract(file: &str, source: &str, parse_script: bool) -> ExtractionResult {
    let index = SourceIndex::new(file, source);
    let mut result = ExtractionResult::default();
    scan_annotations(source, &index, &mut result);

    let bytes = source.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        if source[i..].starts_with("<!--") {
            i = match source[i..].find("-->") {
                Some(end) => i + end + 3,
                None => source.len(),
            };
            continue;
        }
        if source[i..].starts_with("</") {
            i += 2;
            continue;
        }

        let Some(tag) = scan_tag_open(source, i) else {
            i += 1;
            continue;
        };

        for (attr_name, attr_value, value_start) in &tag.attributes {
            if attr_name == "class" {
                let loc = index.locate(*value_start);
                for token in attr_value.split_whitespace() {
                    result.add_class(token.to_string(), loc.clone());
                }
            }
            if attr_value.contains("var(--") {
                result.css_variables.extend(extract_var_refs(attr_value));
            }
        }

        if is_element_tag(&tag.name) {
            result.elements.insert(tag.name.clone());
        }

        if tag.self_closing {
            i = tag.end;
            continue;
        }

        if tag.name.eq_ignore_ascii_case("script") {
            if let Some((body_start, body_end, after)) = find_closing(source, tag.end, "script") {
                if parse_script {
                    let body = &source[body_start..body_end];
                    let body_loc = index.locate(body_start);
                    let mut sub = script::extract(file, body);
                    sub.remap(body_loc.line, body_loc.column);
                    result.merge(sub);
                }
                i = after;
                continue;
            }
        }

        if tag.name.eq_ignore_ascii_case("style") {
            // A <style> block's content belongs to the base stylesheet, not
            // this extraction pass; skip past it whole so its text is never
            // mistaken for markup, but its var(--NAME) references still
            // count as detected CSS variables.
            if let Some((body_start, body_end, after)) = find_closing(source, tag.end, "style") {
                result
                    .css_variables
                    .extend(extract_var_refs(&source[body_start..body_end]));
                i = after;
                continue;
            }
        }

        i = tag.end;
    }

    result
}

struct TagOpen {
    name: String,
    attributes: Vec<(String, String, usize)>,
    end: usize,
    self_closing: bool,
}

/// Scan one `<tag ...>` starting at `start` (the `<`). Returns `None` if
/// this doesn't look like a tag open (e.g. a bare `<` in text/code).
fn scan_tag_open(source: &str, start: usize) -> Option<TagOpen> {
    let bytes = source.as_bytes();
    let mut i = start + 1;
    let name_start = i;
    if i >= bytes.len() || !(bytes[i].is_ascii_alphabetic() || bytes[i] == b'-') {
        return None;
    }
    while i < bytes.len() && is_tag_name_byte(bytes[i]) {
        i += 1;
    }
    let name = source[name_start..i].to_string();

    let mut attributes = Vec::new();
    let mut self_closing = false;
    loop {
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        if bytes[i] == b'/' && source[i..].starts_with("/>") {
            self_closing = true;
            i += 2;
            break;
        }
        if bytes[i] == b'>' {
            i += 1;
            break;
        }
        let attr_name_start = i;
        while i < bytes.len() && is_attr_name_byte(bytes[i]) {
            i += 1;
        }
        if i == attr_name_start {
            // Not a recognizable attribute start; bail rather than loop
            // forever on malformed markup.
            i += 1;
            continue;
        }
        let attr_name = source[attr_name_start..i].to_string();

        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let quote = bytes[i];
                i += 1;
                let value_start = i;
                while i < bytes.len() && bytes[i] != quote {
                    i += 1;
                }
                let value = source[value_start..i].to_string();
                attributes.push((attr_name, value, value_start));
                if i < bytes.len() {
                    i += 1;
                }
            } else if i < bytes.len() && bytes[i] == b'{' {
                // Expression-valued attribute (`class={expr}`); the markup
                // dialect does not evaluate script expressions inline, so
                // only the literal-string form is recorded here.
                let value_start = i + 1;
                let mut depth = 1;
                i += 1;
                while i < bytes.len() && depth > 0 {
                    match bytes[i] {
                        b'{' => depth += 1,
                        b'}' => depth -= 1,
                        _ => {}
                    }
                    i += 1;
                }
                let _ = value_start;
            } else {
                let value_start = i;
                while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                let value = source[value_start..i].to_string();
                attributes.push((attr_name, value, value_start));
            }
        }
    }

    Some(TagOpen {
        name,
        attributes,
        end: i,
        self_closing,
    })
}

fn is_tag_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b':'
}

fn is_attr_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b':' || b == b'_'
}

/// Whether `tag_name` should be recorded as a detected element: excludes
/// framework meta-tags (their children are still traversed) and component
/// references (PascalCase, or containing a `.`).
fn is_element_tag(tag_name: &str) -> bool {
    if FRAMEWORK_META_PREFIXES
        .iter()
        .any(|p| tag_name.starts_with(p))
    {
        return false;
    }
    if tag_name.contains('.') {
        return false;
    }
    let Some(first) = tag_name.chars().next() else {
        return false;
    };
    !first.is_ascii_uppercase()
}

/// Find the `[start, end)` byte range of a named element's body (the text
/// between its opening tag's `>` and its matching `</name>`), returning
/// also the byte offset just past the closing tag.
fn find_closing(source: &str, body_start: usize, tag_name: &str) -> Option<(usize, usize, usize)> {
    let closing = format!("</{}>", tag_name);
    let rel = source[body_start..].find(&closing)?;
    let body_end = body_start + rel;
    let after = body_end + closing.len();
    Some((body_start, body_end, after))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_class_attribute_is_detected() {
        let result = extract("f.svelte", r#"<div class="btn primary"></div>"#, true);
        assert!(result.classes.contains_key("btn"));
        assert!(result.classes.contains_key("primary"));
    }

    #[test]
    fn element_tag_is_recorded() {
        let result = extract("f.svelte", "<div></div>", true);
        assert!(result.elements.contains("div"));
    }

    #[test]
    fn component_tag_is_not_recorded_as_element() {
        let result = extract("f.svelte", "<Button></Button>", true);
        assert!(!result.elements.contains("Button"));
    }

    #[test]
    fn framework_meta_tag_is_not_recorded_but_children_are_scanned() {
        let result = extract(
            "f.svelte",
            r#"<svelte:component this={x}><div class="inner"></div></svelte:component>"#,
            true,
        );
        assert!(!result.elements.contains("svelte:component"));
        assert!(result.classes.contains_key("inner"));
    }

    #[test]
    fn self_closing_tag_is_handled() {
        let result = extract("f.svelte", r#"<img class="thumb" />"#, true);
        assert!(result.classes.contains_key("thumb"));
    }

    #[test]
    fn embedded_script_is_delegated_to_script_dialect() {
        let src = "<div></div>\n<script>\n  const x = <div className=\"inner-btn\" />;\n</script>";
        let result = extract("f.svelte", src, true);
        assert!(result.classes.contains_key("inner-btn"));
    }

    #[test]
    fn annotation_comment_in_markup_is_scanned() {
        let src = "<!-- @fuz-classes extra -->\n<div></div>";
        let result = extract("f.svelte", src, true);
        assert!(result.classes.contains_key("extra"));
    }

    #[test]
    fn style_block_variable_reference_is_detected() {
        let src = "<div></div>\n<style>\n  .x { color: var(--accent); }\n</style>";
        let result = extract("f.svelte", src, true);
        assert!(result.css_variables.contains("accent"));
    }

    #[test]
    fn non_class_attribute_variable_reference_is_detected() {
        let result = extract(
            "f.svelte",
            r#"<div style="color: var(--brand-fg)"></div>"#,
            true,
        );
        assert!(result.css_variables.contains("brand-fg"));
    }
}
