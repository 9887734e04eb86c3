//! Shared extraction result type and identifier-naming-convention helpers
//! used by both dialects.

use std::collections::BTreeSet;

use crate::diagnostics::{Diagnostic, SourceLocation};

/// Everything one file's extraction contributes: detected classes (each
/// with every location it was found at), detected elements (markup
/// dialect only), CSS variable references found in style blocks and
/// CSS-like string literals, identifiers tracked as class-name aliases,
/// and any diagnostics raised while extracting.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    pub classes: std::collections::BTreeMap<String, Vec<SourceLocation>>,
    pub elements: BTreeSet<String>,
    pub css_variables: BTreeSet<String>,
    pub tracked_vars: BTreeSet<String>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ExtractionResult {
    pub fn add_class(&mut self, name: impl Into<String>, location: SourceLocation) {
        self.classes.entry(name.into()).or_default().push(location);
    }

    pub fn merge(&mut self, other: ExtractionResult) {
        for (class, locations) in other.classes {
            self.classes.entry(class).or_default().extend(locations);
        }
        self.elements.extend(other.elements);
        self.css_variables.extend(other.css_variables);
        self.tracked_vars.extend(other.tracked_vars);
        self.diagnostics.extend(other.diagnostics);
    }

    /// Shift every location produced for an embedded sub-source (a
    /// `<script>` or `<style>` body inside a markup file) so it points at
    /// the right place in the containing file. `start_line`/`start_column`
    /// are the containing file's position of the embedded body's first
    /// byte.
    pub fn remap(&mut self, start_line: usize, start_column: usize) {
        for locations in self.classes.values_mut() {
            for loc in locations.iter_mut() {
                remap_location(loc, start_line, start_column);
            }
        }
    }
}

fn remap_location(loc: &mut SourceLocation, start_line: usize, start_column: usize) {
    if loc.line == 1 {
        loc.column = loc.column + start_column - 1;
    }
    loc.line = loc.line + start_line - 1;
}

/// Normalize an identifier for the "ends in classes/classNames/..." naming
/// convention check: lowercase, strip underscores.
pub fn normalize_identifier(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(|c| c.to_lowercase())
        .collect()
}

const CLASS_IDENTIFIER_SUFFIXES: &[&str] =
    &["classes", "classname", "classnames", "classlist", "classlists"];

/// Whether `name` looks like a variable intended to hold class names:
/// lowercase and strip underscores, then check for one of the recognized
/// suffixes.
pub fn looks_like_class_identifier(name: &str) -> bool {
    let normalized = normalize_identifier(name);
    CLASS_IDENTIFIER_SUFFIXES
        .iter()
        .any(|suffix| normalized.ends_with(suffix))
}
