//! Selector escaping and final CSS artifact assembly.

use std::collections::BTreeSet;

use crate::class_defs::{ClassDefinitionTable, CssClassDefinition};
use crate::resolver::ResolveResult;

/// Characters escaped in a CSS class selector built from a raw class name.
const ESCAPE_CHARS: &[char] = &[
    '!', '"', '#', '$', '%', '&', '\'', '(', ')', '*', '+', ',', '.', '/', ':', ';', '<', '=',
    '>', '?', '@', '[', '\\', ']', '^', '`', '{', '|', '}', '~',
];

/// Escape every character in `ESCAPE_CHARS` with a leading backslash, so
/// `class_name` is usable verbatim as a CSS selector (`.NAME { ... }`).
pub fn escape_selector(class_name: &str) -> String {
    let mut out = String::with_capacity(class_name.len());
    for c in class_name.chars() {
        if ESCAPE_CHARS.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Emit the CSS for one class definition. `composes` recurses into its
/// members depth-first (a composing class's own output never appears; only
/// its members' rules do), with each member's CSS emitted at most once
/// across the whole utility section.
fn emit_class(
    name: &str,
    definitions: &ClassDefinitionTable,
    emitted: &mut BTreeSet<String>,
    out: &mut Vec<String>,
) {
    if emitted.contains(name) {
        return;
    }
    let Some(def) = definitions.get(name) else {
        return;
    };
    match def {
        CssClassDefinition::Declaration { declaration } => {
            emitted.insert(name.to_string());
            let body = declaration
                .iter()
                .map(|(property, value)| format!("  {}: {};", property, value))
                .collect::<Vec<_>>()
                .join("\n");
            out.push(format!(".{} {{\n{}\n}}", escape_selector(name), body));
        }
        CssClassDefinition::Ruleset { ruleset } => {
            emitted.insert(name.to_string());
            out.push(ruleset.clone());
        }
        CssClassDefinition::Composes { composes } => {
            for member in composes {
                emit_class(member, definitions, emitted, out);
            }
        }
    }
}

/// Emit the utility-classes section: every resolved class, in sorted name
/// order for deterministic output, each member's CSS emitted exactly once.
pub fn emit_utility_css(classes: &BTreeSet<String>, definitions: &ClassDefinitionTable) -> String {
    let mut emitted = BTreeSet::new();
    let mut out = Vec::new();
    for name in classes {
        emit_class(name, definitions, &mut emitted, &mut out);
    }
    out.join("\n\n")
}

pub struct AssembleFlags {
    pub emit_theme: bool,
    pub emit_base: bool,
    pub emit_utilities: bool,
}

/// Assemble the three-section CSS artifact, omitting a section entirely
/// when it is empty or disabled by `flags`.
pub fn assemble(result: &ResolveResult, utility_css: &str, flags: &AssembleFlags) -> String {
    let mut sections = Vec::new();

    if flags.emit_theme && !result.theme_css.trim().is_empty() {
        sections.push(format!("/* Theme Variables */\n\n{}", result.theme_css));
    }
    if flags.emit_base && !result.base_css.trim().is_empty() {
        sections.push(format!("/* Base Styles */\n\n{}", result.base_css));
    }
    if flags.emit_utilities && !utility_css.trim().is_empty() {
        sections.push(format!("/* Utility Classes */\n\n{}", utility_css));
    }

    sections.join("\n\n")
}
