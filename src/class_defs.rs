//! Class-definition table and interpreter chain.
//!
//! `CssClassDefinition` is a plain, serde-friendly config struct family,
//! using `#[serde(untagged)]` so a class definition can be authored as
//! exactly one of three shapes without a separate tag field.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::diagnostics::{Diagnostic, Level};

/// A single class's definition: exactly one of three shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CssClassDefinition {
    /// Flat `property: value;` pairs, wrapped as `.NAME { ... }` at emission.
    Declaration { declaration: Vec<(String, String)> },
    /// A verbatim CSS block, already containing selectors.
    Ruleset { ruleset: String },
    /// Inlines other class definitions by name.
    Composes { composes: Vec<String> },
}

pub type ClassDefinitionTable = BTreeMap<String, CssClassDefinition>;

/// An interpreter examines an unknown class name and may expand it, emit a
/// diagnostic, or decline (return `None`) so the next interpreter in the
/// chain gets a turn.
pub trait ClassInterpreter: Send + Sync {
    fn interpret(&self, class_name: &str) -> InterpretResult;
}

pub enum InterpretResult {
    Expanded(CssClassDefinition),
    Diagnostic(Diagnostic),
    None,
}

/// Known CSS property names the default interpreter accepts. A small,
/// representative set — illustrative rather than exhaustive; embedders
/// needing a wider vocabulary supply their own `ClassInterpreter`.
fn known_properties() -> &'static [&'static str] {
    &[
        "display", "position", "top", "right", "bottom", "left", "width", "height",
        "margin", "margin-top", "margin-right", "margin-bottom", "margin-left",
        "padding", "padding-top", "padding-right", "padding-bottom", "padding-left",
        "color", "background", "background-color", "border", "border-color",
        "border-radius", "font-size", "font-weight", "line-height", "opacity",
        "flex", "flex-direction", "align-items", "justify-content", "gap",
        "grid-template-columns", "overflow", "text-align", "cursor", "z-index",
        "transform", "transition", "box-shadow", "outline", "visibility",
    ]
}

/// The default interpreter: accepts CSS-literal class names with the
/// grammar `MODIFIER* PROPERTY ":" VALUE`, where `MODIFIER` is an
/// identifier followed by `:` (e.g. `hover:`, `md:`, `nth-child(2n):`),
/// `PROPERTY` is a known CSS property name, and `VALUE` is any token
/// sequence where `~` encodes spaces.
pub struct CssLiteralInterpreter;

impl ClassInterpreter for CssLiteralInterpreter {
    fn interpret(&self, class_name: &str) -> InterpretResult {
        // MODIFIER* PROPERTY ":" VALUE, colon-delimited: every segment but
        // the last two is a modifier, the second-to-last is PROPERTY, the
        // last is VALUE (which itself never contains ":").
        let parts: Vec<&str> = class_name.split(':').collect();
        if parts.len() < 2 {
            return InterpretResult::None;
        }
        let value_encoded = parts[parts.len() - 1];
        let property = parts[parts.len() - 2];
        if value_encoded.is_empty() || property.is_empty() {
            return InterpretResult::None;
        }

        if !known_properties().contains(&property) {
            return InterpretResult::Diagnostic(
                Diagnostic::generation(
                    Level::Warning,
                    format!("unknown property: {}", property),
                    class_name,
                    None,
                )
                .with_suggestion("check spelling or register a custom class interpreter"),
            );
        }

        let value = value_encoded.replace('~', " ");
        InterpretResult::Expanded(CssClassDefinition::Declaration {
            declaration: vec![(property.to_string(), value)],
        })
    }
}

/// Run the full interpreter chain over one unknown class name, in order,
/// stopping at the first interpreter that doesn't decline.
pub fn interpret_chain(class_name: &str, chain: &[Box<dyn ClassInterpreter>]) -> InterpretResult {
    for interpreter in chain {
        match interpreter.interpret(class_name) {
            InterpretResult::None => continue,
            other => return other,
        }
    }
    InterpretResult::None
}

pub fn default_chain() -> Vec<Box<dyn ClassInterpreter>> {
    vec![Box::new(CssLiteralInterpreter)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_property_value_expands_to_declaration() {
        let result = CssLiteralInterpreter.interpret("display:flex");
        match result {
            InterpretResult::Expanded(CssClassDefinition::Declaration { declaration }) => {
                assert_eq!(declaration, vec![("display".to_string(), "flex".to_string())]);
            }
            _ => panic!("expected declaration"),
        }
    }

    #[test]
    fn tilde_encodes_spaces_in_value() {
        let result = CssLiteralInterpreter.interpret("transform:translate(1px,~2px)");
        match result {
            InterpretResult::Expanded(CssClassDefinition::Declaration { declaration }) => {
                assert_eq!(declaration[0].1, "translate(1px, 2px)");
            }
            _ => panic!("expected declaration"),
        }
    }

    #[test]
    fn modifier_prefixed_class_expands() {
        let result = CssLiteralInterpreter.interpret("hover:opacity:80%");
        match result {
            InterpretResult::Expanded(CssClassDefinition::Declaration { declaration }) => {
                assert_eq!(declaration, vec![("opacity".to_string(), "80%".to_string())]);
            }
            _ => panic!("expected declaration, got something else"),
        }
    }

    #[test]
    fn unknown_property_yields_warning_diagnostic() {
        let result = CssLiteralInterpreter.interpret("totallymadeup:value");
        match result {
            InterpretResult::Diagnostic(d) => {
                assert_eq!(d.level(), Level::Warning);
            }
            _ => panic!("expected diagnostic"),
        }
    }

    #[test]
    fn non_css_literal_class_yields_none() {
        let result = CssLiteralInterpreter.interpret("container");
        assert!(matches!(result, InterpretResult::None));
    }

    #[test]
    fn serde_untagged_round_trips_each_shape() {
        let decl = CssClassDefinition::Declaration {
            declaration: vec![("color".into(), "red".into())],
        };
        let json = serde_json::to_string(&decl).unwrap();
        let back: CssClassDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(decl, back);

        let composes = CssClassDefinition::Composes {
            composes: vec!["a".into(), "b".into()],
        };
        let json = serde_json::to_string(&composes).unwrap();
        let back: CssClassDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(composes, back);
    }
}
