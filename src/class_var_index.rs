//! Maps each class definition to the theme variables its CSS text
//! references.

use std::collections::BTreeSet;

use crate::class_defs::{ClassDefinitionTable, CssClassDefinition};
use crate::var_graph::extract_var_refs;

/// `class name -> variables referenced by its own declaration/ruleset
/// text`. Deliberately does not trace through `composes`: a composing
/// class's variables come from resolving its composed members separately,
/// not by flattening here.
pub struct ClassVariableIndex {
    by_class: std::collections::BTreeMap<String, BTreeSet<String>>,
}

impl ClassVariableIndex {
    pub fn build(definitions: &ClassDefinitionTable) -> Self {
        let mut by_class = std::collections::BTreeMap::new();
        for (name, def) in definitions {
            let vars = match def {
                CssClassDefinition::Declaration { declaration } => {
                    let mut vars = BTreeSet::new();
                    for (_, value) in declaration {
                        vars.extend(extract_var_refs(value));
                    }
                    vars
                }
                CssClassDefinition::Ruleset { ruleset } => extract_var_refs(ruleset),
                CssClassDefinition::Composes { .. } => BTreeSet::new(),
            };
            by_class.insert(name.clone(), vars);
        }
        Self { by_class }
    }

    /// Union of variables referenced by `classes`' own definitions. Callers
    /// resolving `composes` chains are expected to call this with the full
    /// flattened set of class names (direct plus composed), since this
    /// index itself stays shallow per class.
    pub fn collect<'a>(&self, classes: impl IntoIterator<Item = &'a str>) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for class in classes {
            if let Some(vars) = self.by_class.get(class) {
                out.extend(vars.iter().cloned());
            }
        }
        out
    }
}
