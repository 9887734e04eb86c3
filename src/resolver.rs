//! Combines every index into the minimal theme, base and utility CSS for
//! one build: gather inputs, run them through each stage in a fixed
//! order, and return one aggregate result plus diagnostics rather than
//! failing fast on the first problem.

use std::collections::{BTreeMap, BTreeSet};

use crate::class_defs::{
    ClassDefinitionTable, ClassInterpreter, CssClassDefinition, InterpretResult, interpret_chain,
};
use crate::class_var_index::ClassVariableIndex;
use crate::diagnostics::{Diagnostic, Level, SourceLocation};
use crate::style_index::StyleRuleIndex;
use crate::var_graph::{StyleVariable, VariableDependencyGraph};

/// Classes, elements, and CSS variable references observed across every
/// extracted source file, already aggregated in source-path-ascending
/// order.
#[derive(Debug, Clone, Default)]
pub struct DetectedUsage {
    pub classes: BTreeMap<String, Vec<SourceLocation>>,
    pub elements: BTreeSet<String>,
    /// `var(--NAME)` references found in `<style>` blocks and CSS-like
    /// string literals, independent of any class or rule match.
    pub css_variables: BTreeSet<String>,
    /// Identifiers recorded as class-name aliases (bound to another
    /// identifier rather than a literal) — informational only, never
    /// resolved to classes.
    pub tracked_vars: BTreeSet<String>,
}

/// The subset of `GeneratorOptions` the resolver consumes directly, kept
/// decoupled from the config module's serde shape so this module has no
/// dependency on how options are authored.
pub struct ResolveOptions<'a> {
    pub additional_classes: &'a [String],
    pub exclude_classes: &'a BTreeSet<String>,
    pub additional_elements: &'a [String],
    pub additional_variables: &'a BTreeSet<String>,
    pub include_all_variables: bool,
    pub treeshake_base_css: bool,
    pub treeshake_variables: bool,
    pub theme_specificity: usize,
}

pub struct ResolveResult {
    pub theme_css: String,
    pub base_css: String,
    pub resolved_variables: Vec<String>,
    pub included_rule_indices: Vec<usize>,
    pub included_elements: BTreeSet<String>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: Stats,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Stats {
    pub classes_detected: usize,
    pub classes_resolved: usize,
    pub variables_resolved: usize,
}

/// Run the full resolution algorithm:
///
/// 1. Start from detected classes/elements, add `additional_classes` and
///    `additional_elements`, remove `exclude_classes`.
/// 2. Classify every surviving class name: a configured definition wins
///    over interpretation; an unrecognized name runs the interpreter
///    chain, which may expand it, emit a diagnostic, or both decline (an
///    unknown-class warning).
/// 3. Flatten `composes` chains, detecting cycles as an error diagnostic
///    (a composing class that cycles back to itself contributes nothing).
/// 4. Match base stylesheet rules against detected elements and the fully
///    flattened class set (or every rule, when base CSS tree-shaking is
///    disabled).
/// 5. Collect variables referenced by matched rules and by every flattened
///    class's own definition, plus `additional_variables` (or every
///    defined variable, when variable tree-shaking is disabled, or when
///    `include_all_variables` is set).
/// 6. Resolve the transitive closure of that variable set, recording
///    missing-variable and cycle diagnostics.
/// 7. Emit the theme, base and utility CSS.
/// 8. Return everything plus the accumulated diagnostics.
#[allow(clippy::too_many_arguments)]
pub fn resolve(
    detected: &DetectedUsage,
    class_definitions: &ClassDefinitionTable,
    interpreters: &[Box<dyn ClassInterpreter>],
    style_index: &StyleRuleIndex,
    variables: &[StyleVariable],
    options: &ResolveOptions,
) -> ResolveResult {
    let mut diagnostics = Vec::new();

    // Step 1: assemble the working class and element sets.
    let mut class_names: BTreeSet<String> = detected.classes.keys().cloned().collect();
    class_names.extend(options.additional_classes.iter().cloned());
    for excluded in options.exclude_classes {
        class_names.remove(excluded);
    }
    let mut elements = detected.elements.clone();
    elements.extend(options.additional_elements.iter().cloned());

    let classes_detected = class_names.len();

    // Step 2: classify every class name into a resolved definition.
    let mut resolved_defs: BTreeMap<String, CssClassDefinition> = BTreeMap::new();
    for name in &class_names {
        if let Some(def) = class_definitions.get(name) {
            resolved_defs.insert(name.clone(), def.clone());
            continue;
        }
        match interpret_chain(name, interpreters) {
            InterpretResult::Expanded(def) => {
                resolved_defs.insert(name.clone(), def);
            }
            InterpretResult::Diagnostic(d) => diagnostics.push(d),
            InterpretResult::None => {
                diagnostics.push(Diagnostic::generation(
                    Level::Warning,
                    format!("unrecognized class: {}", name),
                    name.clone(),
                    detected.classes.get(name).cloned(),
                ));
            }
        }
    }

    // Step 3: flatten composes chains, with cycle detection. Composes
    // members are looked up against the full class-definition table, not
    // just `resolved_defs` — a member reached only transitively through a
    // composes chain was never itself detected or classified in step 2, so
    // `resolved_defs` alone would treat it as an opaque leaf instead of its
    // real definition.
    let mut flattened: BTreeSet<String> = BTreeSet::new();
    let mut member_defs: BTreeMap<String, CssClassDefinition> = BTreeMap::new();
    for name in resolved_defs.keys().cloned().collect::<Vec<_>>() {
        flatten_composes(
            &name,
            &resolved_defs,
            class_definitions,
            &mut flattened,
            &mut member_defs,
            &mut Vec::new(),
            &mut diagnostics,
        );
    }

    // Step 4: match base stylesheet rules.
    let included_rule_indices = if options.treeshake_base_css {
        style_index.matching(
            elements.iter().map(String::as_str),
            flattened.iter().map(String::as_str),
        )
    } else {
        (0..style_index.rules.len()).collect()
    };

    // Step 5: collect the variable set to resolve. `class_var_index` is
    // built from `member_defs`, which carries the real definition of every
    // name in `flattened` (including composes members never classified in
    // step 2), so a member's own `var(--X)` references are never dropped.
    let class_var_index = ClassVariableIndex::build(&member_defs);
    let graph = VariableDependencyGraph::build(variables);

    let mut needed_variables: BTreeSet<String> = if options.include_all_variables {
        variables.iter().map(|v| v.name.clone()).collect()
    } else {
        let mut needed = style_index.collect_rule_variables(&included_rule_indices);
        needed.extend(class_var_index.collect(flattened.iter().map(String::as_str)));
        needed.extend(detected.css_variables.iter().cloned());
        needed
    };
    needed_variables.extend(options.additional_variables.iter().cloned());
    if !options.treeshake_variables {
        needed_variables.extend(variables.iter().map(|v| v.name.clone()));
    }

    // Step 6: resolve the transitive closure.
    let resolved = graph.resolve_transitive(&needed_variables);
    diagnostics.extend(resolved.warnings);
    for missing in &resolved.missing {
        let suggestion = graph.find_similar(missing);
        let mut d = Diagnostic::generation(
            Level::Warning,
            format!("undefined variable: --{}", missing),
            missing.clone(),
            None,
        );
        if let Some(suggestion) = suggestion {
            d = d.with_suggestion(format!("did you mean --{}?", suggestion));
        }
        diagnostics.push(d);
    }

    // Step 7: emit theme, base and utility CSS.
    let theme = graph.emit_theme(&resolved.variables, options.theme_specificity);
    let theme_css = [theme.light_css, theme.dark_css]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n\n");

    let base_css = style_index.generate_base_css(&included_rule_indices);

    let stats = Stats {
        classes_detected,
        classes_resolved: resolved_defs.len(),
        variables_resolved: resolved.variables.len(),
    };

    ResolveResult {
        theme_css,
        base_css,
        resolved_variables: resolved.variables,
        included_rule_indices,
        included_elements: elements,
        diagnostics,
        stats,
    }
}

/// Depth-first flatten of a `composes` chain into `out`. A class already on
/// `path` closes a cycle: a diagnostic is emitted once per cycle and the
/// composing class simply contributes nothing further.
///
/// `resolved_defs` holds the names already classified in step 2 (detected,
/// additional, or interpreted); `class_definitions` is the full table, used
/// to look up composes members that were never themselves classified.
/// Every non-composes definition reached along the way is recorded into
/// `member_defs`, so later steps can see a member's own declaration/ruleset
/// text even when the member was only reached transitively.
fn flatten_composes(
    name: &str,
    resolved_defs: &BTreeMap<String, CssClassDefinition>,
    class_definitions: &ClassDefinitionTable,
    out: &mut BTreeSet<String>,
    member_defs: &mut BTreeMap<String, CssClassDefinition>,
    path: &mut Vec<String>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    if path.iter().any(|p| p == name) {
        diagnostics.push(Diagnostic::generation(
            Level::Error,
            format!("cyclic composes chain detected at class: {}", name),
            name,
            None,
        ));
        return;
    }
    let Some(def) = resolved_defs.get(name).or_else(|| class_definitions.get(name)) else {
        out.insert(name.to_string());
        return;
    };
    match def {
        CssClassDefinition::Composes { composes } => {
            path.push(name.to_string());
            for member in composes {
                flatten_composes(
                    member,
                    resolved_defs,
                    class_definitions,
                    out,
                    member_defs,
                    path,
                    diagnostics,
                );
            }
            path.pop();
        }
        other => {
            out.insert(name.to_string());
            member_defs.insert(name.to_string(), other.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class_defs::default_chain;

    fn opts() -> ResolveOptions<'static> {
        ResolveOptions {
            additional_classes: &[],
            exclude_classes: Box::leak(Box::new(BTreeSet::new())),
            additional_elements: &[],
            additional_variables: Box::leak(Box::new(BTreeSet::new())),
            include_all_variables: false,
            treeshake_base_css: true,
            treeshake_variables: true,
            theme_specificity: 1,
        }
    }

    #[test]
    fn unknown_css_literal_class_resolves_via_default_interpreter() {
        let mut detected = DetectedUsage::default();
        detected.classes.insert("display:flex".to_string(), vec![]);
        let style_index = StyleRuleIndex::parse("");
        let result = resolve(
            &detected,
            &ClassDefinitionTable::new(),
            &default_chain(),
            &style_index,
            &[],
            &opts(),
        );
        assert_eq!(result.stats.classes_resolved, 1);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn unrecognized_class_produces_warning() {
        let mut detected = DetectedUsage::default();
        detected.classes.insert("container".to_string(), vec![]);
        let style_index = StyleRuleIndex::parse("");
        let result = resolve(
            &detected,
            &ClassDefinitionTable::new(),
            &default_chain(),
            &style_index,
            &[],
            &opts(),
        );
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].level(), Level::Warning);
    }

    #[test]
    fn composes_cycle_reports_error_and_contributes_nothing() {
        let mut defs = ClassDefinitionTable::new();
        defs.insert(
            "a".to_string(),
            CssClassDefinition::Composes {
                composes: vec!["b".to_string()],
            },
        );
        defs.insert(
            "b".to_string(),
            CssClassDefinition::Composes {
                composes: vec!["a".to_string()],
            },
        );
        let mut detected = DetectedUsage::default();
        detected.classes.insert("a".to_string(), vec![]);
        let style_index = StyleRuleIndex::parse("");
        let result = resolve(
            &detected,
            &defs,
            &default_chain(),
            &style_index,
            &[],
            &opts(),
        );
        assert!(
            result
                .diagnostics
                .iter()
                .any(|d| d.level() == Level::Error)
        );
    }

    #[test]
    fn exclude_classes_removes_detected_class() {
        let mut detected = DetectedUsage::default();
        detected.classes.insert("display:flex".to_string(), vec![]);
        let mut exclude = BTreeSet::new();
        exclude.insert("display:flex".to_string());
        let options = ResolveOptions {
            exclude_classes: &exclude,
            ..opts()
        };
        let style_index = StyleRuleIndex::parse("");
        let result = resolve(
            &detected,
            &ClassDefinitionTable::new(),
            &default_chain(),
            &style_index,
            &[],
            &options,
        );
        assert_eq!(result.stats.classes_resolved, 0);
    }

    #[test]
    fn matched_rule_variables_are_resolved_into_theme() {
        let mut detected = DetectedUsage::default();
        detected.classes.insert("btn".to_string(), vec![]);
        let mut defs = ClassDefinitionTable::new();
        defs.insert(
            "btn".to_string(),
            CssClassDefinition::Ruleset {
                ruleset: ".btn { color: var(--text-color); }".to_string(),
            },
        );
        let style_index = StyleRuleIndex::parse("");
        let variables = vec![StyleVariable {
            name: "text-color".to_string(),
            light_value: Some("black".to_string()),
            dark_value: Some("white".to_string()),
        }];
        let result = resolve(
            &detected,
            &defs,
            &default_chain(),
            &style_index,
            &variables,
            &opts(),
        );
        assert!(result.theme_css.contains("--text-color: black"));
        assert!(result.theme_css.contains("--text-color: white"));
    }

    #[test]
    fn composes_member_variable_is_pulled_into_theme_even_when_never_detected() {
        let mut defs = ClassDefinitionTable::new();
        defs.insert(
            "btn".to_string(),
            CssClassDefinition::Composes {
                composes: vec!["btn-base".to_string()],
            },
        );
        defs.insert(
            "btn-base".to_string(),
            CssClassDefinition::Ruleset {
                ruleset: ".btn-base { color: var(--accent); }".to_string(),
            },
        );
        let mut detected = DetectedUsage::default();
        detected.classes.insert("btn".to_string(), vec![]);
        let style_index = StyleRuleIndex::parse("");
        let variables = vec![StyleVariable {
            name: "accent".to_string(),
            light_value: Some("blue".to_string()),
            dark_value: None,
        }];
        let result = resolve(
            &detected,
            &defs,
            &default_chain(),
            &style_index,
            &variables,
            &opts(),
        );
        assert!(result.theme_css.contains("--accent: blue"));
    }

    #[test]
    fn disabling_base_treeshake_includes_every_rule() {
        let detected = DetectedUsage::default();
        let style_index = StyleRuleIndex::parse(".unused { color: red; }");
        let options = ResolveOptions {
            treeshake_base_css: false,
            ..opts()
        };
        let result = resolve(
            &detected,
            &ClassDefinitionTable::new(),
            &default_chain(),
            &style_index,
            &[],
            &options,
        );
        assert_eq!(result.included_rule_indices, vec![0]);
    }
}
