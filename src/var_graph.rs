//! Variable dependency graph, transitive resolution, and theme emission.
//!
//! Uses explicit visited-set recursion with cycle short-circuiting, the
//! same shape as tracing identifier aliases through an expression graph,
//! adapted here to trace `var(--X)` references inside a CSS value.

use std::collections::{BTreeMap, BTreeSet};

use crate::cache::djb2_hex;
use crate::diagnostics::{Diagnostic, Level};

/// One theme variable as declared by configuration or a `<style>` block.
#[derive(Debug, Clone)]
pub struct StyleVariable {
    pub name: String,
    pub light_value: Option<String>,
    pub dark_value: Option<String>,
}

#[derive(Debug, Clone)]
struct Node {
    light_value: Option<String>,
    dark_value: Option<String>,
    light_deps: BTreeSet<String>,
    dark_deps: BTreeSet<String>,
}

/// A graph of variables keyed by name, plus a content hash over the raw
/// inputs, for cache invalidation.
pub struct VariableDependencyGraph {
    nodes: BTreeMap<String, Node>,
    pub content_hash: String,
}

/// Find every `var(--NAME` occurrence in `text` and return the referenced
/// names (without the `--` prefix). Shared by the variable graph (value
/// dependency scanning), the style-rule index (rule-body scanning) and the
/// class/variable index (declaration/ruleset scanning), so one scanner
/// backs all three.
pub fn extract_var_refs(text: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    let bytes = text.as_bytes();
    let mut i = 0;
    while let Some(rel) = text[i..].find("var(--") {
        let start = i + rel + "var(--".len();
        let mut end = start;
        while end < bytes.len() {
            let b = bytes[end];
            if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
                end += 1;
            } else {
                break;
            }
        }
        if end > start {
            out.insert(text[start..end].to_string());
        }
        i = end.max(start + 1);
        if i >= text.len() {
            break;
        }
    }
    out
}

impl VariableDependencyGraph {
    pub fn build(variables: &[StyleVariable]) -> Self {
        let mut raw = String::new();
        for v in variables {
            raw.push_str(&v.name);
            raw.push('=');
            raw.push_str(v.light_value.as_deref().unwrap_or(""));
            raw.push('|');
            raw.push_str(v.dark_value.as_deref().unwrap_or(""));
            raw.push(';');
        }
        let content_hash = djb2_hex(&raw);

        let mut nodes = BTreeMap::new();
        for v in variables {
            let light_deps = v
                .light_value
                .as_deref()
                .map(extract_var_refs)
                .unwrap_or_default();
            let dark_deps = v
                .dark_value
                .as_deref()
                .map(extract_var_refs)
                .unwrap_or_default();
            nodes.insert(
                v.name.clone(),
                Node {
                    light_value: v.light_value.clone(),
                    dark_value: v.dark_value.clone(),
                    light_deps,
                    dark_deps,
                },
            );
        }
        Self { nodes, content_hash }
    }

    /// Transitive closure of `initial_names`, plus one warning per cycle
    /// representative and the set of names referenced but never defined.
    /// Dependencies are emitted before the variable that depends on them;
    /// a variable's path is removed from the in-progress set when its DFS
    /// frame returns (so diamond dependencies are visited once, not
    /// flagged as cycles).
    pub fn resolve_transitive(&self, initial_names: &BTreeSet<String>) -> Resolved {
        let mut resolved = Vec::new();
        let mut resolved_set = BTreeSet::new();
        let mut warnings = Vec::new();
        let mut missing = BTreeSet::new();
        let mut in_path: BTreeSet<String> = BTreeSet::new();
        let mut cycle_reported: BTreeSet<String> = BTreeSet::new();

        for name in initial_names {
            self.visit(
                name,
                &mut resolved,
                &mut resolved_set,
                &mut warnings,
                &mut missing,
                &mut in_path,
                &mut cycle_reported,
            );
        }

        Resolved {
            variables: resolved,
            warnings,
            missing,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn visit(
        &self,
        name: &str,
        resolved: &mut Vec<String>,
        resolved_set: &mut BTreeSet<String>,
        warnings: &mut Vec<Diagnostic>,
        missing: &mut BTreeSet<String>,
        in_path: &mut BTreeSet<String>,
        cycle_reported: &mut BTreeSet<String>,
    ) {
        if resolved_set.contains(name) {
            return;
        }
        let Some(node) = self.nodes.get(name) else {
            missing.insert(name.to_string());
            return;
        };
        if in_path.contains(name) {
            // Cycle: report once per representative (the first name at
            // which the cycle is detected), not once per member.
            if cycle_reported.insert(name.to_string()) {
                warnings.push(Diagnostic::generation(
                    Level::Warning,
                    format!("cyclic variable dependency detected at --{}", name),
                    name,
                    None,
                ));
            }
            return;
        }

        in_path.insert(name.to_string());
        for dep in node.light_deps.iter().chain(node.dark_deps.iter()) {
            self.visit(
                dep,
                resolved,
                resolved_set,
                warnings,
                missing,
                in_path,
                cycle_reported,
            );
        }
        in_path.remove(name);

        if resolved_set.insert(name.to_string()) {
            resolved.push(name.to_string());
        }
    }

    pub fn emit_theme(&self, resolved: &[String], specificity: usize) -> ThemeCss {
        let mut sorted: Vec<&String> = resolved.iter().collect();
        sorted.sort();

        let mut light_decls = Vec::new();
        let mut dark_decls = Vec::new();
        for name in &sorted {
            if let Some(node) = self.nodes.get(name.as_str()) {
                if let Some(v) = &node.light_value {
                    light_decls.push(format!("  --{}: {};", name, v));
                }
                if let Some(v) = &node.dark_value {
                    dark_decls.push(format!("  --{}: {};", name, v));
                }
            }
        }

        let specificity = specificity.max(1);
        let light_css = if light_decls.is_empty() {
            None
        } else {
            let selector = vec![":root"; specificity].join(", ");
            Some(format!("{} {{\n{}\n}}", selector, light_decls.join("\n")))
        };
        let dark_css = if dark_decls.is_empty() {
            None
        } else {
            let selector = vec![":root.dark"; specificity].join(", ");
            Some(format!("{} {{\n{}\n}}", selector, dark_decls.join("\n")))
        };

        ThemeCss { light_css, dark_css }
    }

    /// Levenshtein-nearest defined variable name to `name`, for "did you
    /// mean" suggestions on missing-variable diagnostics. Only returns a
    /// suggestion when the best match is at least 85% similar.
    pub fn find_similar(&self, name: &str) -> Option<String> {
        let mut best: Option<(String, f64)> = None;
        for candidate in self.nodes.keys() {
            let distance = levenshtein(name, candidate);
            let max_len = name.len().max(candidate.len()).max(1);
            let similarity = 1.0 - (distance as f64 / max_len as f64);
            if similarity >= 0.85 {
                match &best {
                    Some((_, best_sim)) if *best_sim >= similarity => {}
                    _ => best = Some((candidate.clone(), similarity)),
                }
            }
        }
        best.map(|(name, _)| name)
    }
}

pub struct Resolved {
    pub variables: Vec<String>,
    pub warnings: Vec<Diagnostic>,
    pub missing: BTreeSet<String>,
}

pub struct ThemeCss {
    pub light_css: Option<String>,
    pub dark_css: Option<String>,
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];
    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, light: Option<&str>, dark: Option<&str>) -> StyleVariable {
        StyleVariable {
            name: name.to_string(),
            light_value: light.map(str::to_string),
            dark_value: dark.map(str::to_string),
        }
    }

    #[test]
    fn extract_var_refs_finds_all_occurrences() {
        let refs = extract_var_refs("calc(var(--space-md) + var(--space-sm))");
        assert!(refs.contains("space-md"));
        assert!(refs.contains("space-sm"));
        assert_eq!(refs.len(), 2);
    }

    #[test]
    fn resolve_transitive_includes_transitive_deps_before_parent() {
        let graph = VariableDependencyGraph::build(&[
            var("bg", Some("var(--surface)"), None),
            var("surface", Some("white"), None),
        ]);
        let mut initial = BTreeSet::new();
        initial.insert("bg".to_string());
        let resolved = graph.resolve_transitive(&initial);
        assert_eq!(resolved.variables, vec!["surface", "bg"]);
        assert!(resolved.warnings.is_empty());
        assert!(resolved.missing.is_empty());
    }

    #[test]
    fn resolve_transitive_reports_missing_variable() {
        let graph = VariableDependencyGraph::build(&[var("bg", Some("var(--surface)"), None)]);
        let mut initial = BTreeSet::new();
        initial.insert("bg".to_string());
        let resolved = graph.resolve_transitive(&initial);
        assert!(resolved.missing.contains("surface"));
    }

    #[test]
    fn resolve_transitive_detects_cycle_with_single_warning() {
        let graph = VariableDependencyGraph::build(&[
            var("a", Some("var(--b)"), None),
            var("b", Some("var(--a)"), None),
        ]);
        let mut initial = BTreeSet::new();
        initial.insert("a".to_string());
        let resolved = graph.resolve_transitive(&initial);
        assert_eq!(resolved.warnings.len(), 1);
    }

    #[test]
    fn resolve_transitive_visits_diamond_dependency_once() {
        let graph = VariableDependencyGraph::build(&[
            var("a", Some("var(--b) var(--c)"), None),
            var("b", Some("var(--d)"), None),
            var("c", Some("var(--d)"), None),
            var("d", Some("1px"), None),
        ]);
        let mut initial = BTreeSet::new();
        initial.insert("a".to_string());
        let resolved = graph.resolve_transitive(&initial);
        assert!(resolved.warnings.is_empty());
        assert_eq!(resolved.variables.iter().filter(|n| *n == "d").count(), 1);
    }

    #[test]
    fn emit_theme_repeats_root_selector_by_specificity() {
        let graph = VariableDependencyGraph::build(&[var("bg", Some("white"), Some("black"))]);
        let theme = graph.emit_theme(&["bg".to_string()], 2);
        assert_eq!(theme.light_css.unwrap(), ":root, :root {\n  --bg: white;\n}");
        assert_eq!(
            theme.dark_css.unwrap(),
            ":root.dark, :root.dark {\n  --bg: black;\n}"
        );
    }

    #[test]
    fn emit_theme_omits_empty_side() {
        let graph = VariableDependencyGraph::build(&[var("bg", Some("white"), None)]);
        let theme = graph.emit_theme(&["bg".to_string()], 1);
        assert!(theme.light_css.is_some());
        assert!(theme.dark_css.is_none());
    }

    #[test]
    fn find_similar_suggests_close_match() {
        let graph = VariableDependencyGraph::build(&[var("text-color", Some("black"), None)]);
        assert_eq!(
            graph.find_similar("text-colour"),
            Some("text-color".to_string())
        );
    }

    #[test]
    fn find_similar_returns_none_below_threshold() {
        let graph = VariableDependencyGraph::build(&[var("text-color", Some("black"), None)]);
        assert_eq!(graph.find_similar("completely-unrelated-name"), None);
    }
}
