//! One-shot parser and inverted index over a base stylesheet.
//!
//! Deliberately much smaller than a full CSS AST: this only needs enough
//! structure to classify each top-level rule's selectors as
//! element/class/other and to scan its body for `var(--X)` references.

use std::collections::{BTreeMap, BTreeSet};

use crate::var_graph::extract_var_refs;

/// A single simple selector a rule can match on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Element(String),
    Class(String),
    Other,
}

/// One top-level rule from the base stylesheet.
#[derive(Debug, Clone)]
pub struct ParsedRule {
    pub text: String,
    pub selectors: Vec<SimpleSelector>,
    pub variables: BTreeSet<String>,
}

impl ParsedRule {
    fn elements(&self) -> impl Iterator<Item = &str> {
        self.selectors.iter().filter_map(|s| match s {
            SimpleSelector::Element(e) => Some(e.as_str()),
            _ => None,
        })
    }

    fn classes(&self) -> impl Iterator<Item = &str> {
        self.selectors.iter().filter_map(|s| match s {
            SimpleSelector::Class(c) => Some(c.as_str()),
            _ => None,
        })
    }

    fn is_core(&self) -> bool {
        !self
            .selectors
            .iter()
            .any(|s| matches!(s, SimpleSelector::Element(_) | SimpleSelector::Class(_)))
    }
}

/// Inverted index over a parsed base stylesheet.
pub struct StyleRuleIndex {
    pub rules: Vec<ParsedRule>,
    pub by_element: BTreeMap<String, Vec<usize>>,
    pub by_class: BTreeMap<String, Vec<usize>>,
    pub core_rule_indices: BTreeSet<usize>,
}

impl StyleRuleIndex {
    pub fn parse(css: &str) -> Self {
        let mut rules = Vec::new();
        for block in split_top_level_rules(css) {
            if let Some(rule) = parse_rule(&block) {
                rules.push(rule);
            }
        }

        let mut by_element: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut by_class: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut core_rule_indices = BTreeSet::new();

        for (i, rule) in rules.iter().enumerate() {
            if rule.is_core() {
                core_rule_indices.insert(i);
                continue;
            }
            for e in rule.elements() {
                by_element.entry(e.to_string()).or_default().push(i);
            }
            for c in rule.classes() {
                by_class.entry(c.to_string()).or_default().push(i);
            }
        }

        Self {
            rules,
            by_element,
            by_class,
            core_rule_indices,
        }
    }

    /// Union of core rules plus every rule matched by a detected element or
    /// class, ordered by original rule index.
    pub fn matching<'a>(
        &self,
        elements: impl IntoIterator<Item = &'a str>,
        classes: impl IntoIterator<Item = &'a str>,
    ) -> Vec<usize> {
        let mut indices: BTreeSet<usize> = self.core_rule_indices.clone();
        for e in elements {
            if let Some(idxs) = self.by_element.get(e) {
                indices.extend(idxs.iter().copied());
            }
        }
        for c in classes {
            if let Some(idxs) = self.by_class.get(c) {
                indices.extend(idxs.iter().copied());
            }
        }
        indices.into_iter().collect()
    }

    pub fn collect_rule_variables(&self, indices: &[usize]) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        for &i in indices {
            if let Some(rule) = self.rules.get(i) {
                out.extend(rule.variables.iter().cloned());
            }
        }
        out
    }

    pub fn generate_base_css(&self, indices: &[usize]) -> String {
        indices
            .iter()
            .filter_map(|&i| self.rules.get(i))
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Split a stylesheet into its top-level rule texts, respecting brace
/// nesting (so `@media { ... }` blocks stay intact as one rule).
fn split_top_level_rules(css: &str) -> Vec<String> {
    let mut rules = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let bytes = css.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        let text = css[start..=i].trim();
                        if !text.is_empty() {
                            rules.push(text.to_string());
                        }
                        start = i + 1;
                    }
                }
            }
            _ => {}
        }
    }
    rules
}

fn parse_rule(text: &str) -> Option<ParsedRule> {
    let brace = text.find('{')?;
    let selector_text = &text[..brace];
    let body = &text[brace..];
    let selectors = parse_selectors(selector_text);
    let variables = extract_var_refs(body);
    Some(ParsedRule {
        text: text.to_string(),
        selectors,
        variables,
    })
}

/// Split a selector list on commas and classify each compound selector's
/// leading simple selectors as element/class/other.
fn parse_selectors(selector_text: &str) -> Vec<SimpleSelector> {
    let mut out = Vec::new();
    for compound in selector_text.split(',') {
        let compound = compound.trim();
        if compound.is_empty() {
            continue;
        }
        out.extend(classify_compound(compound));
    }
    out
}

fn classify_compound(compound: &str) -> Vec<SimpleSelector> {
    let mut out = Vec::new();
    let mut chars = compound.char_indices().peekable();
    let mut saw_any = false;
    while let Some((i, c)) = chars.next() {
        if c == '.' {
            let start = i + 1;
            let end = take_ident(compound, start);
            if end > start {
                out.push(SimpleSelector::Class(compound[start..end].to_string()));
                saw_any = true;
            }
            advance_to(&mut chars, end);
        } else if c.is_ascii_alphabetic() {
            let end = take_ident(compound, i);
            let ident = &compound[i..end];
            // Only a bare leading tag name counts as an element selector;
            // anything combined with `#`, `[`, `:` etc. is "other" for our
            // matching purposes; only element/class hits matter here.
            if i == 0 {
                out.push(SimpleSelector::Element(ident.to_string()));
            } else {
                out.push(SimpleSelector::Other);
            }
            saw_any = true;
            advance_to(&mut chars, end);
        } else if c == '*' || c == '#' || c == '[' || c == ':' || c == '&' {
            out.push(SimpleSelector::Other);
            saw_any = true;
        }
    }
    if !saw_any {
        out.push(SimpleSelector::Other);
    }
    out
}

fn take_ident(s: &str, start: usize) -> usize {
    let mut end = start;
    for (i, c) in s[start..].char_indices() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            end = start + i + c.len_utf8();
        } else {
            break;
        }
    }
    end
}

fn advance_to(chars: &mut std::iter::Peekable<std::str::CharIndices>, end: usize) {
    while let Some(&(i, _)) = chars.peek() {
        if i < end {
            chars.next();
        } else {
            break;
        }
    }
}
