//! Caller-facing configuration.
//!
//! `GeneratorOptions` is constructed directly in Rust by the embedding
//! build tool, not deserialized from a config file — there's no CLI surface
//! here to load one from. It's a plain builder struct with a real `Default`
//! impl.

use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::class_defs::{ClassDefinitionTable, ClassInterpreter, default_chain};
use crate::diagnostics::DiagnosticPolicy;
use crate::var_graph::StyleVariable;

/// An option that can be left at its default, explicitly disabled, wholly
/// replaced, or derived from the default via a transform function. Used for
/// `base_css` and `variables`.
pub enum Override<T> {
    Default,
    Disabled,
    Replace(T),
    Transform(Box<dyn Fn(T) -> T + Send + Sync>),
}

impl<T> Default for Override<T> {
    fn default() -> Self {
        Override::Default
    }
}

impl<T: Clone> Override<T> {
    /// Apply this override to `default_value`. `Disabled` yields `None`;
    /// every other form yields `Some`. Takes `&self` (rather than
    /// consuming it) so a caller holding only `&GeneratorOptions` can
    /// still resolve it.
    pub fn resolve_ref(&self, default_value: &T) -> Option<T> {
        match self {
            Override::Default => Some(default_value.clone()),
            Override::Disabled => None,
            Override::Replace(value) => Some(value.clone()),
            Override::Transform(f) => Some(f(default_value.clone())),
        }
    }
}

pub struct GeneratorOptions {
    pub class_definitions: ClassDefinitionTable,
    pub class_interpreters: Vec<Box<dyn ClassInterpreter>>,
    pub additional_classes: Vec<String>,
    pub exclude_classes: BTreeSet<String>,
    pub base_css: Override<String>,
    pub variables: Override<Vec<StyleVariable>>,
    pub treeshake_base_css: bool,
    pub treeshake_variables: bool,
    pub theme_specificity: usize,
    pub additional_elements: Vec<String>,
    pub additional_variables: BTreeSet<String>,
    pub include_all_variables: bool,
    pub on_error: DiagnosticPolicy,
    pub on_warning: DiagnosticPolicy,
    pub cache_dir: PathBuf,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            class_definitions: ClassDefinitionTable::new(),
            class_interpreters: default_chain(),
            additional_classes: Vec::new(),
            exclude_classes: BTreeSet::new(),
            base_css: Override::Default,
            variables: Override::Default,
            treeshake_base_css: true,
            treeshake_variables: true,
            theme_specificity: 1,
            additional_elements: Vec::new(),
            additional_variables: BTreeSet::new(),
            include_all_variables: false,
            on_error: DiagnosticPolicy::Throw,
            on_warning: DiagnosticPolicy::Log,
            cache_dir: PathBuf::from(".fuz/cache/css"),
        }
    }
}

/// Extensions a file must have to be considered for extraction, and
/// substring markers that exclude it even then. A `.spec.ts` file is
/// deliberately NOT excluded by default — it may legitimately contain class
/// usage worth extracting, unlike a generated or test-fixture file.
/// `default_file_filter` also does not normalize path separators: it
/// matches against whatever path string the caller passes, backslash and
/// all.
pub struct DefaultFileFilter {
    pub include_extensions: &'static [&'static str],
    pub exclude_substrings: &'static [&'static str],
}

pub fn default_file_filter() -> DefaultFileFilter {
    DefaultFileFilter {
        include_extensions: &[".svelte", ".html", ".ts", ".js", ".tsx", ".jsx"],
        exclude_substrings: &[".test.", "/test/", "/tests/", ".gen."],
    }
}

impl DefaultFileFilter {
    pub fn matches(&self, path: &str) -> bool {
        let has_extension = self.include_extensions.iter().any(|ext| path.ends_with(ext));
        if !has_extension {
            return false;
        }
        !self.exclude_substrings.iter().any(|needle| path.contains(needle))
    }
}
