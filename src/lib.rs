//! Build-time CSS generator for a utility-class design system.
//!
//! Given a project's source files, [`generate`] extracts every utility
//! class in use, resolves the theme variables and base stylesheet rules
//! those classes and the detected elements require, and emits a single CSS
//! artifact with theme, base and utility sections — tree-shaken down to
//! what the project actually uses.
//!
//! This crate is a library, not a runtime: it has no file-enumeration, no
//! watch mode and no CLI. It is meant to be called from a bundler plugin
//! or build script that already knows which files to pass in.

pub mod cache;
pub mod class_defs;
pub mod class_var_index;
pub mod config;
pub mod diagnostics;
pub mod emit;
pub mod extract;
pub mod fs_ops;
pub mod pipeline;
pub mod resolver;
pub mod source_index;
pub mod style_index;
pub mod var_graph;

use std::path::Path;

use diagnostics::{AggregateDiagnosticError, apply_policy};
use emit::AssembleFlags;
use resolver::ResolveOptions;

pub use config::GeneratorOptions;
pub use diagnostics::Diagnostic;
pub use pipeline::SourceFile;

/// The generated CSS artifact plus the diagnostics accumulated while
/// building it.
#[derive(Debug)]
pub struct GenerateOutput {
    pub css: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the full pipeline: extract every file, resolve variables and base
/// rules against what was detected, and emit the final CSS artifact.
///
/// `fs` is only consulted for the extraction cache; `files` themselves are
/// supplied in memory by the caller — file enumeration is the embedder's
/// responsibility, not this crate's.
pub fn generate(
    files: &[SourceFile],
    base_css: &str,
    variables: &[var_graph::StyleVariable],
    options: &GeneratorOptions,
    fs: &dyn fs_ops::SourceFs,
    project_root: &Path,
) -> Result<GenerateOutput, AggregateDiagnosticError> {
    let cache_root = project_root.join(&options.cache_dir);
    let (detected, mut diagnostics) = pipeline::extract_all(files, fs, &cache_root, project_root);

    let resolved_base_css = options
        .base_css
        .resolve_ref(&base_css.to_string())
        .unwrap_or_default();
    let style_index = style_index::StyleRuleIndex::parse(&resolved_base_css);

    let resolved_variables = options
        .variables
        .resolve_ref(&variables.to_vec())
        .unwrap_or_default();

    let resolve_options = ResolveOptions {
        additional_classes: &options.additional_classes,
        exclude_classes: &options.exclude_classes,
        additional_elements: &options.additional_elements,
        additional_variables: &options.additional_variables,
        include_all_variables: options.include_all_variables,
        treeshake_base_css: options.treeshake_base_css,
        treeshake_variables: options.treeshake_variables,
        theme_specificity: options.theme_specificity,
    };

    let result = resolver::resolve(
        &detected,
        &options.class_definitions,
        &options.class_interpreters,
        &style_index,
        &resolved_variables,
        &resolve_options,
    );
    diagnostics.extend(result.diagnostics.clone());

    let mut class_definitions = options.class_definitions.clone();
    for name in detected.classes.keys() {
        if !class_definitions.contains_key(name) {
            if let class_defs::InterpretResult::Expanded(def) =
                class_defs::interpret_chain(name, &options.class_interpreters)
            {
                class_definitions.insert(name.clone(), def);
            }
        }
    }
    for name in &options.additional_classes {
        if !class_definitions.contains_key(name) {
            if let class_defs::InterpretResult::Expanded(def) =
                class_defs::interpret_chain(name, &options.class_interpreters)
            {
                class_definitions.insert(name.clone(), def);
            }
        }
    }

    let mut flattened_classes = detected.classes.keys().cloned().collect::<std::collections::BTreeSet<_>>();
    flattened_classes.extend(options.additional_classes.iter().cloned());
    for excluded in &options.exclude_classes {
        flattened_classes.remove(excluded);
    }
    let utility_css = emit::emit_utility_css(&flattened_classes, &class_definitions);

    let css = emit::assemble(
        &result,
        &utility_css,
        &AssembleFlags {
            emit_theme: true,
            emit_base: true,
            emit_utilities: true,
        },
    );

    let kept = apply_policy(&diagnostics, options.on_error, options.on_warning)?;

    Ok(GenerateOutput { css, diagnostics: kept })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_ops::InMemoryFs;

    #[test]
    fn generate_end_to_end_produces_all_three_sections() {
        let files = vec![SourceFile {
            path: "App.svelte",
            content: r#"<div class="display:flex btn"></div>"#,
        }];
        let mut options = GeneratorOptions::default();
        options.class_definitions.insert(
            "btn".to_string(),
            class_defs::CssClassDefinition::Ruleset {
                ruleset: ".btn { color: var(--text-color); }".to_string(),
            },
        );
        let variables = vec![var_graph::StyleVariable {
            name: "text-color".to_string(),
            light_value: Some("black".to_string()),
            dark_value: Some("white".to_string()),
        }];
        let base_css = "div { padding: 0; }";
        let fs = InMemoryFs::new();

        let output = generate(
            &files,
            base_css,
            &variables,
            &options,
            &fs,
            Path::new("/proj"),
        )
        .unwrap();

        assert!(output.css.contains("/* Theme Variables */"));
        assert!(output.css.contains("/* Base Styles */"));
        assert!(output.css.contains("/* Utility Classes */"));
        assert!(output.css.contains("--text-color: black"));
        assert!(output.css.contains(".btn"));
        assert!(output.css.contains("display\\:flex"));
    }

    #[test]
    fn generate_throws_on_error_policy_with_aggregate_diagnostics() {
        let files = vec![SourceFile {
            path: "App.svelte",
            content: r#"<div class="totallymadeup:value"></div>"#,
        }];
        let mut options = GeneratorOptions::default();
        options.on_warning = diagnostics::DiagnosticPolicy::Throw;
        let fs = InMemoryFs::new();

        let err = generate(&files, "", &[], &options, &fs, Path::new("/proj")).unwrap_err();
        assert!(!err.diagnostics.is_empty());
    }
}
