//! Per-file extraction runs on a rayon worker pool, one file per task, with
//! results aggregated in source-path-ascending order so the final output
//! never depends on which worker finished first. Resolution is
//! single-threaded and runs after every file has been extracted.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rayon::prelude::*;

use crate::cache::{self, CacheLookup};
use crate::diagnostics::{Diagnostic, SourceLocation};
use crate::extract;
use crate::fs_ops::SourceFs;
use crate::resolver::DetectedUsage;

pub struct SourceFile<'a> {
    pub path: &'a str,
    pub content: &'a str,
}

/// Extract every file in `files`, consulting and refreshing the on-disk
/// cache for each, then aggregate into one deterministic `DetectedUsage`
/// plus the extraction-phase diagnostics.
pub fn extract_all(
    files: &[SourceFile],
    fs: &dyn SourceFs,
    cache_root: &Path,
    project_root: &Path,
) -> (DetectedUsage, Vec<Diagnostic>) {
    let mut per_file: Vec<(&str, FileOutcome)> = files
        .par_iter()
        .map(|file| (file.path, extract_one(file, fs, cache_root, project_root)))
        .collect();

    per_file.sort_by(|a, b| a.0.cmp(b.0));

    let mut classes: BTreeMap<String, Vec<SourceLocation>> = BTreeMap::new();
    let mut elements: BTreeSet<String> = BTreeSet::new();
    let mut css_variables: BTreeSet<String> = BTreeSet::new();
    let mut tracked_vars: BTreeSet<String> = BTreeSet::new();
    let mut diagnostics = Vec::new();

    for (_, outcome) in per_file {
        match outcome {
            FileOutcome::Extracted {
                classes: file_classes,
                elements: file_elements,
                css_variables: file_css_variables,
                tracked_vars: file_tracked_vars,
                diagnostics: file_diagnostics,
            } => {
                for (class, locations) in file_classes {
                    classes.entry(class).or_default().extend(locations);
                }
                elements.extend(file_elements);
                css_variables.extend(file_css_variables);
                tracked_vars.extend(file_tracked_vars);
                diagnostics.extend(file_diagnostics);
            }
            FileOutcome::UnrecognizedDialect => {}
        }
    }

    (
        DetectedUsage {
            classes,
            elements,
            css_variables,
            tracked_vars,
        },
        diagnostics,
    )
}

enum FileOutcome {
    Extracted {
        classes: BTreeMap<String, Vec<SourceLocation>>,
        elements: BTreeSet<String>,
        css_variables: BTreeSet<String>,
        tracked_vars: BTreeSet<String>,
        diagnostics: Vec<Diagnostic>,
    },
    UnrecognizedDialect,
}

fn extract_one(
    file: &SourceFile,
    fs: &dyn SourceFs,
    cache_root: &Path,
    project_root: &Path,
) -> FileOutcome {
    let content_hash = cache::sha256_hex(file.content);
    let source_abs = project_root.join(file.path);

    if let Ok(CacheLookup::Hit(record)) = cache::load(fs, &source_abs, cache_root, project_root) {
        if record.content_hash == content_hash {
            let (classes, elements, css_variables, tracked_vars, diagnostics) =
                cache::from_cached(&record);
            return FileOutcome::Extracted {
                classes,
                elements,
                css_variables,
                tracked_vars,
                diagnostics,
            };
        }
    }

    let Some(result) = extract::extract_file(file.path, file.content) else {
        return FileOutcome::UnrecognizedDialect;
    };

    if let Ok(cache_path) = cache::cache_path_for(&source_abs, cache_root, project_root) {
        let _ = cache::store(
            fs,
            &cache_path,
            &content_hash,
            Some(result.classes.clone().into_iter().collect()),
            Some(result.elements.iter().cloned().collect()),
            Some(result.css_variables.iter().cloned().collect()),
            Some(result.tracked_vars.iter().cloned().collect()),
            Some(result.diagnostics.clone()),
        );
    }

    FileOutcome::Extracted {
        classes: result.classes,
        elements: result.elements,
        css_variables: result.css_variables,
        tracked_vars: result.tracked_vars,
        diagnostics: result.diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_ops::InMemoryFs;

    #[test]
    fn aggregates_classes_across_files_in_path_order() {
        let fs = InMemoryFs::new();
        let files = vec![
            SourceFile {
                path: "b.svelte",
                content: r#"<div class="b-class"></div>"#,
            },
            SourceFile {
                path: "a.svelte",
                content: r#"<div class="a-class"></div>"#,
            },
        ];
        let (detected, diagnostics) =
            extract_all(&files, &fs, Path::new("/proj/.fuz/cache/css"), Path::new("/proj"));
        assert!(detected.classes.contains_key("a-class"));
        assert!(detected.classes.contains_key("b-class"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn unrecognized_extension_contributes_nothing() {
        let fs = InMemoryFs::new();
        let files = vec![SourceFile {
            path: "data.json",
            content: "{}",
        }];
        let (detected, _) =
            extract_all(&files, &fs, Path::new("/proj/.fuz/cache/css"), Path::new("/proj"));
        assert!(detected.classes.is_empty());
    }

    #[test]
    fn second_run_reads_from_cache() {
        let fs = InMemoryFs::new();
        let files = vec![SourceFile {
            path: "a.svelte",
            content: r#"<div class="cached"></div>"#,
        }];
        let cache_root = Path::new("/proj/.fuz/cache/css");
        let project_root = Path::new("/proj");
        extract_all(&files, &fs, cache_root, project_root);
        let (detected, _) = extract_all(&files, &fs, cache_root, project_root);
        assert!(detected.classes.contains_key("cached"));
    }

    #[test]
    fn changed_content_invalidates_cache() {
        let fs = InMemoryFs::new();
        let cache_root = Path::new("/proj/.fuz/cache/css");
        let project_root = Path::new("/proj");
        extract_all(
            &[SourceFile {
                path: "a.svelte",
                content: r#"<div class="old"></div>"#,
            }],
            &fs,
            cache_root,
            project_root,
        );
        let (detected, _) = extract_all(
            &[SourceFile {
                path: "a.svelte",
                content: r#"<div class="new"></div>"#,
            }],
            &fs,
            cache_root,
            project_root,
        );
        assert!(detected.classes.contains_key("new"));
        assert!(!detected.classes.contains_key("old"));
    }
}
