//! Per-file content-addressed extraction cache.
//!
//! A self-healing, versioned cache: any read or parse failure becomes a
//! miss rather than a propagated error, using a read-parse-validate
//! discipline with `anyhow::Context` for error messages.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::diagnostics::{Diagnostic, SourceLocation};
use crate::fs_ops::SourceFs;

/// Bumped on any change to `ExtractionResult`, `SourceLocation`, or
/// `Diagnostic`'s shape, or to the extraction logic itself.
pub const SCHEMA_VERSION: u32 = 1;

/// The serialized, on-disk shape of a cached extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedExtraction {
    pub v: u32,
    pub content_hash: String,
    pub classes: Option<Vec<(String, Vec<SourceLocation>)>>,
    pub elements: Option<Vec<String>>,
    pub css_variables: Option<Vec<String>>,
    pub tracked_vars: Option<Vec<String>>,
    pub diagnostics: Option<Vec<Diagnostic>>,
}

/// Result of a cache lookup.
pub enum CacheLookup {
    Hit(CachedExtraction),
    Miss,
}

/// SHA-256 of `content`, hex-encoded lowercase. Used for file-content
/// hashes, where cryptographic collision resistance matters.
pub fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// DJB2 hash, hex-encoded (may be signed — the sign bit is preserved, not
/// normalized away). Used for in-memory content hashing (the variable
/// graph and similar) where cryptographic strength is not required.
///
/// `h = ((h << 5) - h) + c`, reduced to a 32-bit signed accumulator.
pub fn djb2_hex(content: &str) -> String {
    let mut h: i32 = 0;
    for c in content.bytes() {
        h = h.wrapping_shl(5).wrapping_sub(h).wrapping_add(c as i32);
    }
    if h < 0 {
        format!("-{:x}", (h as i64).unsigned_abs())
    } else {
        format!("{:x}", h)
    }
}

/// Derive the cache file path for a source file: `<cache_root>/<source
/// relative to project_root>.json`.
///
/// Returns an error if `source_abs` is not under `project_root` — an
/// invariant violation, not a recoverable diagnostic.
pub fn cache_path_for(
    source_abs: &Path,
    cache_root: &Path,
    project_root: &Path,
) -> Result<PathBuf> {
    let rel = source_abs.strip_prefix(project_root).with_context(|| {
        format!(
            "source path {:?} is not under project root {:?}",
            source_abs, project_root
        )
    })?;
    let mut rel_json = rel.as_os_str().to_os_string();
    rel_json.push(".json");
    Ok(cache_root.join(rel_json))
}

/// Load a cached extraction for `source_abs`. Any missing file, I/O error,
/// parse error, or schema-version mismatch yields `CacheLookup::Miss`,
/// never an `Err` — the cache self-heals rather than failing the build.
pub fn load(
    fs: &dyn SourceFs,
    source_abs: &Path,
    cache_root: &Path,
    project_root: &Path,
) -> Result<CacheLookup> {
    let cache_path = cache_path_for(source_abs, cache_root, project_root)?;
    let Some(text) = fs.read_text(&cache_path) else {
        return Ok(CacheLookup::Miss);
    };
    let parsed: Result<CachedExtraction, _> = serde_json::from_str(&text);
    match parsed {
        Ok(record) if record.v == SCHEMA_VERSION => Ok(CacheLookup::Hit(record)),
        _ => Ok(CacheLookup::Miss),
    }
}

/// A monotonically increasing counter used to keep concurrent writers'
/// temp-file suffixes unique even within the same process and millisecond.
static TEMP_SUFFIX: AtomicU64 = AtomicU64::new(0);

/// Atomically store an extraction result: write to a uniquely named temp
/// file, then rename over `cache_path`. Empty collections are normalized
/// to `None` before serialization, so a round trip through the cache is
/// idempotent.
pub fn store(
    fs: &dyn SourceFs,
    cache_path: &Path,
    content_hash: &str,
    classes: Option<Vec<(String, Vec<SourceLocation>)>>,
    elements: Option<Vec<String>>,
    css_variables: Option<Vec<String>>,
    tracked_vars: Option<Vec<String>>,
    diagnostics: Option<Vec<Diagnostic>>,
) -> Result<()> {
    let classes = match classes {
        Some(c) if c.is_empty() => None,
        other => other,
    };
    let elements = match elements {
        Some(e) if e.is_empty() => None,
        other => other,
    };
    let css_variables = match css_variables {
        Some(v) if v.is_empty() => None,
        other => other,
    };
    let tracked_vars = match tracked_vars {
        Some(v) if v.is_empty() => None,
        other => other,
    };
    let diagnostics = match diagnostics {
        Some(d) if d.is_empty() => None,
        other => other,
    };

    let record = CachedExtraction {
        v: SCHEMA_VERSION,
        content_hash: content_hash.to_string(),
        classes,
        elements,
        css_variables,
        tracked_vars,
        diagnostics,
    };
    let body = serde_json::to_string(&record).context("failed to serialize cache record")?;

    let pid = std::process::id();
    let suffix = TEMP_SUFFIX.fetch_add(1, Ordering::Relaxed);
    let mut tmp_name = cache_path.as_os_str().to_os_string();
    tmp_name.push(format!(".tmp.{}.{}", pid, suffix));
    let tmp_path = PathBuf::from(tmp_name);

    fs.write_text_atomic(&tmp_path, &body)
        .map_err(|e| anyhow::anyhow!("{}: {}", e.error, e.message))
        .with_context(|| format!("failed writing cache temp file {:?}", tmp_path))?;
    fs.rename(&tmp_path, cache_path)
        .map_err(|e| anyhow::anyhow!("{}: {}", e.error, e.message))
        .with_context(|| format!("failed renaming {:?} -> {:?}", tmp_path, cache_path))?;
    Ok(())
}

/// Best-effort delete; a missing file is not an error.
pub fn delete(fs: &dyn SourceFs, cache_path: &Path) -> Result<()> {
    match fs.unlink(cache_path) {
        Ok(()) => Ok(()),
        Err(e) if e.not_found => Ok(()),
        Err(e) => bail!("failed deleting cache file {:?}: {}", cache_path, e.message),
    }
}

/// Restore the runtime shape (classes map, elements set, diagnostics list)
/// from a serialized cache record.
pub fn from_cached(
    record: &CachedExtraction,
) -> (
    std::collections::BTreeMap<String, Vec<SourceLocation>>,
    std::collections::BTreeSet<String>,
    std::collections::BTreeSet<String>,
    std::collections::BTreeSet<String>,
    Vec<Diagnostic>,
) {
    let classes = record
        .classes
        .clone()
        .unwrap_or_default()
        .into_iter()
        .collect();
    let elements = record.elements.clone().unwrap_or_default().into_iter().collect();
    let css_variables = record
        .css_variables
        .clone()
        .unwrap_or_default()
        .into_iter()
        .collect();
    let tracked_vars = record
        .tracked_vars
        .clone()
        .unwrap_or_default()
        .into_iter()
        .collect();
    let diagnostics = record.diagnostics.clone().unwrap_or_default();
    (classes, elements, css_variables, tracked_vars, diagnostics)
}
