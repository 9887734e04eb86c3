//! Pluggable filesystem operations: only the trait boundary is this
//! crate's concern, not a concrete implementation. The in-memory
//! implementation exists for this crate's own tests and for embedders
//! exercising the cache/extractor without touching disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// An error from a filesystem operation, captured into the result rather
/// than propagated as a panic.
#[derive(Debug, Clone)]
pub struct FsError {
    pub error: String,
    pub message: String,
    pub not_found: bool,
}

impl std::fmt::Display for FsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

pub trait SourceFs: Send + Sync {
    fn read_text(&self, path: &Path) -> Option<String>;
    fn write_text_atomic(&self, path: &Path, content: &str) -> Result<(), FsError>;
    fn unlink(&self, path: &Path) -> Result<(), FsError>;
    /// Atomic rename, used by `cache::store`'s write-then-rename sequence.
    /// A real implementation is `std::fs::rename`.
    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError>;
}

/// Real filesystem, creating parent directories on write.
pub struct RealFs;

impl SourceFs for RealFs {
    fn read_text(&self, path: &Path) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }

    fn write_text_atomic(&self, path: &Path, content: &str) -> Result<(), FsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FsError {
                error: "create_dir_all".into(),
                message: e.to_string(),
                not_found: false,
            })?;
        }
        std::fs::write(path, content).map_err(|e| FsError {
            error: "write".into(),
            message: e.to_string(),
            not_found: e.kind() == std::io::ErrorKind::NotFound,
        })
    }

    fn unlink(&self, path: &Path) -> Result<(), FsError> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FsError {
                error: "remove_file".into(),
                message: e.to_string(),
                not_found: false,
            }),
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        if let Some(parent) = to.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        std::fs::rename(from, to).map_err(|e| FsError {
            error: "rename".into(),
            message: e.to_string(),
            not_found: e.kind() == std::io::ErrorKind::NotFound,
        })
    }
}

/// An in-memory filesystem for tests (this crate's own, and for embedders
/// exercising the cache/extractor without touching disk).
#[derive(Default)]
pub struct InMemoryFs {
    files: Mutex<HashMap<PathBuf, String>>,
}

impl InMemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.lock().unwrap().insert(path.into(), content.into());
    }
}

impl SourceFs for InMemoryFs {
    fn read_text(&self, path: &Path) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    fn write_text_atomic(&self, path: &Path, content: &str) -> Result<(), FsError> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    fn unlink(&self, path: &Path) -> Result<(), FsError> {
        let mut files = self.files.lock().unwrap();
        if files.remove(path).is_some() {
            Ok(())
        } else {
            Err(FsError {
                error: "unlink".into(),
                message: "not found".into(),
                not_found: true,
            })
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        let mut files = self.files.lock().unwrap();
        if let Some(content) = files.remove(from) {
            files.insert(to.to_path_buf(), content);
            Ok(())
        } else {
            Err(FsError {
                error: "rename".into(),
                message: format!("source {:?} not found", from),
                not_found: true,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_fs_write_then_read() {
        let fs = InMemoryFs::new();
        fs.write_text_atomic(Path::new("/a.json"), "hello").unwrap();
        assert_eq!(fs.read_text(Path::new("/a.json")), Some("hello".to_string()));
    }

    #[test]
    fn in_memory_fs_read_missing_returns_none() {
        let fs = InMemoryFs::new();
        assert_eq!(fs.read_text(Path::new("/missing.json")), None);
    }

    #[test]
    fn in_memory_fs_rename_moves_content() {
        let fs = InMemoryFs::new();
        fs.write_text_atomic(Path::new("/a.tmp"), "x").unwrap();
        fs.rename(Path::new("/a.tmp"), Path::new("/a.json")).unwrap();
        assert_eq!(fs.read_text(Path::new("/a.tmp")), None);
        assert_eq!(fs.read_text(Path::new("/a.json")), Some("x".to_string()));
    }

    #[test]
    fn in_memory_fs_unlink_missing_is_not_found() {
        let fs = InMemoryFs::new();
        let err = fs.unlink(Path::new("/missing.json")).unwrap_err();
        assert!(err.not_found);
    }
}
