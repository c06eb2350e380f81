//! Filesystem access behind a collaborator trait.
//!
//! The [`Finder`](crate::Finder) never touches the filesystem directly: all
//! existence checks, directory listings and file reads go through a
//! [`FileSource`]. [`StdFs`] is the real filesystem; [`MemoryFs`] is an
//! in-memory fake for tests that want resolution behavior without touching
//! disk.

use std::collections::BTreeMap;
use std::io;
use std::sync::RwLock;

use camino::{Utf8Path, Utf8PathBuf};

use crate::format::extension_matches;

/// Read-only filesystem operations used during resolution.
pub trait FileSource: Send + Sync {
    /// Whether `path` exists and is a regular file.
    fn is_file(&self, path: &Utf8Path) -> bool;

    /// Names of files directly under `dir` whose name ends in `".{ext}"` for
    /// any of `extensions`. Returns an empty list for a missing directory.
    fn list(&self, dir: &Utf8Path, extensions: &[&str]) -> Vec<String>;

    /// Read the entire file as a string.
    fn read(&self, path: &Utf8Path) -> io::Result<String>;
}

/// [`FileSource`] backed by the real filesystem.
///
/// Listings are sorted so key discovery order does not depend on the
/// platform's directory iteration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFs;

impl FileSource for StdFs {
    fn is_file(&self, path: &Utf8Path) -> bool {
        path.is_file()
    }

    fn list(&self, dir: &Utf8Path, extensions: &[&str]) -> Vec<String> {
        let mut names = Vec::new();
        let Ok(entries) = dir.read_dir_utf8() else {
            return names;
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            if extensions.iter().any(|ext| extension_matches(name, ext)) {
                names.push(name.to_owned());
            }
        }
        names.sort();
        names
    }

    fn read(&self, path: &Utf8Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// [`FileSource`] backed by an in-memory map (for testing).
///
/// Interior-mutable so a test can rewrite files after the configuration has
/// been built, e.g. to exercise reload behavior.
#[derive(Debug, Default)]
pub struct MemoryFs {
    files: RwLock<BTreeMap<Utf8PathBuf, String>>,
}

impl MemoryFs {
    /// Create a new empty in-memory filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or overwrite a file.
    pub fn write(&self, path: impl Into<Utf8PathBuf>, contents: impl Into<String>) {
        self.files
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(path.into(), contents.into());
    }

    /// Remove a file; removing a missing file is a no-op.
    pub fn remove(&self, path: &Utf8Path) {
        self.files
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(path);
    }
}

impl FileSource for MemoryFs {
    fn is_file(&self, path: &Utf8Path) -> bool {
        self.files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(path)
    }

    fn list(&self, dir: &Utf8Path, extensions: &[&str]) -> Vec<String> {
        self.files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .filter_map(|path| path.file_name())
            .filter(|name| extensions.iter().any(|ext| extension_matches(name, ext)))
            .map(str::to_owned)
            .collect()
    }

    fn read(&self, path: &Utf8Path) -> io::Result<String> {
        self.files
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no such file: {path}")))
    }
}
