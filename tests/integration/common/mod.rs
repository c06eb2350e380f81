//! Shared helpers: a temporary configuration tree and a builder shortcut.

use camino::Utf8PathBuf;
use tempfile::TempDir;

use calque::{Calque, ConfigBuilder};

/// A temporary directory of configuration files, removed on drop.
pub struct TestRoot {
    dir: TempDir,
}

impl TestRoot {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// The root path of the tree.
    pub fn path(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().to_path_buf()).expect("utf-8 temp dir")
    }

    /// Write a file below the root, creating parent directories as needed.
    /// `rel` includes the extension, e.g. `"prod/values.yml"`.
    pub fn write(&self, rel: &str, contents: &str) -> Utf8PathBuf {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, contents).expect("write config file");
        path
    }

    /// Build a [`Calque`] rooted at this tree.
    pub fn config(&self, setup: impl FnOnce(&mut ConfigBuilder)) -> Calque {
        self.try_config(setup).expect("build config")
    }

    /// Build a [`Calque`] rooted at this tree, returning the build error.
    pub fn try_config(
        &self,
        setup: impl FnOnce(&mut ConfigBuilder),
    ) -> Result<Calque, calque::BuildError> {
        let root = self.path();
        calque::build(|c| {
            c.set_root(&root);
            setup(c);
        })
    }
}
