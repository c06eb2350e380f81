//! Locating, parsing and merging the files behind a configuration key.
//!
//! The [`Finder`] is stateless between calls: it holds only a reference to
//! the [`Config`] and derives everything else per request.

use std::sync::Arc;

use camino::Utf8PathBuf;
use indexmap::IndexSet;

use crate::builder::Config;
use crate::error::ConfigError;
use crate::merge::deep_merge;
use crate::value::ConfigValue;

/// Searches overlay directories for the files defining a configuration key,
/// and merges each instance found with the previous.
pub struct Finder {
    config: Arc<Config>,
}

impl Finder {
    /// Create a finder over the given configuration.
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Resolve `key` by merging every matching file, in search order.
    ///
    /// Candidates are visited directory-major (the overlay-directory order
    /// of [`Config::overlay_dirs`]), extension-minor (registration order).
    /// The first file seeds the result; an object parsed from a later file
    /// deep-merges onto an object result, while any other combination
    /// replaces the running result wholesale. This lets an overlay file such
    /// as `prod/values.yml` override a single key deep inside `values.yml`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::FileNotFound`] if no file matches `key` anywhere;
    /// [`ConfigError::Read`] / [`ConfigError::Parse`] if a matching file
    /// cannot be read or parsed.
    pub fn load(&self, key: &str) -> Result<ConfigValue, ConfigError> {
        let source = self.config.file_source();
        let mut result: Option<ConfigValue> = None;
        let mut merged = 0usize;

        for dir in self.config.overlay_dirs() {
            for (extension, handler) in self.config.registry().iter() {
                let path = dir.join(format!("{key}.{extension}"));
                if !source.is_file(&path) {
                    continue;
                }
                let contents = source.read(&path).map_err(|e| ConfigError::Read {
                    path: path.clone(),
                    source: e,
                })?;
                let value = handler.parse(&contents).map_err(|e| ConfigError::Parse {
                    path: path.clone(),
                    source: e,
                })?;
                tracing::trace!(path = %path, "finder: merging candidate file");
                result = Some(match result.take() {
                    None => value,
                    Some(previous) => deep_merge(previous, value),
                });
                merged += 1;
            }
        }

        let Some(value) = result else {
            return Err(ConfigError::FileNotFound {
                key: key.to_owned(),
            });
        };
        tracing::debug!(key, files = merged, "finder: resolved key");

        if self.config.freeze() {
            Ok(value.seal())
        } else {
            Ok(value)
        }
    }

    /// The paths of all existing files for `key`, in the exact order
    /// [`load`](Self::load) merges them.
    pub fn files_for(&self, key: &str) -> Vec<Utf8PathBuf> {
        let source = self.config.file_source();
        let mut files = Vec::new();
        for dir in self.config.overlay_dirs() {
            for (extension, _) in self.config.registry().iter() {
                let path = dir.join(format!("{key}.{extension}"));
                if source.is_file(&path) {
                    files.push(path);
                }
            }
        }
        files
    }

    /// The names of all unique configuration keys, in first-discovery order.
    ///
    /// Every overlay directory is listed for files matching a registered
    /// extension; the key is the file name up to its first dot.
    pub fn all_key_names(&self) -> Vec<String> {
        let source = self.config.file_source();
        let extensions = self.config.extensions();
        let mut names = IndexSet::new();
        for dir in self.config.overlay_dirs() {
            for file in source.list(&dir, &extensions) {
                let name = file.split('.').next().unwrap_or_default();
                names.insert(name.to_owned());
            }
        }
        names.into_iter().collect()
    }
}
