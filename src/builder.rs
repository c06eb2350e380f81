//! Builder API for configuration policy.
//!
//! A [`ConfigBuilder`] is handed, mutably, to the setup closure passed to
//! [`build`](crate::build). When the closure returns, the builder is
//! consumed into an immutable [`Config`], which is the only thing the
//! resolution components ever reference. There is no way to mutate policy
//! after construction.
//!
//! # Overview
//!
//! The builder configures three things:
//! - **Roots**: the top-level directories to search. Later-added roots take
//!   precedence over earlier ones.
//! - **Overlays**: named layers, each naming a subdirectory of every root
//!   (or the root itself, for a `None` value). Later-defined overlays take
//!   precedence over earlier ones, regardless of root.
//! - **Handlers**: file formats, keyed by extension, in an order that
//!   defines both match priority and merge order.
//!
//! plus the three policies `always_reload`, `preload` and `freeze`.
//!
//! # Example
//!
//! ```rust,no_run
//! let config = calque::build(|c| {
//!     c.set_root("/etc/myapp");
//!     c.define_overlay("default", None);
//!     c.define_overlay("environment", Some("prod"));
//! })
//! .unwrap();
//! ```

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;

use crate::error::BuildError;
use crate::format::{FnFormat, FormatError, FormatHandler, FormatRegistry};
use crate::fs::{FileSource, StdFs};
use crate::value::ConfigValue;

/// One named configuration layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overlay {
    /// The overlay's name. Names need not be unique; combined-overlay lookup
    /// uses the first definition with a matching name.
    pub name: String,

    /// The subdirectory this overlay names under each root, or `None` to
    /// search the root itself.
    pub value: Option<String>,
}

/// Resolve a path against the working directory at call time, so later
/// working-directory changes do not affect resolution.
fn absolutize(path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        return path.to_owned();
    }
    match working_dir() {
        Some(cwd) => cwd.join(path),
        None => path.to_owned(),
    }
}

fn working_dir() -> Option<Utf8PathBuf> {
    let dir = std::env::current_dir().ok()?;
    Utf8PathBuf::from_path_buf(dir).ok()
}

// ============================================================================
// ConfigBuilder
// ============================================================================

/// Mutable configuration policy, consumed into a [`Config`] by
/// [`finish`](Self::finish).
pub struct ConfigBuilder {
    roots: Vec<Utf8PathBuf>,
    overlays: Vec<Overlay>,
    registry: FormatRegistry,
    source: Arc<dyn FileSource>,
    always_reload: bool,
    preload: bool,
    freeze: bool,
    /// First definition error, if any; surfaced by `finish`.
    error: Option<BuildError>,
}

impl ConfigBuilder {
    /// A builder with one root (the current working directory) and the
    /// default format handlers.
    ///
    /// Most callers go through [`build`](crate::build), which constructs the
    /// builder, passes it to a setup closure and finishes it in one step.
    pub fn new() -> Self {
        Self {
            roots: vec![working_dir().unwrap_or_else(|| Utf8PathBuf::from("."))],
            overlays: Vec::new(),
            registry: FormatRegistry::with_defaults(),
            source: Arc::new(StdFs),
            always_reload: false,
            preload: false,
            freeze: false,
            error: None,
        }
    }

    /// Replace the root list with a single entry, normalized to an absolute
    /// path now.
    pub fn set_root(&mut self, path: impl AsRef<Utf8Path>) -> &mut Self {
        self.roots = vec![absolutize(path.as_ref())];
        self
    }

    /// Add a root at the front of the root list. Later-added roots take
    /// precedence: within each overlay they merge after earlier roots, so
    /// their files override earlier roots' files for the same key.
    pub fn add_root(&mut self, path: impl AsRef<Utf8Path>) -> &mut Self {
        self.roots.insert(0, absolutize(path.as_ref()));
        self
    }

    /// Define an overlay named `name`, searching the subdirectory `value` of
    /// each root (or the root itself when `value` is `None`).
    pub fn define_overlay(&mut self, name: impl Into<String>, value: Option<&str>) -> &mut Self {
        self.overlays.push(Overlay {
            name: name.into(),
            value: value.map(str::to_owned),
        });
        self
    }

    /// Define an overlay whose value is produced by a closure.
    ///
    /// The closure runs immediately, at definition time, not lazily at
    /// resolution time.
    pub fn define_overlay_with(
        &mut self,
        name: impl Into<String>,
        value: impl FnOnce() -> Option<String>,
    ) -> &mut Self {
        self.overlays.push(Overlay {
            name: name.into(),
            value: value(),
        });
        self
    }

    /// Define an overlay from the combined values of previously defined
    /// overlays.
    ///
    /// The new overlay's name is the `"_"`-join of `names` and its value the
    /// `"_"`-join of each named overlay's already-resolved value (a `None`
    /// value joins as an empty string; the separator is not escaped). A name
    /// with no prior definition records
    /// [`BuildError::UnknownOverlay`], which [`build`](crate::build) returns
    /// before any lookup happens.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// // Searches for files in `prod_US` subdirectories.
    /// let config = calque::build(|c| {
    ///     c.define_overlay("environment", Some("prod"));
    ///     c.define_overlay("country", Some("US"));
    ///     c.define_combined_overlay(&["environment", "country"]);
    /// })
    /// .unwrap();
    /// ```
    pub fn define_combined_overlay(&mut self, names: &[&str]) -> &mut Self {
        let mut values = Vec::with_capacity(names.len());
        for name in names {
            match self.overlays.iter().find(|o| o.name == *name) {
                Some(overlay) => values.push(overlay.value.clone().unwrap_or_default()),
                None => {
                    self.record_error(BuildError::UnknownOverlay {
                        name: (*name).to_owned(),
                    });
                    return self;
                }
            }
        }
        self.overlays.push(Overlay {
            name: names.join("_"),
            value: Some(values.join("_")),
        });
        self
    }

    /// Register a format handler, appending one entry per extension it
    /// declares.
    pub fn define_handler(&mut self, handler: impl FormatHandler + 'static) -> &mut Self {
        self.registry.register(handler);
        self
    }

    /// Register a closure as the handler for `extensions`.
    pub fn define_handler_fn(
        &mut self,
        extensions: &[&'static str],
        parse: impl Fn(&str) -> Result<ConfigValue, FormatError> + Send + Sync + 'static,
    ) -> &mut Self {
        self.registry.register(FnFormat::new(extensions, parse));
        self
    }

    /// Register a format handler, removing any prior registrations for the
    /// same extensions first.
    pub fn set_handler(&mut self, handler: impl FormatHandler + 'static) -> &mut Self {
        self.registry.replace(handler);
        self
    }

    /// Register a closure handler, removing any prior registrations for the
    /// same extensions first.
    pub fn set_handler_fn(
        &mut self,
        extensions: &[&'static str],
        parse: impl Fn(&str) -> Result<ConfigValue, FormatError> + Send + Sync + 'static,
    ) -> &mut Self {
        self.registry.replace(FnFormat::new(extensions, parse));
        self
    }

    /// Reload configuration files on every access instead of caching.
    pub fn always_reload(&mut self, value: bool) -> &mut Self {
        self.always_reload = value;
        self
    }

    /// Resolve and cache every discoverable key at construction time.
    ///
    /// This does not prevent `always_reload` from working.
    pub fn preload(&mut self, value: bool) -> &mut Self {
        self.preload = value;
        self
    }

    /// Seal every resolved value against mutation. Useful in production
    /// environments.
    pub fn freeze(&mut self, value: bool) -> &mut Self {
        self.freeze = value;
        self
    }

    /// Replace the filesystem collaborator (for tests).
    pub fn file_source(&mut self, source: Arc<dyn FileSource>) -> &mut Self {
        self.source = source;
        self
    }

    fn record_error(&mut self, error: BuildError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Consume the builder into an immutable [`Config`], surfacing any
    /// definition error recorded along the way.
    pub fn finish(self) -> Result<Config, BuildError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(Config {
            roots: self.roots,
            overlays: self.overlays,
            registry: self.registry,
            source: self.source,
            always_reload: self.always_reload,
            preload: self.preload,
            freeze: self.freeze,
        })
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Config
// ============================================================================

/// Immutable configuration policy: roots, overlays, handlers and the three
/// resolution policies.
pub struct Config {
    roots: Vec<Utf8PathBuf>,
    overlays: Vec<Overlay>,
    registry: FormatRegistry,
    source: Arc<dyn FileSource>,
    always_reload: bool,
    preload: bool,
    freeze: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("roots", &self.roots)
            .field("overlays", &self.overlays)
            .field("always_reload", &self.always_reload)
            .field("preload", &self.preload)
            .field("freeze", &self.freeze)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// The search roots, most-recently-added first. Never empty.
    pub fn roots(&self) -> &[Utf8PathBuf] {
        &self.roots
    }

    /// The defined overlays, in definition order.
    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    /// The format registry.
    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// The filesystem collaborator.
    pub fn file_source(&self) -> &dyn FileSource {
        &*self.source
    }

    /// Whether to reload a configuration file each time it is accessed.
    pub fn always_reload(&self) -> bool {
        self.always_reload
    }

    /// Whether to load all configuration files upon creation.
    pub fn preload(&self) -> bool {
        self.preload
    }

    /// Whether to seal all loaded values.
    pub fn freeze(&self) -> bool {
        self.freeze
    }

    /// The full ordered list of directories to search.
    ///
    /// Directories are ordered lowest precedence first: this is the order
    /// the finder merges in, and a later directory's file wins conflicts.
    /// With no overlays defined this is the root list, least-recently-added
    /// root first. Otherwise, for each overlay (in definition order) and
    /// each root (least-recently-added first), the overlay's directory
    /// under that root, flattened and deduplicated preserving first
    /// occurrence. Overlay-major ordering means a later-defined overlay
    /// beats an earlier one regardless of root; within one overlay, a
    /// later-added root beats an earlier one.
    pub fn overlay_dirs(&self) -> Vec<Utf8PathBuf> {
        if self.overlays.is_empty() {
            return self.roots.iter().rev().cloned().collect();
        }
        let mut dirs = IndexSet::new();
        for overlay in &self.overlays {
            for root in self.roots.iter().rev() {
                let dir = match &overlay.value {
                    Some(value) => root.join(value),
                    None => root.clone(),
                };
                dirs.insert(dir);
            }
        }
        dirs.into_iter().collect()
    }

    /// The registered extensions, in registration order.
    pub fn extensions(&self) -> Vec<&str> {
        self.registry.extensions()
    }

    /// The first registered handler matching the filename's suffix, or
    /// `None`.
    pub fn handler_for(&self, filename: &str) -> Option<&dyn FormatHandler> {
        self.registry.handler_for(filename)
    }
}
