#![warn(missing_docs)]
#![deny(unsafe_code)]
//! # calque - Layered Configuration Resolution
//!
//! calque resolves named configuration keys by locating, parsing and
//! deep-merging configuration fragments spread across an ordered set of
//! directories ("overlays"):
//! - **Overlays** - named layers such as `defaults`, an environment, or
//!   `local`, each a subdirectory of the configuration root
//! - **Multiple roots** - later-added roots shadow earlier ones
//! - **Pluggable formats** - YAML, JSON, TOML and templated YAML built in,
//!   custom formats via a trait
//! - **Policies** - cache forever (default), reload on every access,
//!   preload everything up front, freeze resolved values
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! let config = calque::build(|c| {
//!     c.set_root("/etc/myapp");
//! })
//! .unwrap();
//!
//! // Reads /etc/myapp/database.yml (or .yaml, .json, .toml, ...)
//! let database = config.get("database").unwrap();
//! assert_eq!(database.get("adapter").unwrap().as_str(), Some("postgres"));
//! ```
//!
//! ## Overlays
//!
//! Overlays let an environment override only the keys it cares about. Each
//! overlay names a subdirectory of every root (or the root itself, for
//! `None`), and files found in later-defined overlays deep-merge on top of
//! earlier ones:
//!
//! ```rust,no_run
//! let config = calque::build(|c| {
//!     c.set_root("/etc/myapp");
//!     c.define_overlay("default", None);
//!     c.define_overlay_with("environment", || std::env::var("APP_ENV").ok());
//!     c.define_overlay("local", Some("local"));
//! })
//! .unwrap();
//! ```
//!
//! With `APP_ENV=prod`, the key `values` now merges `/etc/myapp/values.yml`,
//! then `/etc/myapp/prod/values.yml`, then `/etc/myapp/local/values.yml`.
//! Objects merge key by key, recursively; anything else is replaced by the
//! later file (see [`deep_merge`]).
//!
//! ## Policies
//!
//! ```rust,no_run
//! let config = calque::build(|c| {
//!     c.set_root("/etc/myapp");
//!     c.always_reload(true); // re-read files on every access
//!     c.preload(true);       // resolve all keys at build time
//!     c.freeze(true);        // seal resolved values against mutation
//! })
//! .unwrap();
//! ```
//!
//! ## Custom Formats
//!
//! ```rust,no_run
//! use calque::ConfigValue;
//!
//! let config = calque::build(|c| {
//!     c.define_handler_fn(&["list"], |contents| {
//!         Ok(contents.lines().map(ConfigValue::from).collect::<Vec<_>>().into())
//!     });
//! })
//! .unwrap();
//! ```
//!
//! ## Threading
//!
//! A [`Calque`] instance is deliberately single-threaded (`!Sync`): the
//! cache has no internal locking, so sharing one across threads requires an
//! external mutex. Independent instances share nothing.

pub(crate) mod builder;
pub(crate) mod error;
pub(crate) mod finder;
pub(crate) mod format;
pub(crate) mod fs;
pub(crate) mod merge;
pub(crate) mod store;
pub(crate) mod subst;
pub(crate) mod value;

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

pub use builder::{Config, ConfigBuilder, Overlay};
pub use error::{BuildError, ConfigError};
pub use finder::Finder;
pub use format::{
    FnFormat, FormatError, FormatHandler, FormatRegistry, JsonFormat, TomlFormat, YamlFormat,
};
pub use fs::{FileSource, MemoryFs, StdFs};
pub use merge::deep_merge;
pub use store::Store;
pub use subst::{substitute, EnvSource, MockEnv, StdEnv, SubstError, TemplatedYamlFormat};
pub use value::{Array, ConfigValue, FrozenError, Object, ObjectMap};

/// Build a [`Calque`] instance from a setup closure.
///
/// The closure receives a mutable [`ConfigBuilder`]; when it returns, the
/// builder is frozen into an immutable [`Config`] and the instance is
/// created (resolving every key up front if the `preload` policy is set).
///
/// # Example
///
/// ```rust,no_run
/// let config = calque::build(|c| {
///     c.set_root("/path/to/my/configs");
/// })
/// .unwrap();
/// let foo = config.get("foo").unwrap(); // read from /path/to/my/configs/foo.yml
/// ```
///
/// # Errors
///
/// [`BuildError::UnknownOverlay`] if a combined overlay referenced an
/// undefined name, and [`BuildError::Preload`] if preloading failed to
/// resolve a discovered key.
pub fn build(setup: impl FnOnce(&mut ConfigBuilder)) -> Result<Calque, BuildError> {
    Calque::build(setup)
}

/// Access to resolved configuration.
///
/// This does very little itself: [`get`](Self::get) delegates to the cache,
/// which delegates to the finder on a miss. Construct one with
/// [`build`] (or [`Calque::build`]).
pub struct Calque {
    config: Arc<Config>,
    store: RefCell<Store>,
}

impl Calque {
    /// Build an instance from a setup closure; see [`build`].
    pub fn build(setup: impl FnOnce(&mut ConfigBuilder)) -> Result<Self, BuildError> {
        let mut builder = ConfigBuilder::new();
        setup(&mut builder);
        Self::from_config(builder.finish()?)
    }

    /// Build an instance from an already-finished [`Config`], for callers
    /// that drive [`ConfigBuilder`] by hand instead of through a setup
    /// closure.
    ///
    /// # Errors
    ///
    /// [`BuildError::Preload`] if the `preload` policy is set and a
    /// discovered key fails to resolve.
    pub fn from_config(config: Config) -> Result<Self, BuildError> {
        let config = Arc::new(config);
        let calque = Self {
            store: RefCell::new(Store::new(Arc::clone(&config))),
            config,
        };

        if calque.config.preload() {
            let finder = Finder::new(Arc::clone(&calque.config));
            for key in finder.all_key_names() {
                calque
                    .store
                    .borrow_mut()
                    .get(&key)
                    .map_err(|source| BuildError::Preload { source })?;
            }
            tracing::debug!(
                keys = calque.store.borrow().len(),
                "calque: preloaded all discoverable keys"
            );
        }

        Ok(calque)
    }

    /// Resolve the value for a configuration key.
    ///
    /// # Errors
    ///
    /// [`ConfigError::FileNotFound`] if no source file exists for the key
    /// anywhere in the search path; read and parse failures propagate as
    /// their own variants.
    pub fn get(&self, key: impl AsRef<str>) -> Result<ConfigValue, ConfigError> {
        self.store.borrow_mut().get(key.as_ref())
    }

    /// The configuration policy this instance resolves against.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The names of all discoverable keys across every overlay directory,
    /// whether or not they have been loaded yet.
    pub fn key_names(&self) -> Vec<String> {
        Finder::new(Arc::clone(&self.config)).all_key_names()
    }

    /// The currently cached keys, in the order they were first cached.
    pub fn cached_keys(&self) -> Vec<String> {
        self.store.borrow().keys()
    }
}

/// A human-readable summary of the cache: how many keys are loaded, and
/// their names, sorted.
impl fmt::Debug for Calque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.store.borrow();
        if store.is_empty() {
            write!(f, "Calque (empty)")
        } else {
            let mut keys = store.keys();
            keys.sort();
            write!(f, "Calque ({} keys): {}", keys.len(), keys.join(" "))
        }
    }
}
