//! Errors raised while building a configuration or resolving a key.

use std::fmt;
use std::io;

use camino::Utf8PathBuf;

use crate::format::FormatError;

/// Error raised while building a [`Calque`](crate::Calque) instance.
#[derive(Debug)]
#[non_exhaustive]
pub enum BuildError {
    /// A combined overlay referenced an overlay name that was not defined
    /// before it.
    UnknownOverlay {
        /// The name that could not be found among prior definitions.
        name: String,
    },

    /// Eager resolution of a key failed while the `preload` policy was
    /// populating the cache. There is no partial-preload recovery; the whole
    /// build fails.
    Preload {
        /// The resolution error for the offending key.
        source: ConfigError,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::UnknownOverlay { name } => write!(f, "no such overlay: `{name}`"),
            BuildError::Preload { source } => {
                write!(f, "failed to preload configuration: {source}")
            }
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::UnknownOverlay { .. } => None,
            BuildError::Preload { source } => Some(source),
        }
    }
}

/// Error raised while resolving a configuration key.
#[derive(Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// No file for the key exists in any overlay directory, under any
    /// registered extension. Recoverable: callers may fall back to a
    /// default.
    FileNotFound {
        /// The key that was requested.
        key: String,
    },

    /// A candidate file exists but could not be read.
    Read {
        /// The file that failed to read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// A candidate file was read but its format handler rejected it. A
    /// malformed file for an otherwise-locatable key is a hard failure,
    /// never silently skipped.
    Parse {
        /// The file that failed to parse.
        path: Utf8PathBuf,
        /// The handler's parse error.
        source: FormatError,
    },
}

impl ConfigError {
    /// Whether this is the recoverable missing-key case.
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, ConfigError::FileNotFound { .. })
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound { key } => {
                write!(f, "can't find config files for key `{key}`")
            }
            ConfigError::Read { path, source } => {
                write!(f, "failed to read {path}: {source}")
            }
            ConfigError::Parse { path, source } => {
                write!(f, "failed to parse {path}: {source}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::FileNotFound { .. } => None,
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
        }
    }
}
