//! Pluggable file formats and the registry that selects them.
//!
//! A [`FormatHandler`] turns the raw text of one configuration file into a
//! [`ConfigValue`]. Handlers are registered per extension in a
//! [`FormatRegistry`]; registration order matters twice over:
//!
//! - it is the priority order for [`FormatRegistry::handler_for`], and
//! - when several extensions match the same key in one directory, it is the
//!   merge order: a later-registered extension's file merges on top.
//!
//! Built-in handlers cover YAML ([`YamlFormat`]), JSON ([`JsonFormat`]) and
//! TOML ([`TomlFormat`]); [`crate::TemplatedYamlFormat`] adds
//! environment-substituted YAML. Custom formats implement the trait:
//!
//! ```rust
//! use calque::{ConfigValue, FormatError, FormatHandler};
//!
//! struct ListFormat;
//!
//! impl FormatHandler for ListFormat {
//!     fn extensions(&self) -> &[&str] {
//!         &["list"]
//!     }
//!
//!     fn parse(&self, contents: &str) -> Result<ConfigValue, FormatError> {
//!         Ok(contents.lines().map(ConfigValue::from).collect::<Vec<_>>().into())
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use crate::value::{ConfigValue, ObjectMap};

/// Error returned when parsing a configuration file fails.
#[derive(Debug)]
pub struct FormatError {
    /// Human-readable error message.
    pub message: String,

    /// Byte offset in the source where the error occurred, if known.
    pub offset: Option<usize>,
}

impl FormatError {
    /// Create a new error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            offset: None,
        }
    }

    /// Create a new error with a message and source offset.
    pub fn with_offset(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset: Some(offset),
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(offset) = self.offset {
            write!(f, "at byte {}: {}", offset, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for FormatError {}

/// Trait for configuration file format parsers.
pub trait FormatHandler: Send + Sync {
    /// File extensions this format handles, without the leading dot.
    ///
    /// Compound extensions such as `"yml.tpl"` are allowed; matching is a
    /// suffix test against the whole filename.
    fn extensions(&self) -> &[&str];

    /// Parse file contents into a [`ConfigValue`].
    fn parse(&self, contents: &str) -> Result<ConfigValue, FormatError>;
}

/// Whether `filename` ends in `".{extension}"`.
pub(crate) fn extension_matches(filename: &str, extension: &str) -> bool {
    filename.len() > extension.len()
        && filename.ends_with(extension)
        && filename.as_bytes()[filename.len() - extension.len() - 1] == b'.'
}

// ============================================================================
// Format registry
// ============================================================================

struct Entry {
    extension: String,
    handler: Arc<dyn FormatHandler>,
}

/// A registry of file formats, keyed by extension.
///
/// One handler object may be registered under several extensions; each
/// extension is a separate entry, and entry order is registration order.
#[derive(Default)]
pub struct FormatRegistry {
    entries: Vec<Entry>,
}

impl FormatRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the default handlers: `yml`/`yaml` (YAML),
    /// `yml.tpl`/`yaml.tpl` (environment-substituted YAML), `json`, and
    /// `toml`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(YamlFormat);
        registry.register(crate::subst::TemplatedYamlFormat::new());
        registry.register(JsonFormat);
        registry.register(TomlFormat);
        registry
    }

    /// Register a format under each of its extensions, appending to the
    /// registration order.
    pub fn register<F: FormatHandler + 'static>(&mut self, format: F) {
        let handler: Arc<dyn FormatHandler> = Arc::new(format);
        let extensions: Vec<String> = handler.extensions().iter().map(|e| e.to_string()).collect();
        for extension in extensions {
            self.entries.push(Entry {
                extension,
                handler: Arc::clone(&handler),
            });
        }
    }

    /// Register a format, first removing any existing entries for the same
    /// extensions.
    pub fn replace<F: FormatHandler + 'static>(&mut self, format: F) {
        let extensions: Vec<String> = format.extensions().iter().map(|e| e.to_string()).collect();
        self.entries.retain(|e| !extensions.contains(&e.extension));
        self.register(format);
    }

    /// All registered extensions, in registration order.
    pub fn extensions(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.extension.as_str()).collect()
    }

    /// The first registered handler whose extension matches the filename's
    /// suffix, or `None`.
    pub fn handler_for(&self, filename: &str) -> Option<&dyn FormatHandler> {
        self.entries
            .iter()
            .find(|e| extension_matches(filename, &e.extension))
            .map(|e| &*e.handler)
    }

    /// Iterate `(extension, handler)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn FormatHandler)> {
        self.entries
            .iter()
            .map(|e| (e.extension.as_str(), &*e.handler))
    }
}

// ============================================================================
// Built-in formats
// ============================================================================

/// YAML format for `.yml` and `.yaml` files.
///
/// An empty file parses to [`ConfigValue::Null`].
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlFormat;

impl FormatHandler for YamlFormat {
    fn extensions(&self) -> &[&str] {
        &["yml", "yaml"]
    }

    fn parse(&self, contents: &str) -> Result<ConfigValue, FormatError> {
        let value: serde_yaml::Value = serde_yaml::from_str(contents).map_err(|e| {
            match e.location() {
                Some(location) => FormatError::with_offset(e.to_string(), location.index()),
                None => FormatError::new(e.to_string()),
            }
        })?;
        Ok(yaml_to_value(value))
    }
}

/// JSON format for `.json` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl FormatHandler for JsonFormat {
    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn parse(&self, contents: &str) -> Result<ConfigValue, FormatError> {
        let value: serde_json::Value =
            serde_json::from_str(contents).map_err(|e| FormatError::new(e.to_string()))?;
        Ok(json_to_value(value))
    }
}

/// TOML format for `.toml` files.
///
/// TOML datetimes have no [`ConfigValue`] counterpart and come through as
/// strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlFormat;

impl FormatHandler for TomlFormat {
    fn extensions(&self) -> &[&str] {
        &["toml"]
    }

    fn parse(&self, contents: &str) -> Result<ConfigValue, FormatError> {
        let table: toml::Table = toml::from_str(contents).map_err(|e| {
            match e.span() {
                Some(span) => FormatError::with_offset(e.message().to_string(), span.start),
                None => FormatError::new(e.message().to_string()),
            }
        })?;
        Ok(toml_to_value(toml::Value::Table(table)))
    }
}

/// A format handler backed by a closure, registered under explicit
/// extensions.
///
/// This is the lightweight way to add one-off formats without a dedicated
/// type:
///
/// ```rust
/// use calque::{ConfigValue, FnFormat};
///
/// let upper = FnFormat::new(&["up"], |contents| {
///     Ok(ConfigValue::from(contents.to_uppercase()))
/// });
/// ```
pub struct FnFormat {
    extensions: Vec<&'static str>,
    parse: Box<dyn Fn(&str) -> Result<ConfigValue, FormatError> + Send + Sync>,
}

impl FnFormat {
    /// Create a handler for `extensions` backed by `parse`.
    pub fn new(
        extensions: &[&'static str],
        parse: impl Fn(&str) -> Result<ConfigValue, FormatError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            extensions: extensions.to_vec(),
            parse: Box::new(parse),
        }
    }
}

impl FormatHandler for FnFormat {
    fn extensions(&self) -> &[&str] {
        &self.extensions
    }

    fn parse(&self, contents: &str) -> Result<ConfigValue, FormatError> {
        (self.parse)(contents)
    }
}

// ============================================================================
// Conversions
// ============================================================================

fn yaml_to_value(value: serde_yaml::Value) -> ConfigValue {
    match value {
        serde_yaml::Value::Null => ConfigValue::Null,
        serde_yaml::Value::Bool(b) => ConfigValue::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                ConfigValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                ConfigValue::Float(f)
            } else {
                ConfigValue::Null
            }
        }
        serde_yaml::Value::String(s) => ConfigValue::String(s),
        serde_yaml::Value::Sequence(items) => {
            ConfigValue::Array(items.into_iter().map(yaml_to_value).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let map: ObjectMap = mapping
                .into_iter()
                .map(|(k, v)| (yaml_key(k), yaml_to_value(v)))
                .collect();
            ConfigValue::from(map)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_value(tagged.value),
    }
}

/// YAML allows non-string mapping keys; configuration objects do not, so
/// scalar keys are rendered to their string form.
fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s,
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Null => "null".to_owned(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim_end().to_owned())
            .unwrap_or_default(),
    }
}

fn json_to_value(value: serde_json::Value) -> ConfigValue {
    match value {
        serde_json::Value::Null => ConfigValue::Null,
        serde_json::Value::Bool(b) => ConfigValue::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                ConfigValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                ConfigValue::Float(f)
            } else {
                ConfigValue::Null
            }
        }
        serde_json::Value::String(s) => ConfigValue::String(s),
        serde_json::Value::Array(items) => {
            ConfigValue::Array(items.into_iter().map(json_to_value).collect())
        }
        serde_json::Value::Object(map) => {
            let map: ObjectMap = map
                .into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect();
            ConfigValue::from(map)
        }
    }
}

fn toml_to_value(value: toml::Value) -> ConfigValue {
    match value {
        toml::Value::String(s) => ConfigValue::String(s),
        toml::Value::Integer(i) => ConfigValue::Integer(i),
        toml::Value::Float(f) => ConfigValue::Float(f),
        toml::Value::Boolean(b) => ConfigValue::Bool(b),
        toml::Value::Datetime(dt) => ConfigValue::String(dt.to_string()),
        toml::Value::Array(items) => {
            ConfigValue::Array(items.into_iter().map(toml_to_value).collect())
        }
        toml::Value::Table(table) => {
            let map: ObjectMap = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_value(v)))
                .collect();
            ConfigValue::from(map)
        }
    }
}
