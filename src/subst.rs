//! Environment variable substitution for templated configuration files.
//!
//! The [`TemplatedYamlFormat`] handler expands `${VAR}` patterns in the raw
//! file text, then parses the result as YAML. This is the templated-text
//! member of the default format set, registered for `.yml.tpl` and
//! `.yaml.tpl`.
//!
//! ## Syntax
//!
//! - `${VAR}` - Substitute with the value of environment variable `VAR`. Error if not set.
//! - `${VAR:-default}` - Substitute with the value of `VAR`, or `default` if not set.
//! - `$$` - Escape sequence that produces a literal `$`.
//!
//! ## Example
//!
//! ```text
//! data_dir: ${BASE_PATH}/data      # /var/myapp/data  (if BASE_PATH=/var/myapp)
//! port: ${PORT:-8080}              # 8080             (if PORT is not set)
//! literal: $${NOT_SUBSTITUTED}     # ${NOT_SUBSTITUTED}
//! ```

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;

use crate::format::{FormatError, FormatHandler, YamlFormat};
use crate::value::ConfigValue;

/// Error that occurs during environment variable substitution.
#[derive(Debug, Clone)]
pub struct SubstError {
    var_name: String,
}

impl SubstError {
    /// The name of the missing environment variable.
    pub fn var_name(&self) -> &str {
        &self.var_name
    }
}

impl fmt::Display for SubstError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "environment variable `{}` is not set and has no default",
            self.var_name
        )
    }
}

impl std::error::Error for SubstError {}

/// Trait for accessing environment variables, allowing for testing with mock
/// environments.
pub trait EnvSource: Send + Sync {
    /// Get the value of an environment variable by name.
    fn get(&self, name: &str) -> Option<String>;
}

/// Environment source that reads from the actual process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEnv;

impl EnvSource for StdEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Environment source backed by a map (for testing).
#[derive(Debug, Clone, Default)]
pub struct MockEnv {
    vars: IndexMap<String, String>,
}

impl MockEnv {
    /// Create a new empty mock environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock environment from an iterator of key-value pairs.
    pub fn from_pairs<I, K, V>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Set an environment variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }
}

impl EnvSource for MockEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Substitute environment variables in a string.
///
/// Returns `Ok(Cow::Borrowed(input))` if no substitution was needed,
/// or `Ok(Cow::Owned(substituted))` if substitution occurred.
/// Returns `Err` if a required variable is not set.
pub fn substitute<'a>(input: &'a str, env: &dyn EnvSource) -> Result<Cow<'a, str>, SubstError> {
    // Quick check: if there's no $ in the string, no substitution needed
    if !input.contains('$') {
        return Ok(Cow::Borrowed(input));
    }

    let mut result = String::new();
    let mut chars = input.chars().peekable();
    let mut modified = false;

    while let Some(c) = chars.next() {
        if c == '$' {
            match chars.peek() {
                // $$ -> literal $
                Some('$') => {
                    chars.next();
                    result.push('$');
                    modified = true;
                }
                // ${VAR} or ${VAR:-default}
                Some('{') => {
                    chars.next();
                    modified = true;

                    // Parse until we find '}' or ':-'
                    let mut var_name = String::new();
                    let mut default_value: Option<String> = None;
                    let mut found_close = false;

                    while let Some(&ch) = chars.peek() {
                        if ch == '}' {
                            chars.next();
                            found_close = true;
                            break;
                        } else if ch == ':' {
                            chars.next();
                            if chars.peek() == Some(&'-') {
                                chars.next();
                                // Read the default value until '}'
                                let mut default = String::new();
                                while let Some(&dch) = chars.peek() {
                                    if dch == '}' {
                                        chars.next();
                                        found_close = true;
                                        break;
                                    }
                                    default.push(dch);
                                    chars.next();
                                }
                                default_value = Some(default);
                                break;
                            } else {
                                // Just a ':' in the var name (unusual but allowed)
                                var_name.push(':');
                            }
                        } else {
                            var_name.push(ch);
                            chars.next();
                        }
                    }

                    if !found_close {
                        // Malformed: unclosed ${, treat as literal
                        result.push_str("${");
                        result.push_str(&var_name);
                        if let Some(default) = default_value {
                            result.push_str(":-");
                            result.push_str(&default);
                        }
                        continue;
                    }

                    match env.get(&var_name) {
                        Some(value) => result.push_str(&value),
                        None => match default_value {
                            Some(default) => result.push_str(&default),
                            None => return Err(SubstError { var_name }),
                        },
                    }
                }
                // Just a $ followed by something else - keep as literal
                _ => {
                    result.push('$');
                }
            }
        } else {
            result.push(c);
        }
    }

    if modified {
        Ok(Cow::Owned(result))
    } else {
        Ok(Cow::Borrowed(input))
    }
}

/// YAML with environment variable substitution, for `.yml.tpl` and
/// `.yaml.tpl` files.
///
/// Substitution runs over the raw text before parsing, so variables can
/// appear anywhere in the document, keys included. A missing variable
/// without a default is a parse failure for the whole file.
pub struct TemplatedYamlFormat {
    env: Box<dyn EnvSource>,
}

impl TemplatedYamlFormat {
    /// Create a handler reading from the process environment.
    pub fn new() -> Self {
        Self::with_env(StdEnv)
    }

    /// Create a handler reading from the given environment source.
    pub fn with_env(env: impl EnvSource + 'static) -> Self {
        Self { env: Box::new(env) }
    }
}

impl Default for TemplatedYamlFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatHandler for TemplatedYamlFormat {
    fn extensions(&self) -> &[&str] {
        &["yml.tpl", "yaml.tpl"]
    }

    fn parse(&self, contents: &str) -> Result<ConfigValue, FormatError> {
        let substituted =
            substitute(contents, &*self.env).map_err(|e| FormatError::new(e.to_string()))?;
        YamlFormat.parse(&substituted)
    }
}
