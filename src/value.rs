//! Configuration value tree with an open (mutable) and a sealed (immutable)
//! container representation.
//!
//! Every resolved configuration is a [`ConfigValue`]: a tagged tree of
//! objects, arrays and scalars. Merging dispatches on the variant tag (see
//! [`crate::merge`]), never on runtime capability probing.
//!
//! When the `freeze` policy is enabled, resolved trees are *sealed*:
//! [`ConfigValue::seal`] recursively converts every container into a shared
//! immutable representation. Sealed containers reject every mutation entry
//! point with [`FrozenError`] and clone in O(1), since clones share the
//! underlying storage.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

/// The map type used for [`ConfigValue::Object`] entries.
///
/// Keys are compared as strings; iteration preserves insertion order, which
/// is also the order keys had in the source file (and the order merging
/// preserves).
pub type ObjectMap = IndexMap<String, ConfigValue>;

/// Error returned when attempting to modify a sealed (frozen) value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrozenError;

impl fmt::Display for FrozenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot modify a frozen configuration value")
    }
}

impl std::error::Error for FrozenError {}

/// A configuration value: the result of parsing one file, or of merging
/// several files for the same key.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// A null value.
    Null,
    /// A boolean value.
    Bool(bool),
    /// An integer value.
    Integer(i64),
    /// A floating-point value.
    Float(f64),
    /// A string value.
    String(String),
    /// An array of values.
    Array(Array),
    /// An object: ordered string keys mapping to nested values.
    Object(Object),
}

/// Container storage: open (inline, mutable) or sealed (shared, immutable).
///
/// Invariant: a `Sealed` container only ever holds children that are
/// themselves sealed, because the only way to produce one is through
/// `seal()`, which converts the whole subtree.
#[derive(Debug, Clone)]
enum Repr<T> {
    Open(T),
    Sealed(Arc<T>),
}

impl<T: Clone> Repr<T> {
    fn get(&self) -> &T {
        match self {
            Repr::Open(inner) => inner,
            Repr::Sealed(shared) => shared,
        }
    }

    fn into_inner(self) -> T {
        match self {
            Repr::Open(inner) => inner,
            Repr::Sealed(shared) => Arc::try_unwrap(shared).unwrap_or_else(|arc| (*arc).clone()),
        }
    }
}

// ============================================================================
// Object
// ============================================================================

/// An ordered map of string keys to configuration values.
///
/// Reads never fail. Mutations return [`FrozenError`] once the object has
/// been sealed by [`ConfigValue::seal`].
#[derive(Debug, Clone, Default)]
pub struct Object {
    repr: Repr<ObjectMap>,
}

impl<T: Default> Default for Repr<T> {
    fn default() -> Self {
        Repr::Open(T::default())
    }
}

impl Object {
    /// Create a new empty, open object.
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying map, regardless of representation.
    pub fn as_map(&self) -> &ObjectMap {
        self.repr.get()
    }

    /// Consume the object, returning an open copy of its map.
    pub fn into_map(self) -> ObjectMap {
        self.repr.into_inner()
    }

    /// Whether this object has been sealed against mutation.
    pub fn is_sealed(&self) -> bool {
        matches!(self.repr, Repr::Sealed(_))
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.as_map().get(key)
    }

    /// Whether the object contains `key`.
    pub fn contains_key(&self, key: &str) -> bool {
        self.as_map().contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.as_map().len()
    }

    /// Whether the object has no entries.
    pub fn is_empty(&self) -> bool {
        self.as_map().is_empty()
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.as_map().iter()
    }

    /// Iterate over keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.as_map().keys()
    }

    /// Insert a value, returning the previous value for the key if any.
    ///
    /// An existing key keeps its position; a new key is appended.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<ConfigValue>,
    ) -> Result<Option<ConfigValue>, FrozenError> {
        match &mut self.repr {
            Repr::Open(map) => Ok(map.insert(key.into(), value.into())),
            Repr::Sealed(_) => Err(FrozenError),
        }
    }

    /// Remove a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Result<Option<ConfigValue>, FrozenError> {
        match &mut self.repr {
            Repr::Open(map) => Ok(map.shift_remove(key)),
            Repr::Sealed(_) => Err(FrozenError),
        }
    }

    /// Mutable access to the value for `key`.
    pub fn get_mut(&mut self, key: &str) -> Result<Option<&mut ConfigValue>, FrozenError> {
        match &mut self.repr {
            Repr::Open(map) => Ok(map.get_mut(key)),
            Repr::Sealed(_) => Err(FrozenError),
        }
    }

    fn seal(self) -> Self {
        match self.repr {
            Repr::Sealed(_) => self,
            Repr::Open(map) => {
                let sealed: ObjectMap = map.into_iter().map(|(k, v)| (k, v.seal())).collect();
                Object {
                    repr: Repr::Sealed(Arc::new(sealed)),
                }
            }
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.as_map() == other.as_map()
    }
}

impl From<ObjectMap> for Object {
    fn from(map: ObjectMap) -> Self {
        Object {
            repr: Repr::Open(map),
        }
    }
}

impl FromIterator<(String, ConfigValue)> for Object {
    fn from_iter<I: IntoIterator<Item = (String, ConfigValue)>>(iter: I) -> Self {
        Object::from(iter.into_iter().collect::<ObjectMap>())
    }
}

// ============================================================================
// Array
// ============================================================================

/// An ordered sequence of configuration values.
///
/// Merging never combines arrays element-wise; a later file's array replaces
/// an earlier one wholesale.
#[derive(Debug, Clone, Default)]
pub struct Array {
    repr: Repr<Vec<ConfigValue>>,
}

impl Array {
    /// Create a new empty, open array.
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying elements, regardless of representation.
    pub fn as_slice(&self) -> &[ConfigValue] {
        self.repr.get()
    }

    /// Consume the array, returning an open copy of its elements.
    pub fn into_vec(self) -> Vec<ConfigValue> {
        self.repr.into_inner()
    }

    /// Whether this array has been sealed against mutation.
    pub fn is_sealed(&self) -> bool {
        matches!(self.repr, Repr::Sealed(_))
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> Option<&ConfigValue> {
        self.as_slice().get(index)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    /// Iterate over elements.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValue> {
        self.as_slice().iter()
    }

    /// Append an element.
    pub fn push(&mut self, value: impl Into<ConfigValue>) -> Result<(), FrozenError> {
        match &mut self.repr {
            Repr::Open(items) => {
                items.push(value.into());
                Ok(())
            }
            Repr::Sealed(_) => Err(FrozenError),
        }
    }

    /// Mutable access to the element at `index`.
    pub fn get_mut(&mut self, index: usize) -> Result<Option<&mut ConfigValue>, FrozenError> {
        match &mut self.repr {
            Repr::Open(items) => Ok(items.get_mut(index)),
            Repr::Sealed(_) => Err(FrozenError),
        }
    }

    fn seal(self) -> Self {
        match self.repr {
            Repr::Sealed(_) => self,
            Repr::Open(items) => {
                let sealed: Vec<ConfigValue> = items.into_iter().map(ConfigValue::seal).collect();
                Array {
                    repr: Repr::Sealed(Arc::new(sealed)),
                }
            }
        }
    }
}

impl PartialEq for Array {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl From<Vec<ConfigValue>> for Array {
    fn from(items: Vec<ConfigValue>) -> Self {
        Array {
            repr: Repr::Open(items),
        }
    }
}

impl FromIterator<ConfigValue> for Array {
    fn from_iter<I: IntoIterator<Item = ConfigValue>>(iter: I) -> Self {
        Array::from(iter.into_iter().collect::<Vec<_>>())
    }
}

// ============================================================================
// ConfigValue
// ============================================================================

impl ConfigValue {
    /// A short name for the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Null => "null",
            ConfigValue::Bool(_) => "bool",
            ConfigValue::Integer(_) => "integer",
            ConfigValue::Float(_) => "float",
            ConfigValue::String(_) => "string",
            ConfigValue::Array(_) => "array",
            ConfigValue::Object(_) => "object",
        }
    }

    /// Whether this is [`ConfigValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    /// The boolean payload, if this is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer payload, if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// A floating-point view of this value; integers widen losslessly.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Float(f) => Some(*f),
            ConfigValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// The array payload, if this is an array.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            ConfigValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// The object payload, if this is an object.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            ConfigValue::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Mutable object payload, if this is an object.
    ///
    /// Mutation of a sealed object still fails; the gate is on the
    /// [`Object`] mutators, not here.
    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            ConfigValue::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Mutable array payload, if this is an array.
    pub fn as_array_mut(&mut self) -> Option<&mut Array> {
        match self {
            ConfigValue::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Look up a key, if this is an object.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.as_object().and_then(|o| o.get(key))
    }

    /// Recursively convert every container in this tree to the sealed,
    /// immutable representation.
    ///
    /// Scalars need no conversion: they can only be replaced through their
    /// parent container, and sealed containers reject replacement.
    pub fn seal(self) -> Self {
        match self {
            ConfigValue::Array(a) => ConfigValue::Array(a.seal()),
            ConfigValue::Object(o) => ConfigValue::Object(o.seal()),
            scalar => scalar,
        }
    }

    /// Whether this value is sealed. Scalars are vacuously sealed: there is
    /// no in-place mutation to reject.
    pub fn is_sealed(&self) -> bool {
        match self {
            ConfigValue::Array(a) => a.is_sealed(),
            ConfigValue::Object(o) => o.is_sealed(),
            _ => true,
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Integer(value.into())
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Integer(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_owned())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<Array> for ConfigValue {
    fn from(value: Array) -> Self {
        ConfigValue::Array(value)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(value: Vec<ConfigValue>) -> Self {
        ConfigValue::Array(value.into())
    }
}

impl From<Object> for ConfigValue {
    fn from(value: Object) -> Self {
        ConfigValue::Object(value)
    }
}

impl From<ObjectMap> for ConfigValue {
    fn from(value: ObjectMap) -> Self {
        ConfigValue::Object(value.into())
    }
}
