//! Deep merging of configuration values.
//!
//! This is the precedence rule of the whole library: when two files define
//! the same key, the later file's value is merged *onto* the earlier one.
//! Objects merge key by key, recursively. Everything else (scalars, arrays,
//! nulls, and any object/non-object pairing) is replaced wholesale by the
//! incoming value. Arrays are never concatenated or merged element-wise.

use crate::value::{ConfigValue, Object};

/// Merge `incoming` onto `base`, returning the combined value.
///
/// Only an object merged onto an object combines; every other pairing
/// resolves to `incoming`. Key order is preserved: keys already present in
/// `base` keep their position, keys only present in `incoming` are appended
/// in their own order.
///
/// # Example
///
/// ```rust
/// use calque::{deep_merge, ConfigValue, Object};
///
/// let base: Object = [
///     ("bar".to_string(), ConfigValue::from(1)),
///     ("baz".to_string(), ConfigValue::from(2)),
/// ]
/// .into_iter()
/// .collect();
/// let incoming: Object = [("baz".to_string(), ConfigValue::from(3))]
///     .into_iter()
///     .collect();
///
/// let merged = deep_merge(base.into(), incoming.into());
/// assert_eq!(merged.get("bar"), Some(&ConfigValue::Integer(1)));
/// assert_eq!(merged.get("baz"), Some(&ConfigValue::Integer(3)));
/// ```
pub fn deep_merge(base: ConfigValue, incoming: ConfigValue) -> ConfigValue {
    match (base, incoming) {
        (ConfigValue::Object(base), ConfigValue::Object(incoming)) => {
            ConfigValue::Object(merge_objects(base, incoming))
        }
        (_, incoming) => incoming,
    }
}

fn merge_objects(base: Object, incoming: Object) -> Object {
    let mut merged = base.into_map();
    for (key, value) in incoming.into_map() {
        match merged.get_mut(&key) {
            Some(existing) => {
                let previous = std::mem::replace(existing, ConfigValue::Null);
                *existing = deep_merge(previous, value);
            }
            None => {
                merged.insert(key, value);
            }
        }
    }
    merged.into()
}
