//! Sealing resolved values under the `freeze` policy.

use calque::{ConfigValue, FrozenError};

use crate::common::TestRoot;

const NESTED: &str = "\
outer:
  key: value
  array:
    - some string
    - another string
    - and: an inner object
";

#[test]
fn test_results_are_mutable_by_default() {
    let root = TestRoot::new();
    root.write("values.yml", "foo: '1'\n");

    let config = root.config(|_| {});
    let mut value = config.get("values").unwrap();
    assert!(!value.is_sealed());

    let object = value.as_object_mut().expect("object");
    object.insert("foo", "2").expect("open objects accept writes");
    assert_eq!(object.get("foo").and_then(ConfigValue::as_str), Some("2"));
}

#[test]
fn test_freeze_seals_the_result() {
    let root = TestRoot::new();
    root.write("values.yml", "foo: '1'\n");

    let config = root.config(|c| {
        c.freeze(true);
    });
    let mut value = config.get("values").unwrap();
    assert!(value.is_sealed());

    let object = value.as_object_mut().expect("object");
    assert_eq!(object.insert("foo", "2"), Err(FrozenError));
}

#[test]
fn test_freeze_seals_all_the_way_down() {
    let root = TestRoot::new();
    root.write("values.yml", NESTED);

    let config = root.config(|c| {
        c.freeze(true);
    });
    let value = config.get("values").unwrap();
    assert_deeply_sealed(&value);

    // Attempting to write into the object nested inside the array fails.
    let mut inner = value
        .get("outer")
        .and_then(|o| o.get("array"))
        .and_then(ConfigValue::as_array)
        .and_then(|a| a.get(2))
        .and_then(ConfigValue::as_object)
        .cloned()
        .expect("outer.array[2]");
    assert_eq!(inner.insert("and", "foo"), Err(FrozenError));
}

#[test]
fn test_unfrozen_results_are_open_all_the_way_down() {
    let root = TestRoot::new();
    root.write("values.yml", NESTED);

    let config = root.config(|_| {});
    let value = config.get("values").unwrap();
    let outer = value.get("outer").and_then(ConfigValue::as_object).unwrap();
    assert!(!outer.is_sealed());
    let array = outer.get("array").and_then(ConfigValue::as_array).unwrap();
    assert!(!array.is_sealed());
}

fn assert_deeply_sealed(value: &ConfigValue) {
    assert!(value.is_sealed(), "value should be sealed: {value:?}");
    match value {
        ConfigValue::Object(object) => {
            for (_, nested) in object.iter() {
                assert_deeply_sealed(nested);
            }
        }
        ConfigValue::Array(array) => {
            for nested in array.iter() {
                assert_deeply_sealed(nested);
            }
        }
        _ => {}
    }
}
