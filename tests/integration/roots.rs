//! Multiple search roots and their precedence.

use calque::ConfigValue;

use crate::common::TestRoot;

#[test]
fn test_reads_from_multiple_roots() {
    let root = TestRoot::new();
    root.write("root1/values.yml", "foo: 1\n");
    root.write("root2/values.yml", "bar: 2\n");

    let root1 = root.path().join("root1");
    let root2 = root.path().join("root2");
    let config = calque::build(|c| {
        c.set_root(&root1);
        c.add_root(&root2);
    })
    .unwrap();

    let values = config.get("values").unwrap();
    assert_eq!(values.get("foo").and_then(ConfigValue::as_i64), Some(1));
    assert_eq!(values.get("bar").and_then(ConfigValue::as_i64), Some(2));
}

#[test]
fn test_supports_overlays_in_each_root() {
    let root = TestRoot::new();
    root.write("root1/values.yml", "foo: 1\n");
    root.write("root1/prod/values.yml", "foo: 2\n");
    root.write("root2/values.yml", "bar: 1\n");
    root.write("root2/prod/values.yml", "bar: 2\n");

    let root1 = root.path().join("root1");
    let root2 = root.path().join("root2");
    let config = calque::build(|c| {
        c.set_root(&root1);
        c.add_root(&root2);
        c.define_overlay("default", None);
        c.define_overlay("environment", Some("prod"));
    })
    .unwrap();

    let values = config.get("values").unwrap();
    assert_eq!(values.get("foo").and_then(ConfigValue::as_i64), Some(2));
    assert_eq!(values.get("bar").and_then(ConfigValue::as_i64), Some(2));
}

#[test]
fn test_later_added_roots_take_precedence() {
    let root = TestRoot::new();
    root.write("root1/values.yml", "foo: 1\n");
    root.write("root1/prod/values.yml", "foo: 2\n");
    root.write("root2/prod/values.yml", "foo: 3\n");

    let root1 = root.path().join("root1");
    let root2 = root.path().join("root2");
    let config = calque::build(|c| {
        c.set_root(&root1);
        c.add_root(&root2);
        c.define_overlay("environment", Some("prod"));
    })
    .unwrap();

    // root2 was added after root1, so root2's prod file merges last and
    // shadows root1's for the same key.
    let values = config.get("values").unwrap();
    assert_eq!(values.get("foo").and_then(ConfigValue::as_i64), Some(3));
}
