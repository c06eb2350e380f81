//! Overlay ordering and merge precedence.

use calque::ConfigValue;

use crate::common::TestRoot;

#[test]
fn test_defaults_to_no_overlay_reading_the_root() {
    let root = TestRoot::new();
    root.write("values.yml", "foo: 1\n");

    let config = root.config(|_| {});
    let values = config.get("values").unwrap();
    assert_eq!(values.get("foo").and_then(ConfigValue::as_i64), Some(1));
}

#[test]
fn test_nil_overlay_reads_from_the_root() {
    let root = TestRoot::new();
    root.write("values.yml", "foo: 1\n");

    let config = root.config(|c| {
        c.define_overlay("default", None);
    });
    let values = config.get("values").unwrap();
    assert_eq!(values.get("foo").and_then(ConfigValue::as_i64), Some(1));
}

#[test]
fn test_overlay_value_from_a_closure() {
    let root = TestRoot::new();
    root.write("prod/values.yml", "foo: 1\n");

    let config = root.config(|c| {
        c.define_overlay_with("environment", || Some("prod".to_owned()));
    });
    let values = config.get("values").unwrap();
    assert_eq!(values.get("foo").and_then(ConfigValue::as_i64), Some(1));
}

#[test]
fn test_non_object_contents_are_replaced_wholesale() {
    let root = TestRoot::new();
    root.write("some_string.yml", "foo bar baz\n");
    root.write("prod/some_string.yml", "foo bar baz quux\n");

    let config = root.config(|c| {
        c.define_overlay("default", None);
        c.define_overlay("environment", Some("prod"));
    });
    let value = config.get("some_string").unwrap();
    assert_eq!(value.as_str(), Some("foo bar baz quux"));
}

#[test]
fn test_deep_merges_object_contents_from_overlays() {
    let root = TestRoot::new();
    root.write("defaults/values.yml", "foo:\n  bar: 1\n  baz: 2\n");
    root.write("prod/values.yml", "foo:\n  baz: 3\nquux: hi!\n");

    let config = root.config(|c| {
        c.define_overlay("default", Some("defaults"));
        c.define_overlay("environment", Some("prod"));
    });

    let values = config.get("values").unwrap();
    let foo = values.get("foo").expect("foo");
    assert_eq!(foo.get("bar").and_then(ConfigValue::as_i64), Some(1));
    assert_eq!(foo.get("baz").and_then(ConfigValue::as_i64), Some(3));
    assert_eq!(
        values.get("quux").and_then(ConfigValue::as_str),
        Some("hi!")
    );
}

#[test]
fn test_nil_overlay_combines_with_a_valued_overlay() {
    let root = TestRoot::new();
    root.write("values.yml", "foo: 1\nbar: 2\n");
    root.write("prod/values.yml", "foo: 2\n");

    let config = root.config(|c| {
        c.define_overlay("default", None);
        c.define_overlay("environment", Some("prod"));
    });

    let values = config.get("values").unwrap();
    assert_eq!(values.get("foo").and_then(ConfigValue::as_i64), Some(2));
    assert_eq!(values.get("bar").and_then(ConfigValue::as_i64), Some(2));
}

#[test]
fn test_overlays_merge_in_order_of_definition() {
    let root = TestRoot::new();
    root.write("defaults/values.yml", "foo: 1\nbar: 1\nbaz: 1\n");
    root.write("prod/values.yml", "bar: 2\nbaz: 2\n");
    root.write("local/values.yml", "baz: 3\n");

    let config = root.config(|c| {
        c.define_overlay("default", Some("defaults"));
        c.define_overlay("environment", Some("prod"));
        c.define_overlay("local", Some("local"));
    });

    let values = config.get("values").unwrap();
    assert_eq!(values.get("foo").and_then(ConfigValue::as_i64), Some(1));
    assert_eq!(values.get("bar").and_then(ConfigValue::as_i64), Some(2));
    assert_eq!(values.get("baz").and_then(ConfigValue::as_i64), Some(3));
}

#[test]
fn test_combined_overlay_resolves_the_joined_directory() {
    let root = TestRoot::new();
    root.write("keys.yml", "foo: 1\n");
    root.write("prod/keys.yml", "foo: 2\n");
    root.write("prod_US/keys.yml", "foo: 3\n");

    let config = root.config(|c| {
        c.define_overlay("default", None);
        c.define_overlay("environment", Some("prod"));
        c.define_overlay("country", Some("US"));
        c.define_combined_overlay(&["environment", "country"]);
    });

    let keys = config.get("keys").unwrap();
    assert_eq!(keys.get("foo").and_then(ConfigValue::as_i64), Some(3));
}

#[test]
fn test_combined_overlay_with_unknown_name_fails_the_build() {
    let root = TestRoot::new();
    let err = root
        .try_config(|c| {
            c.define_overlay("environment", Some("prod"));
            c.define_combined_overlay(&["environment", "country"]);
        })
        .unwrap_err();
    assert!(matches!(
        err,
        calque::BuildError::UnknownOverlay { name } if name == "country"
    ));
}

#[test]
fn test_sequences_replace_rather_than_concatenate() {
    let root = TestRoot::new();
    root.write("values.yml", "servers:\n  - alpha\n  - beta\n");
    root.write("prod/values.yml", "servers:\n  - production\n");

    let config = root.config(|c| {
        c.define_overlay("default", None);
        c.define_overlay("environment", Some("prod"));
    });

    let servers = config
        .get("values")
        .unwrap()
        .get("servers")
        .and_then(|v| v.as_array().cloned())
        .expect("servers");
    assert_eq!(servers.len(), 1);
    assert_eq!(
        servers.get(0).and_then(ConfigValue::as_str),
        Some("production")
    );
}
