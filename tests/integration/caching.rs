//! Cache behavior under the three policies.

use calque::{ConfigError, ConfigValue};

use crate::common::TestRoot;

#[test]
fn test_lookups_are_cached_by_default() {
    let root = TestRoot::new();
    root.write("values.yml", "foo: 1\n");

    let config = root.config(|_| {});
    assert_eq!(
        config.get("values").unwrap().get("foo").unwrap(),
        &ConfigValue::Integer(1)
    );

    root.write("values.yml", "foo: bar\n");
    assert_eq!(
        config.get("values").unwrap().get("foo").unwrap(),
        &ConfigValue::Integer(1),
        "second lookup must serve the cached value, not re-read the file"
    );
}

#[test]
fn test_always_reload_rereads_on_each_access() {
    let root = TestRoot::new();
    root.write("values.yml", "foo: 1\n");

    let config = root.config(|c| {
        c.always_reload(true);
    });
    assert_eq!(
        config.get("values").unwrap().get("foo").unwrap(),
        &ConfigValue::Integer(1)
    );

    root.write("values.yml", "foo: bar\n");
    assert_eq!(
        config.get("values").unwrap().get("foo").unwrap(),
        &ConfigValue::String("bar".to_owned())
    );
}

#[test]
fn test_preload_caches_every_discoverable_key() {
    let root = TestRoot::new();
    root.write("values.yml", "foo: 1\n");
    root.write("prod/values.yml", "foo: 2\n");
    root.write("prod/prod_only.yml", "bar: baz\n");

    let config = root.config(|c| {
        c.define_overlay("default", None);
        c.define_overlay("environment", Some("prod"));
        c.preload(true);
    });

    let mut cached = config.cached_keys();
    cached.sort();
    assert_eq!(cached, vec!["prod_only", "values"]);

    // Everything was loaded at build time; later changes are invisible.
    root.write("prod/values.yml", "foo: 3\n");
    root.write("prod_only.yml", "bar: quux\n");

    assert_eq!(
        config.get("values").unwrap().get("foo").unwrap(),
        &ConfigValue::Integer(2)
    );
    assert_eq!(
        config.get("prod_only").unwrap().get("bar").unwrap(),
        &ConfigValue::String("baz".to_owned())
    );
}

#[test]
fn test_preload_composes_with_always_reload() {
    let root = TestRoot::new();
    root.write("values.yml", "foo: 1\n");

    let config = root.config(|c| {
        c.preload(true);
        c.always_reload(true);
    });
    assert_eq!(
        config.get("values").unwrap().get("foo").unwrap(),
        &ConfigValue::Integer(1)
    );

    root.write("values.yml", "foo: 2\n");
    assert_eq!(
        config.get("values").unwrap().get("foo").unwrap(),
        &ConfigValue::Integer(2),
        "always_reload still reloads even when preloaded"
    );
}

#[test]
fn test_missing_key_raises_file_not_found() {
    let root = TestRoot::new();
    let config = root.config(|_| {});

    let err = config.get("values").unwrap_err();
    assert!(matches!(err, ConfigError::FileNotFound { ref key } if key == "values"));
    assert_eq!(err.to_string(), "can't find config files for key `values`");
}

#[test]
fn test_debug_reports_cached_keys_sorted() {
    let root = TestRoot::new();
    root.write("values.yml", "foo: 1\n");
    root.write("wtf.yml", "bar: 2\n");

    let config = root.config(|_| {});
    assert_eq!(format!("{config:?}"), "Calque (empty)");

    config.get("wtf").unwrap();
    config.get("values").unwrap();
    assert_eq!(format!("{config:?}"), "Calque (2 keys): values wtf");
}
