//! Runtime configuration

use super::setup;
use anyscript::{Any, Config, Error, ObjectRef, gc};

#[test]
fn test_apply_sets_gc_threshold() {
    setup();
    let config = Config::from_json(r#"{"gc_threshold": 123}"#);
    let Ok(config) = config else {
        panic!("valid config rejected");
    };
    config.apply();
    assert_eq!(gc::gc_threshold(), 123);
}

#[test]
fn test_apply_sets_display_depth() {
    setup();
    let inner = ObjectRef::new_object();
    inner.assign_field("deep", Any::from(1));
    let outer = ObjectRef::new_object();
    outer.assign_field("inner", Any::Object(inner));
    outer.assign_field("list", Any::from(vec![Any::from(1)]));

    Config {
        max_display_depth: 1,
        ..Config::default()
    }
    .apply();
    assert_eq!(
        Any::Object(outer.clone()).to_string(),
        "{ inner: [Object], list: [Array] }"
    );

    Config::default().apply();
    assert_eq!(
        Any::Object(outer).to_string(),
        "{ inner: { deep: 1 }, list: [1] }"
    );
}

#[test]
fn test_invalid_config_is_reported() {
    setup();
    assert!(matches!(
        Config::from_json(r#"{"gc_threshold": -1}"#),
        Err(Error::Config(_))
    ));
    assert!(matches!(
        Config::from_lookup(|_| Some("x".into())),
        Err(Error::Config(_))
    ));
}
