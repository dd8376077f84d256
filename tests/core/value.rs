//! Value construction, typeof, display and conversions

use super::setup;
use anyscript::{Any, Error, ObjectKind, ObjectRef, Str};

#[test]
fn test_construction_tags() {
    setup();
    assert!(Any::default().is_undefined());
    assert!(Any::NULL.is_null());
    assert!(Any::from(None::<ObjectRef>).is_null());
    assert!(Any::from(Some(ObjectRef::new_object())).is_object());
    assert!(matches!(Any::from(7u32), Any::Integer(7)));
    assert!(matches!(Any::from(2.5), Any::Double(d) if d == 2.5));
    assert_eq!(Any::from("s").object_kind(), Some(ObjectKind::String));
    assert_eq!(Any::from(Str::from("s")).as_str().as_deref(), Some("s"));
}

#[test]
fn test_is_number_covers_null_and_booleans() {
    setup();
    for value in [Any::Null, Any::Boolean(false), Any::Integer(0), Any::Double(0.0)] {
        assert!(value.is_number(), "{value:?}");
        assert!(!value.is_object());
    }
    for value in [
        Any::from("s"),
        Any::from(Vec::new()),
        Any::Object(ObjectRef::new_object()),
        Any::Object(ObjectRef::new_native_function("f", |_, _, _, _| Any::Undefined)),
    ] {
        assert!(value.is_object(), "{value:?}");
        assert!(!value.is_number());
    }
}

#[test]
fn test_display_functions() {
    setup();
    let native = ObjectRef::new_native_function("parse", |_, _, _, _| Any::Undefined);
    assert_eq!(
        Any::Object(native).to_string(),
        "function parse() { [native code] }"
    );

    let compiled = ObjectRef::new_compiled_function("area", ["w", "h"], vec![0u8]);
    assert_eq!(Any::Object(compiled).to_string(), "function area(w, h) { ... }");
}

#[test]
fn test_display_nested_objects() {
    setup();
    let inner = ObjectRef::new_object();
    inner.assign_field("list", Any::from(vec![Any::from(1.5), Any::Undefined]));
    let outer = ObjectRef::new_object();
    outer.assign_field("inner", Any::Object(inner));
    assert_eq!(
        Any::Object(outer).to_string(),
        "{ inner: { list: [1.5, undefined] } }"
    );
}

#[test]
fn test_checked_conversion_carries_offending_value() {
    setup();
    let value = Any::from(vec![Any::from(1)]);
    match value.check_value::<f64>() {
        Err(Error::InvalidConversion { value, target }) => {
            assert!(value.is_array());
            assert_eq!(target, "f64");
        }
        other => panic!("expected InvalidConversion, got {other:?}"),
    }
    assert!(value.to_value::<f64>().is_nan());
}

#[test]
fn test_error_to_value() {
    setup();
    let thrown = Error::Thrown(Any::from(3));
    assert!(matches!(thrown.to_value(), Any::Integer(3)));

    let err = Error::not_callable(&Any::from(1));
    assert_eq!(err.to_value().to_string(), "TypeError: 1 is not a function");
}
