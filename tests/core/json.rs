//! JSON bridge

use super::setup;
use anyscript::{Any, Error, ObjectRef};
use serde_json::json;

#[test]
fn test_json_round_trip() {
    setup();
    let source = json!({
        "name": "widget",
        "size": [3, 4.5],
        "tags": {"a": true, "b": null},
        "big": 9007199254740993i64
    });
    let value = Any::from_json(&source);
    assert!(matches!(value.lookup_field("big"), Any::Integer(9007199254740993)));
    assert!(matches!(value.to_json(), Ok(back) if back == source));
}

#[test]
fn test_json_field_order_is_preserved() {
    setup();
    let obj = ObjectRef::new_object();
    obj.assign_field("z", Any::from(1));
    obj.assign_field("a", Any::from(2));
    let keys: Vec<String> = obj.keys().iter().map(|k| k.to_string()).collect();
    assert_eq!(keys, ["z", "a"]);
    assert!(Any::Object(obj).to_json().is_ok_and(|j| j.is_object()));
}

#[test]
fn test_json_cycle_through_array_is_an_error() {
    setup();
    let arr = ObjectRef::new_array(Vec::new());
    arr.push(Any::Object(arr.clone()));
    let result = Any::Object(arr.clone()).to_json();
    assert!(matches!(result, Err(Error::CyclicStructure)));
    arr.pop();
}

#[test]
fn test_json_scalars() {
    setup();
    assert!(matches!(Any::Undefined.to_json(), Ok(serde_json::Value::Null)));
    assert!(matches!(Any::Double(f64::INFINITY).to_json(), Ok(serde_json::Value::Null)));
    assert!(matches!(Any::from("s").to_json(), Ok(serde_json::Value::String(s)) if s == "s"));
}

#[test]
fn test_json_deep_nesting_is_an_error() {
    setup();
    let mut value = Any::from(vec![Any::Null]);
    for _ in 0..1000 {
        let obj = ObjectRef::new_object();
        obj.assign_field("child", value);
        value = Any::Object(obj);
    }
    assert!(matches!(value.to_json(), Err(Error::NestingTooDeep { .. })));
}
