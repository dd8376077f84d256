//! Prototype chains, accessors, payloads and the array/string specializations

use super::{MockVm, setup};
use anyscript::{Any, Engine, Error, NativeEngine, NativeStatus, ObjectRef};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn test_prototype_chain_reads_until_shadowed() {
    setup();
    let b = ObjectRef::new_object();
    b.assign_field("x", Any::from(1));
    let a = ObjectRef::new_object();
    a.assign_field("__proto__", Any::Object(b.clone()));

    assert!(matches!(a.lookup_field("x"), Any::Integer(1)));
    b.assign_field("x", Any::from(2));
    assert!(matches!(a.lookup_field("x"), Any::Integer(2)));

    a.assign_field("x", Any::from(10));
    b.assign_field("x", Any::from(3));
    assert!(matches!(a.lookup_field("x"), Any::Integer(10)));
    assert!(matches!(b.lookup_field("x"), Any::Integer(3)));
}

#[test]
fn test_null_prototype_terminates_lookup() {
    setup();
    let obj = ObjectRef::new_object();
    obj.assign_field("__proto__", Any::Null);
    assert!(obj.lookup_field("toString").is_undefined());
    assert!(obj.lookup_field("__proto__").is_null());
}

fn receiver_tag(_: &mut dyn Engine, this: &Any, _: &[Any], _: &mut NativeStatus) -> Any {
    this.lookup_field("tag")
}

#[test]
fn test_getter_runs_with_original_receiver() {
    setup();
    let proto = ObjectRef::new_object();
    proto.add_getter_property("y", ObjectRef::new_native_function("y", receiver_tag));

    let middle = ObjectRef::with_prototype("Object", Some(proto.clone()));
    let o = ObjectRef::with_prototype("Object", Some(middle));
    o.assign_field("tag", Any::from("o"));

    let mut engine = NativeEngine;
    let value = o.lookup_property(&mut engine, "y");
    assert!(matches!(value, Ok(v) if v.to_string() == "o"));
    assert!(o.has_getter("y"));
    assert!(!o.has_own_field("y"));

    // Plain field lookup never consults getters
    assert!(o.lookup_field("y").is_undefined());
    assert!(matches!(o.lookup_property(&mut engine, "missing"), Ok(Any::Undefined)));
}

#[test]
fn test_setter_receives_value_and_receiver() {
    setup();
    let seen: Rc<RefCell<Vec<(String, String)>>> = Rc::default();
    let log = seen.clone();
    let setter = ObjectRef::new_native_closure("set", move |_, this, args, _| {
        let value = args.first().cloned().unwrap_or_default();
        log.borrow_mut()
            .push((this.lookup_field("tag").to_string(), value.to_string()));
        this.assign_field("stored", value);
        Any::Undefined
    });

    let proto = ObjectRef::new_object();
    proto.add_setter_property("v", setter);
    let o = ObjectRef::with_prototype("Object", Some(proto.clone()));
    o.assign_field("tag", Any::from("child"));

    let mut engine = NativeEngine;
    assert!(o.assign_property(&mut engine, "v", Any::from(5)).is_ok());
    assert_eq!(
        seen.borrow().as_slice(),
        &[("child".to_string(), "5".to_string())]
    );
    assert!(matches!(o.lookup_field("stored"), Any::Integer(5)));
    assert!(!proto.has_own_field("stored"));

    // Missing setter is a no-op
    assert!(o.assign_property(&mut engine, "nothing", Any::from(1)).is_ok());
    assert!(!o.has_own_field("nothing"));
}

#[test]
fn test_get_and_set_prefer_accessors() {
    setup();
    let obj = ObjectRef::new_object();
    obj.assign_field("plain", Any::from(1));
    obj.add_getter_property(
        "computed",
        ObjectRef::new_native_function("computed", |_, _, _, _| Any::from(99)),
    );

    let mut engine = MockVm::default();
    assert!(matches!(obj.get(&mut engine, "plain"), Ok(Any::Integer(1))));
    assert!(matches!(obj.get(&mut engine, "computed"), Ok(Any::Integer(99))));
    assert!(obj.set(&mut engine, "plain", Any::from(2)).is_ok());
    assert!(matches!(obj.lookup_field("plain"), Any::Integer(2)));
}

#[test]
fn test_getter_failure_propagates() {
    setup();
    let obj = ObjectRef::new_object();
    obj.add_getter_property(
        "bad",
        ObjectRef::new_native_function("bad", |_, _, _, status| {
            *status = NativeStatus::WrongArgType;
            Any::Undefined
        }),
    );
    let mut engine = NativeEngine;
    assert!(matches!(
        obj.lookup_property(&mut engine, "bad"),
        Err(Error::WrongArgType { .. })
    ));
}

#[test]
fn test_fields_enumerate_in_insertion_order() {
    setup();
    let obj = ObjectRef::new_object();
    for key in ["z", "a", "m"] {
        obj.assign_field(key, Any::from(key));
    }
    obj.add_getter_property("hidden", ObjectRef::new_native_function("h", receiver_tag));
    let keys: Vec<String> = obj.fields().keys().map(|k| k.to_string()).collect();
    assert_eq!(keys, vec!["z", "a", "m"]);

    assert!(obj.remove_field("a").is_some());
    assert!(!obj.has_own_field("a"));
    assert_eq!(obj.keys().len(), 2);
}

#[test]
fn test_prototype_cycles_are_rejected() {
    setup();
    let a = ObjectRef::new_object();
    let b = ObjectRef::with_prototype("Object", Some(a.clone()));
    let c = ObjectRef::with_prototype("Object", Some(b.clone()));

    assert!(matches!(a.set_prototype(Some(c.clone())), Err(Error::PrototypeCycle)));
    a.assign_field("__proto__", Any::Object(c));
    // Lookup on the chain still terminates
    assert!(b.lookup_field("anything").is_undefined());
}

#[test]
fn test_native_payload_round_trip() {
    setup();
    #[derive(Debug, PartialEq)]
    struct FileHandle {
        fd: i32,
    }

    let obj = ObjectRef::new_object();
    obj.set_native_payload(FileHandle { fd: 3 });
    assert_eq!(obj.native_payload::<FileHandle>().as_deref(), Some(&FileHandle { fd: 3 }));
    assert!(obj.native_payload::<u64>().is_none());
}

#[test]
fn test_array_length_truncates_and_extends() {
    setup();
    let arr = ObjectRef::new_array((1..=4).map(Any::from).collect());

    arr.assign_field("length", Any::from(2));
    assert_eq!(Any::Object(arr.clone()).to_string(), "[1, 2]");

    arr.assign_field("length", Any::from(5));
    assert_eq!(
        Any::Object(arr.clone()).to_string(),
        "[1, 2, undefined, undefined, undefined]"
    );
    assert!(matches!(arr.lookup_field("length"), Any::Integer(5)));

    // Other keys behave like plain fields
    arr.assign_field("name", Any::from("list"));
    assert_eq!(arr.lookup_field("name").to_string(), "list");
}

#[test]
fn test_huge_array_writes_leave_array_unchanged() {
    setup();
    let arr = ObjectRef::new_array(vec![Any::from(1), Any::from(2)]);

    for len in [Any::Integer(i64::MAX), Any::Integer(1 << 40), Any::Double(1e300)] {
        arr.assign_field("length", len);
    }
    assert!(!arr.set_index(usize::MAX, Any::Null));

    assert_eq!(Any::Object(arr.clone()).to_string(), "[1, 2]");
    assert!(!arr.has_own_field("length"));
}

#[test]
fn test_string_length_and_code_units() {
    setup();
    let s = ObjectRef::new_string("h\u{e9}\u{1F600}");
    assert!(matches!(s.lookup_field("length"), Any::Integer(4)));
    assert!(matches!(s.char_code_at(1), Any::Integer(0xe9)));
    assert!(matches!(s.char_code_at(2), Any::Integer(0xD83D)));
    assert!(matches!(s.char_code_at(10), Any::Integer(0)));
    assert_eq!(s.char_at(10).to_string(), "");
}
