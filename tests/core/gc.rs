//! Cycle collection through the public API
//!
//! Liveness is observed through a native payload that flips a flag when
//! dropped, which happens exactly when its owning object is reclaimed.

use super::{ScriptBody, setup};
use anyscript::{Any, Environment, ObjectRef, gc};
use std::cell::Cell;
use std::rc::Rc;

struct DropFlag(Rc<Cell<bool>>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.set(true);
    }
}

fn watch(obj: &ObjectRef) -> Rc<Cell<bool>> {
    let dropped = Rc::new(Cell::new(false));
    obj.set_native_payload(DropFlag(dropped.clone()));
    dropped
}

fn noop(_: &Environment, _: &Any) -> Any {
    Any::Undefined
}

#[test]
fn test_two_object_cycle_is_reclaimed() {
    setup();
    let a = ObjectRef::new_object();
    let b = ObjectRef::new_object();
    a.assign_field("ref", Any::Object(b.clone()));
    b.assign_field("ref", Any::Object(a.clone()));
    let a_dropped = watch(&a);
    let b_dropped = watch(&b);

    drop(a);
    drop(b);
    gc::collect();

    assert!(a_dropped.get());
    assert!(b_dropped.get());
}

#[test]
fn test_cycle_held_by_host_survives() {
    setup();
    let a = ObjectRef::new_object();
    let b = ObjectRef::new_object();
    a.assign_field("ref", Any::Object(b.clone()));
    b.assign_field("ref", Any::Object(a.clone()));
    b.assign_field("value", Any::from("kept"));
    let b_dropped = watch(&b);
    drop(b);

    gc::collect();
    gc::collect();

    assert!(!b_dropped.get());
    assert_eq!(a.lookup_field("ref").lookup_field("value").to_string(), "kept");
}

#[test]
fn test_function_prototype_constructor_cycle_is_reclaimed() {
    setup();
    let f = ObjectRef::new_native_function("C", |_, _, _, _| Any::Undefined);
    let dropped = watch(&f);
    drop(f);

    gc::collect();
    assert!(dropped.get());
}

#[test]
fn test_closure_environment_cycle_is_reclaimed() {
    setup();
    let env = Environment::new();
    let f = ObjectRef::new_interpreted_function(
        "recurse",
        Vec::<&str>::new(),
        Rc::new(ScriptBody(noop)),
        env.clone(),
    );
    env.define("recurse", Any::Object(f.clone()), false);
    let dropped = watch(&f);

    drop(f);
    gc::collect();
    assert!(!dropped.get(), "reachable through a live environment");

    drop(env);
    gc::collect();
    assert!(dropped.get());
}

#[test]
fn test_many_cycles_do_not_leak() {
    setup();
    gc::collect();
    let baseline = gc::stats().live_nodes;

    for i in 0..1000 {
        let a = ObjectRef::new_object();
        let b = ObjectRef::new_object();
        a.assign_field("id", Any::from(i));
        a.assign_field("other", Any::Object(b.clone()));
        b.assign_field("other", Any::Object(a));
    }

    gc::collect();
    let overhead = gc::stats().live_nodes.saturating_sub(baseline);
    assert!(
        overhead < 200,
        "Too many nodes retained after collection: {} over baseline",
        overhead
    );
}

#[test]
fn test_threshold_controls_automatic_collection() {
    setup();
    gc::set_gc_threshold(0);
    let before = gc::stats().collections;
    for _ in 0..50 {
        let _ = ObjectRef::new_object();
    }
    assert_eq!(gc::stats().collections, before);

    gc::set_gc_threshold(5);
    for _ in 0..50 {
        let _ = ObjectRef::new_object();
    }
    assert!(gc::stats().collections >= before + 5);
    assert_eq!(gc::gc_threshold(), 5);
}
