//! Callable construction, invocation and identity

use super::{MockVm, ScriptBody, setup};
use anyscript::{
    Any, CallKind, Environment, Error, FunctionTemplate, NativeEngine, NativeStatus, ObjectRef,
};
use std::rc::Rc;

fn sum_params(scope: &Environment, _this: &Any) -> Any {
    scope.get("a").unwrap_or_default() + scope.get("b").unwrap_or_default()
}

fn read_this(_scope: &Environment, this: &Any) -> Any {
    this.clone()
}

#[test]
fn test_copy_compiled_closures_are_equal_but_independent() {
    setup();
    let template = ObjectRef::new_compiled_function("next", Vec::<&str>::new(), b"count".to_vec());

    let env_a = Environment::new();
    env_a.define("count", Any::from(0), true);
    let env_b = Environment::new();
    env_b.define("count", Any::from(100), true);

    let (Ok(a), Ok(b)) = (template.copy_compiled(&env_a), template.copy_compiled(&env_b)) else {
        panic!("copy_compiled failed on a compiled template");
    };
    assert!(Any::Object(a.clone()) == Any::Object(b.clone()));
    assert!(!Any::Object(a.clone()).strict_equals(&Any::Object(b.clone())));

    let mut vm = MockVm::default();
    let this = Any::Undefined;
    assert!(matches!(a.call(&mut vm, &this, &[]), Ok(Any::Integer(1))));
    assert!(matches!(a.call(&mut vm, &this, &[]), Ok(Any::Integer(2))));
    assert!(matches!(b.call(&mut vm, &this, &[]), Ok(Any::Integer(101))));
    assert!(matches!(env_a.get("count"), Some(Any::Integer(2))));
    assert_eq!(vm.calls, 3);

    // Copies share the template's bytecode
    assert!(a.bytecode().zip(template.bytecode()).is_some_and(|(x, y)| Rc::ptr_eq(&x, &y)));

    // Each copy has its own prototype object
    let (pa, pb) = (a.lookup_field("prototype"), b.lookup_field("prototype"));
    assert!(!pa.strict_equals(&pb));
}

#[test]
fn test_template_must_be_bound_before_call() {
    setup();
    let template = ObjectRef::new_compiled_function("next", ["x"], b"count".to_vec());
    let mut vm = MockVm::default();
    assert!(matches!(
        template.call(&mut vm, &Any::Undefined, &[]),
        Err(Error::UnboundTemplate { function }) if function == "next"
    ));
    assert_eq!(vm.calls, 0);
}

#[test]
fn test_interpreted_function_hands_off_to_engine() {
    setup();
    let closure = Environment::new();
    let f = ObjectRef::new_interpreted_function(
        "sum",
        ["a", "b"],
        Rc::new(ScriptBody(sum_params)),
        closure,
    );
    assert_eq!(f.call_kind(), Some(CallKind::InterpretedScript));

    let mut vm = MockVm::default();
    let result = f.call(&mut vm, &Any::Undefined, &[Any::from(2), Any::from(3)]);
    assert!(matches!(result, Ok(Any::Integer(5))));

    // Without an evaluator the call is refused, not silently dropped
    let mut native_only = NativeEngine;
    assert!(matches!(
        f.call(&mut native_only, &Any::Undefined, &[]),
        Err(Error::Unsupported { kind: "interpreted", .. })
    ));
}

#[test]
fn test_bound_this_wins_over_caller_this() {
    setup();
    let f = ObjectRef::new_interpreted_function(
        "me",
        Vec::<&str>::new(),
        Rc::new(ScriptBody(read_this)),
        Environment::new(),
    );
    let target = Any::Object(ObjectRef::new_object());
    assert!(f.bind(target.clone()).is_ok());

    let mut vm = MockVm::default();
    let result = f.call(&mut vm, &Any::from("caller"), &[]);
    assert!(matches!(result, Ok(v) if v.strict_equals(&target)));

    // A second bind does not move `this`
    assert!(f.bind(Any::from("other")).is_ok());
    let result = f.call(&mut vm, &Any::Undefined, &[]);
    assert!(matches!(result, Ok(v) if v.strict_equals(&target)));
}

#[test]
fn test_is_instance_of_follows_prototype_reassignment() {
    setup();
    let c = ObjectRef::new_native_function("C", |_, _, _, _| Any::Undefined);
    let unrelated = ObjectRef::new_native_function("U", |_, _, _, _| Any::Undefined);
    let obj = Any::Object(ObjectRef::new_object());

    obj.assign_field("__proto__", c.lookup_field("prototype"));
    assert!(obj.is_instance_of(&Any::Object(c.clone())));

    obj.assign_field("__proto__", unrelated.lookup_field("prototype"));
    assert!(!obj.is_instance_of(&Any::Object(c.clone())));
    assert!(obj.is_instance_of(&Any::Object(unrelated)));

    // Inherited through a longer chain
    let derived_proto = ObjectRef::new_object();
    derived_proto.assign_field("__proto__", c.lookup_field("prototype"));
    let child = ObjectRef::with_prototype("Object", Some(derived_proto));
    assert!(child.is_instance_of(&c));

    assert!(!Any::from(1).is_instance_of(&Any::Object(c)));
}

#[test]
fn test_native_status_mapping() {
    setup();
    let mut engine = NativeEngine;
    let cases = [
        (NativeStatus::WrongArgCount, "count"),
        (NativeStatus::WrongArgType, "type"),
        (NativeStatus::ReturnIsException, "thrown"),
    ];
    for (status, label) in cases {
        let f = ObjectRef::new_native_closure(label, move |_, _, _, out| {
            *out = status;
            Any::from("message")
        });
        let result = f.call(&mut engine, &Any::Undefined, &[]);
        match (status, result) {
            (NativeStatus::WrongArgCount, Err(Error::WrongArgCount { function })) => {
                assert_eq!(function, label)
            }
            (NativeStatus::WrongArgType, Err(Error::WrongArgType { function })) => {
                assert_eq!(function, label)
            }
            (NativeStatus::ReturnIsException, Err(Error::Thrown(value))) => {
                assert_eq!(value.to_string(), "message")
            }
            (status, other) => panic!("{status:?} produced {other:?}"),
        }
    }
}

#[test]
fn test_functions_compare_by_kind_then_name() {
    setup();
    let native = Any::Object(ObjectRef::new_native_function("b", |_, _, _, _| Any::Undefined));
    let compiled = Any::Object(ObjectRef::new_compiled_function("a", ["x"], vec![1u8]));
    assert!(native < compiled);

    let x = Any::Object(ObjectRef::new_compiled_function("a", ["x"], vec![1u8]));
    let y = Any::Object(ObjectRef::new_compiled_function("b", ["x"], vec![1u8]));
    assert!(x < y);
    assert!(x == compiled);
}

#[test]
fn test_template_serde_round_trip() {
    setup();
    let template = FunctionTemplate {
        name: "Shape".into(),
        parameter_names: vec!["w".into()],
        bytecode: vec![1, 2, 3],
        is_constructor: true,
    };
    let f = ObjectRef::from_template(&template);
    assert_eq!(Any::Object(f.clone()).to_string(), "class Shape { ... }");
    assert_eq!(f.to_template(), Some(template.clone()));

    let json = serde_json::to_value(&template).ok();
    let back: Option<FunctionTemplate> = json.and_then(|j| serde_json::from_value(j).ok());
    assert_eq!(back, Some(template));

    let native = ObjectRef::new_native_function("n", |_, _, _, _| Any::Undefined);
    assert!(native.to_template().is_none());
}
