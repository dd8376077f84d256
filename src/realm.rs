//! Per-thread intrinsic prototypes
//!
//! Every heap object created through the constructors in this crate links
//! to one of these. The root object prototype has a null prototype; the
//! array, string and function prototypes chain to the root.

use crate::object::{HeapObject, ObjectRef};
use crate::value::CheapClone;

struct Realm {
    object_prototype: ObjectRef,
    array_prototype: ObjectRef,
    string_prototype: ObjectRef,
    function_prototype: ObjectRef,
}

impl Realm {
    // Built from raw allocations; the public constructors consult the realm
    fn new() -> Self {
        let object_prototype = ObjectRef::alloc(HeapObject::new("Object", None));
        let derived = |kind: &str| {
            ObjectRef::alloc(HeapObject::new(kind, Some(object_prototype.cheap_clone())))
        };
        let array_prototype = derived("Array");
        let string_prototype = derived("String");
        let function_prototype = derived("Function");
        Self {
            object_prototype,
            array_prototype,
            string_prototype,
            function_prototype,
        }
    }
}

thread_local! {
    static REALM: Realm = Realm::new();
}

/// Root of every prototype chain
pub fn object_prototype() -> ObjectRef {
    REALM.with(|r| r.object_prototype.cheap_clone())
}

pub fn array_prototype() -> ObjectRef {
    REALM.with(|r| r.array_prototype.cheap_clone())
}

pub fn string_prototype() -> ObjectRef {
    REALM.with(|r| r.string_prototype.cheap_clone())
}

pub fn function_prototype() -> ObjectRef {
    REALM.with(|r| r.function_prototype.cheap_clone())
}
