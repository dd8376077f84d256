//! Heap objects
//!
//! `HeapObject` is the prototype-chained property bag shared by every
//! object-category value. Arrays, strings and functions are the same
//! structure with an `exotic` payload that overrides the `length` pseudo
//! field or makes the object callable.

use tracing::{trace, warn};

use crate::engine::Engine;
use crate::error::Error;
use crate::function::Function;
use crate::gc::{self, Reset, Traceable};
use crate::prelude::*;
use crate::realm;
use crate::string::StringData;
use crate::value::{Any, CheapClone, Str};

/// Reserved key that reads and rebinds the prototype link
pub const PROTO_KEY: &str = "__proto__";

/// Concrete kind of a heap object, the discriminant behind `Any::Object`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Object,
    Array,
    String,
    Function,
}

/// Exotic object behavior
pub enum Exotic {
    /// Ordinary object
    Ordinary,
    /// Array backing store; `length` is the vector length
    Array(Vec<Any>),
    /// Immutable string contents
    String(StringData),
    /// Callable
    Function(Function),
}

/// A script object
pub struct HeapObject {
    /// Display/debug name ("Object", "Array", a class name, ...)
    kind: Str,
    /// Prototype link
    prototype: Option<ObjectRef>,
    /// Plain enumerable fields
    fields: IndexMap<Str, Any>,
    getters: FxHashMap<Str, ObjectRef>,
    setters: FxHashMap<Str, ObjectRef>,
    /// Host object bridged into the script world
    native: Option<Rc<dyn core::any::Any>>,
    pub(crate) exotic: Exotic,
}

impl HeapObject {
    /// Create an ordinary object with the given prototype
    pub fn new(kind: impl Into<Str>, prototype: Option<ObjectRef>) -> Self {
        Self {
            kind: kind.into(),
            prototype,
            fields: index_map_new(),
            getters: FxHashMap::default(),
            setters: FxHashMap::default(),
            native: None,
            exotic: Exotic::Ordinary,
        }
    }

    pub(crate) fn with_exotic(
        kind: impl Into<Str>,
        prototype: Option<ObjectRef>,
        exotic: Exotic,
    ) -> Self {
        let mut obj = Self::new(kind, prototype);
        obj.exotic = exotic;
        obj
    }

    pub fn kind(&self) -> ObjectKind {
        match self.exotic {
            Exotic::Ordinary => ObjectKind::Object,
            Exotic::Array(_) => ObjectKind::Array,
            Exotic::String(_) => ObjectKind::String,
            Exotic::Function(_) => ObjectKind::Function,
        }
    }

    /// Display name, not a type tag
    pub fn class_name(&self) -> &Str {
        &self.kind
    }

    pub fn set_class_name(&mut self, kind: impl Into<Str>) {
        self.kind = kind.into();
    }

    pub fn prototype(&self) -> Option<&ObjectRef> {
        self.prototype.as_ref()
    }

    pub fn fields(&self) -> &IndexMap<Str, Any> {
        &self.fields
    }

    pub fn fields_mut(&mut self) -> &mut IndexMap<Str, Any> {
        &mut self.fields
    }

    pub fn get_own_field(&self, name: &str) -> Option<&Any> {
        self.fields.get(name)
    }

    pub fn has_own_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn insert_field(&mut self, name: impl Into<Str>, value: Any) {
        self.fields.insert(name.into(), value);
    }

    pub fn own_getter(&self, name: &str) -> Option<&ObjectRef> {
        self.getters.get(name)
    }

    pub fn own_setter(&self, name: &str) -> Option<&ObjectRef> {
        self.setters.get(name)
    }

    pub fn as_function(&self) -> Option<&Function> {
        match &self.exotic {
            Exotic::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_function_mut(&mut self) -> Option<&mut Function> {
        match &mut self.exotic {
            Exotic::Function(func) => Some(func),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Any>> {
        match &self.exotic {
            Exotic::Array(elements) => Some(elements),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Any>> {
        match &mut self.exotic {
            Exotic::Array(elements) => Some(elements),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&StringData> {
        match &self.exotic {
            Exotic::String(data) => Some(data),
            _ => None,
        }
    }

    /// Value of a pseudo field computed from the exotic payload
    fn synthetic_field(&self, name: &str) -> Option<Any> {
        if name != "length" {
            return None;
        }
        match &self.exotic {
            Exotic::Array(elements) => Some(Any::from(elements.len())),
            Exotic::String(data) => Some(Any::from(data.utf16_len())),
            Exotic::Ordinary | Exotic::Function(_) => None,
        }
    }
}

impl Traceable for HeapObject {
    fn trace(&self, visit: &mut dyn FnMut(usize)) {
        if let Some(proto) = &self.prototype {
            visit(proto.id());
        }
        for value in self.fields.values() {
            value.trace(visit);
        }
        for func in self.getters.values().chain(self.setters.values()) {
            visit(func.id());
        }
        match &self.exotic {
            Exotic::Array(elements) => {
                for elem in elements {
                    elem.trace(visit);
                }
            }
            Exotic::Function(func) => func.trace(visit),
            Exotic::Ordinary | Exotic::String(_) => {}
        }
    }
}

impl Reset for HeapObject {
    fn reset(&mut self) -> Self {
        core::mem::replace(self, HeapObject::new("Object", None))
    }
}

/// Shared handle to a heap object
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<HeapObject>>);

// ObjectRef wraps Rc, so clone is cheap
impl CheapClone for ObjectRef {}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for ObjectRef {}

impl core::hash::Hash for ObjectRef {
    fn hash<H: core::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", Any::Object(self.cheap_clone()))
    }
}

impl ObjectRef {
    /// Allocate a heap object and register it with the cycle collector
    pub fn alloc(object: HeapObject) -> Self {
        let rc = Rc::new(RefCell::new(object));
        gc::track_object(&rc);
        ObjectRef(rc)
    }

    /// New ordinary object linked to the root prototype
    pub fn new_object() -> Self {
        Self::alloc(HeapObject::new("Object", Some(realm::object_prototype())))
    }

    /// New ordinary object with an explicit (possibly null) prototype
    pub fn with_prototype(kind: impl Into<Str>, prototype: Option<ObjectRef>) -> Self {
        Self::alloc(HeapObject::new(kind, prototype))
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<HeapObject>> {
        Rc::downgrade(&self.0)
    }

    /// Borrow the inner data immutably
    pub fn borrow(&self) -> Ref<'_, HeapObject> {
        self.0.borrow()
    }

    /// Borrow the inner data mutably
    pub fn borrow_mut(&self) -> RefMut<'_, HeapObject> {
        self.0.borrow_mut()
    }

    /// Identity of the referenced object
    pub fn id(&self) -> usize {
        rc_addr(&self.0)
    }

    /// Check if two handles refer to the same object
    pub fn ptr_eq(a: &ObjectRef, b: &ObjectRef) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    pub fn kind(&self) -> ObjectKind {
        self.borrow().kind()
    }

    pub fn class_name(&self) -> Str {
        self.borrow().kind.cheap_clone()
    }

    pub fn prototype(&self) -> Option<ObjectRef> {
        self.borrow().prototype.clone()
    }

    /// Rebind the prototype link, refusing links that would close a cycle
    pub fn set_prototype(&self, prototype: Option<ObjectRef>) -> Result<(), Error> {
        if let Some(proto) = &prototype {
            if self.chain_contains(proto) {
                return Err(Error::PrototypeCycle);
            }
        }
        self.borrow_mut().prototype = prototype;
        Ok(())
    }

    /// Whether `self` appears on the prototype chain starting at `start`
    fn chain_contains(&self, start: &ObjectRef) -> bool {
        let mut current = Some(start.cheap_clone());
        while let Some(obj) = current {
            if ObjectRef::ptr_eq(&obj, self) {
                return true;
            }
            current = obj.prototype();
        }
        false
    }

    /// Read a plain field, walking the prototype chain. Never calls getters.
    pub fn lookup_field(&self, name: &str) -> Any {
        if name == PROTO_KEY {
            return Any::from(self.prototype());
        }
        let mut current = self.cheap_clone();
        loop {
            let next = {
                let obj = current.borrow();
                if let Some(value) = obj.synthetic_field(name) {
                    return value;
                }
                if let Some(value) = obj.fields.get(name) {
                    return value.clone();
                }
                match &obj.prototype {
                    Some(proto) => proto.cheap_clone(),
                    None => return Any::Undefined,
                }
            };
            current = next;
        }
    }

    /// Write a plain field on this object (never on an ancestor)
    pub fn assign_field(&self, name: &str, value: Any) {
        if name == PROTO_KEY {
            let prototype = match value {
                Any::Object(proto) => Some(proto),
                Any::Null => None,
                _ => return,
            };
            if self.set_prototype(prototype).is_err() {
                warn!(object = %self.class_name(), "ignoring cyclic __proto__ assignment");
            }
            return;
        }
        if name == "length" && self.kind() == ObjectKind::Array {
            if !self.assign_array_length(&value) {
                trace!(value = %value, "ignoring invalid array length");
            }
            return;
        }
        self.borrow_mut().fields.insert(Str::from(name), value);
    }

    pub fn has_own_field(&self, name: &str) -> bool {
        self.borrow().fields.contains_key(name)
    }

    pub fn remove_field(&self, name: &str) -> Option<Any> {
        self.borrow_mut().fields.shift_remove(name)
    }

    /// Field names in insertion order; getters and setters are not included
    pub fn keys(&self) -> Vec<Str> {
        self.borrow().fields.keys().cloned().collect()
    }

    /// Direct access to the field dictionary for enumeration
    pub fn fields(&self) -> Ref<'_, IndexMap<Str, Any>> {
        Ref::map(self.borrow(), |obj| &obj.fields)
    }

    pub fn fields_mut(&self) -> RefMut<'_, IndexMap<Str, Any>> {
        RefMut::map(self.borrow_mut(), |obj| &mut obj.fields)
    }

    pub fn add_getter_property(&self, name: impl Into<Str>, getter: ObjectRef) {
        self.borrow_mut().getters.insert(name.into(), getter);
    }

    pub fn add_setter_property(&self, name: impl Into<Str>, setter: ObjectRef) {
        self.borrow_mut().setters.insert(name.into(), setter);
    }

    /// First getter for `name` along the prototype chain
    pub fn find_getter(&self, name: &str) -> Option<ObjectRef> {
        self.find_accessor(|obj| obj.getters.get(name).cloned())
    }

    /// First setter for `name` along the prototype chain
    pub fn find_setter(&self, name: &str) -> Option<ObjectRef> {
        self.find_accessor(|obj| obj.setters.get(name).cloned())
    }

    fn find_accessor(&self, pick: impl Fn(&HeapObject) -> Option<ObjectRef>) -> Option<ObjectRef> {
        let mut current = Some(self.cheap_clone());
        while let Some(obj) = current {
            let next = {
                let data = obj.borrow();
                if let Some(found) = pick(&data) {
                    return Some(found);
                }
                data.prototype.clone()
            };
            current = next;
        }
        None
    }

    pub fn has_getter(&self, name: &str) -> bool {
        self.find_getter(name).is_some()
    }

    pub fn has_setter(&self, name: &str) -> bool {
        self.find_setter(name).is_some()
    }

    /// Invoke the getter for `name` with `this` bound to this object.
    ///
    /// Returns `Undefined` when no getter exists on the chain.
    pub fn lookup_property(&self, engine: &mut dyn Engine, name: &str) -> Result<Any, Error> {
        match self.find_getter(name) {
            Some(getter) => getter.call(engine, &Any::Object(self.cheap_clone()), &[]),
            None => Ok(Any::Undefined),
        }
    }

    /// Invoke the setter for `name` with `this` bound to this object and the
    /// value as sole argument. No-op when no setter exists on the chain.
    pub fn assign_property(
        &self,
        engine: &mut dyn Engine,
        name: &str,
        value: Any,
    ) -> Result<(), Error> {
        if let Some(setter) = self.find_setter(name) {
            setter.call(engine, &Any::Object(self.cheap_clone()), &[value])?;
        }
        Ok(())
    }

    /// Read `name`, preferring a getter over a plain field
    pub fn get(&self, engine: &mut dyn Engine, name: &str) -> Result<Any, Error> {
        if self.has_getter(name) {
            self.lookup_property(engine, name)
        } else {
            Ok(self.lookup_field(name))
        }
    }

    /// Write `name`, preferring a setter over a plain field
    pub fn set(&self, engine: &mut dyn Engine, name: &str, value: Any) -> Result<(), Error> {
        if self.has_setter(name) {
            self.assign_property(engine, name, value)
        } else {
            self.assign_field(name, value);
            Ok(())
        }
    }

    /// Attach a host object
    pub fn set_native_payload<T: 'static>(&self, payload: T) {
        self.borrow_mut().native = Some(Rc::new(payload));
    }

    /// Attach an already shared host object
    pub fn set_native_payload_rc(&self, payload: Rc<dyn core::any::Any>) {
        self.borrow_mut().native = Some(payload);
    }

    /// Typed access to the host object; `None` if absent or of another type
    pub fn native_payload<T: 'static>(&self) -> Option<Rc<T>> {
        let payload = self.borrow().native.clone()?;
        payload.downcast::<T>().ok()
    }

    pub fn has_native_payload(&self) -> bool {
        self.borrow().native.is_some()
    }

    pub fn clear_native_payload(&self) -> Option<Rc<dyn core::any::Any>> {
        self.borrow_mut().native.take()
    }
}

impl Any {
    pub(crate) fn trace(&self, visit: &mut dyn FnMut(usize)) {
        if let Any::Object(obj) = self {
            visit(obj.id());
        }
    }

    /// Field read on an object-category value; `Undefined` otherwise
    pub fn lookup_field(&self, name: &str) -> Any {
        match self {
            Any::Object(obj) => obj.lookup_field(name),
            _ => Any::Undefined,
        }
    }

    /// Field write on an object-category value; ignored otherwise
    pub fn assign_field(&self, name: &str, value: Any) {
        if let Any::Object(obj) = self {
            obj.assign_field(name, value);
        }
    }
}
