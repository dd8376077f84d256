//! Script value representation
//!
//! The core `Any` type: inline scalars plus a shared reference to a heap
//! object. Arithmetic lives in `ops`, equality/ordering/hashing in `compare`,
//! and coercions in `convert`.

use crate::function::FunctionBody;
use crate::object::{ObjectKind, ObjectRef};
use crate::prelude::*;

/// Trait for types that have cheap (O(1), reference-counted) clones.
///
/// This makes it explicit at a call site that a clone only bumps a
/// reference count (`ObjectRef`, `Str`, `Environment`).
pub trait CheapClone: Clone {
    /// Create a cheap (reference-counted) clone of this value.
    fn cheap_clone(&self) -> Self {
        self.clone()
    }
}

impl<T: ?Sized> CheapClone for Rc<T> {}

/// A script value
#[derive(Clone, Default)]
pub enum Any {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    /// String, Array, Function or generic Object, discriminated by the
    /// referenced object's own kind
    Object(ObjectRef),
}

impl Any {
    pub const UNDEFINED: Any = Any::Undefined;
    pub const NULL: Any = Any::Null;

    pub fn is_undefined(&self) -> bool {
        matches!(self, Any::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Any::Null)
    }

    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self, Any::Null | Any::Undefined)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Any::Boolean(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Any::Integer(_))
    }

    pub fn is_double(&self) -> bool {
        matches!(self, Any::Double(_))
    }

    /// Null and booleans count as numbers (0, 0/1) for arithmetic purposes
    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Any::Null | Any::Boolean(_) | Any::Integer(_) | Any::Double(_)
        )
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Any::Object(_))
    }

    /// Kind of the referenced heap object, if any
    pub fn object_kind(&self) -> Option<ObjectKind> {
        match self {
            Any::Object(obj) => Some(obj.kind()),
            _ => None,
        }
    }

    pub fn is_string(&self) -> bool {
        self.object_kind() == Some(ObjectKind::String)
    }

    pub fn is_array(&self) -> bool {
        self.object_kind() == Some(ObjectKind::Array)
    }

    pub fn is_function(&self) -> bool {
        self.object_kind() == Some(ObjectKind::Function)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Any::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Text of a string value
    pub fn as_str(&self) -> Option<Str> {
        self.as_object().and_then(|obj| obj.string_text())
    }

    /// Result of the `typeof` operator
    pub fn type_to_string(&self) -> &'static str {
        match self {
            Any::Undefined => "undefined",
            Any::Null => "null",
            Any::Boolean(_) => "boolean",
            Any::Integer(_) => "integer",
            Any::Double(_) => "double",
            Any::Object(obj) => match obj.kind() {
                ObjectKind::String => "string",
                ObjectKind::Array => "array",
                ObjectKind::Function => "function",
                ObjectKind::Object => "object",
            },
        }
    }

    /// Truthiness
    pub fn to_bool(&self) -> bool {
        match self {
            Any::Undefined | Any::Null => false,
            Any::Boolean(b) => *b,
            Any::Integer(i) => *i != 0,
            Any::Double(d) => *d != 0.0 && !d.is_nan(),
            Any::Object(obj) => match obj.string_text() {
                Some(text) => !text.is_empty(),
                None => true,
            },
        }
    }

    /// Display form used for string coercion
    pub fn to_str(&self) -> Str {
        match self.as_str() {
            Some(text) => text,
            None => Str::from(self.to_string()),
        }
    }
}

/// Format a double the way scripts see it
pub fn format_double(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

thread_local! {
    static MAX_DISPLAY_DEPTH: Cell<usize> = const { Cell::new(DEFAULT_MAX_DISPLAY_DEPTH) };
}

/// Nesting depth past which display stops descending into objects
pub const DEFAULT_MAX_DISPLAY_DEPTH: usize = 8;

pub(crate) fn set_max_display_depth(depth: usize) {
    MAX_DISPLAY_DEPTH.with(|d| d.set(depth));
}

/// Renders values while tracking the objects currently being printed.
struct Printer {
    visiting: Vec<usize>,
    max_depth: usize,
}

impl Printer {
    fn new() -> Self {
        Self {
            visiting: Vec::new(),
            max_depth: MAX_DISPLAY_DEPTH.with(|d| d.get()),
        }
    }

    fn write(&mut self, f: &mut fmt::Formatter<'_>, value: &Any, nested: bool) -> fmt::Result {
        match value {
            Any::Undefined => write!(f, "undefined"),
            Any::Null => write!(f, "null"),
            Any::Boolean(b) => write!(f, "{}", b),
            Any::Integer(i) => write!(f, "{}", i),
            Any::Double(d) => write!(f, "{}", format_double(*d)),
            Any::Object(obj) => self.write_object(f, obj, nested),
        }
    }

    fn write_object(
        &mut self,
        f: &mut fmt::Formatter<'_>,
        obj: &ObjectRef,
        nested: bool,
    ) -> fmt::Result {
        if let Some(text) = obj.string_text() {
            return if nested {
                write!(f, "{:?}", text.as_str())
            } else {
                write!(f, "{}", text)
            };
        }
        if let Some(func) = obj.borrow().as_function() {
            return write_function(f, func);
        }
        if self.visiting.contains(&obj.id()) {
            return write!(f, "[Circular]");
        }
        let is_array = obj.kind() == ObjectKind::Array;
        if self.visiting.len() >= self.max_depth {
            return write!(f, "{}", if is_array { "[Array]" } else { "[Object]" });
        }

        self.visiting.push(obj.id());
        let result = if is_array {
            let elements = obj.elements().unwrap_or_default();
            self.write_array(f, &elements)
        } else {
            let entries: Vec<(Str, Any)> = obj
                .fields()
                .iter()
                .map(|(k, v)| (k.cheap_clone(), v.clone()))
                .collect();
            self.write_fields(f, &entries)
        };
        self.visiting.pop();
        result
    }

    fn write_array(&mut self, f: &mut fmt::Formatter<'_>, elements: &[Any]) -> fmt::Result {
        write!(f, "[")?;
        for (i, elem) in elements.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            self.write(f, elem, true)?;
        }
        write!(f, "]")
    }

    fn write_fields(&mut self, f: &mut fmt::Formatter<'_>, entries: &[(Str, Any)]) -> fmt::Result {
        if entries.is_empty() {
            return write!(f, "{{}}");
        }
        write!(f, "{{")?;
        for (i, (key, value)) in entries.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, " {}: ", key)?;
            self.write(f, value, true)?;
        }
        write!(f, " }}")
    }
}

fn write_function(f: &mut fmt::Formatter<'_>, func: &crate::function::Function) -> fmt::Result {
    if func.is_constructor() {
        return write!(f, "class {} {{ ... }}", func.name());
    }
    write!(f, "function {}(", func.name())?;
    for (i, param) in func.parameter_names().iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", param)?;
    }
    match func.body() {
        FunctionBody::Native(_) => write!(f, ") {{ [native code] }}"),
        FunctionBody::Interpreted(_) | FunctionBody::Compiled(_) => write!(f, ") {{ ... }}"),
    }
}

impl fmt::Display for Any {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Printer::new().write(f, self, false)
    }
}

impl fmt::Debug for Any {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Printer::new().write(f, self, true)
    }
}

// Conversions from Rust types

impl From<bool> for Any {
    fn from(b: bool) -> Self {
        Any::Boolean(b)
    }
}

impl From<i64> for Any {
    fn from(n: i64) -> Self {
        Any::Integer(n)
    }
}

impl From<i32> for Any {
    fn from(n: i32) -> Self {
        Any::Integer(i64::from(n))
    }
}

impl From<u32> for Any {
    fn from(n: u32) -> Self {
        Any::Integer(i64::from(n))
    }
}

impl From<usize> for Any {
    fn from(n: usize) -> Self {
        match i64::try_from(n) {
            Ok(i) => Any::Integer(i),
            Err(_) => Any::Double(n as f64),
        }
    }
}

impl From<f64> for Any {
    fn from(n: f64) -> Self {
        Any::Double(n)
    }
}

impl From<&str> for Any {
    fn from(s: &str) -> Self {
        Any::Object(ObjectRef::new_string(s))
    }
}

impl From<String> for Any {
    fn from(s: String) -> Self {
        Any::Object(ObjectRef::new_string(s))
    }
}

impl From<Str> for Any {
    fn from(s: Str) -> Self {
        Any::Object(ObjectRef::new_string(s))
    }
}

impl From<ObjectRef> for Any {
    fn from(obj: ObjectRef) -> Self {
        Any::Object(obj)
    }
}

/// A null object reference degrades to `Null`
impl From<Option<ObjectRef>> for Any {
    fn from(obj: Option<ObjectRef>) -> Self {
        match obj {
            Some(obj) => Any::Object(obj),
            None => Any::Null,
        }
    }
}

impl From<Vec<Any>> for Any {
    fn from(elements: Vec<Any>) -> Self {
        Any::Object(ObjectRef::new_array(elements))
    }
}

/// Immutable reference-counted text used for string contents and keys
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Str(Rc<str>);

// Str wraps Rc<str>, so clone is cheap (just reference count increment)
impl CheapClone for Str {}

impl Str {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in UTF-8 bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn ptr_eq(a: &Str, b: &Str) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl Default for Str {
    fn default() -> Self {
        Str::from("")
    }
}

impl AsRef<str> for Str {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for Str {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::ops::Deref for Str {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Str {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for Str {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl From<&str> for Str {
    fn from(s: &str) -> Self {
        Str(s.into())
    }
}

impl From<String> for Str {
    fn from(s: String) -> Self {
        Str(s.into())
    }
}

impl From<&String> for Str {
    fn from(s: &String) -> Self {
        Str(s.as_str().into())
    }
}

impl fmt::Debug for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for Str {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &*self.0)
    }
}
