//! Value representation and object model for an embeddable scripting runtime
//!
//! # Example
//!
//! ```
//! use anyscript::{Any, NativeEngine, NativeStatus, ObjectRef};
//!
//! let point = ObjectRef::new_object();
//! point.assign_field("x", Any::from(1));
//! assert_eq!(point.lookup_field("x") + Any::from(2.5), Any::from(3.5));
//!
//! fn double(_: &mut dyn anyscript::Engine, _: &Any, args: &[Any], _: &mut NativeStatus) -> Any {
//!     args.first().cloned().unwrap_or_default() * Any::from(2)
//! }
//! let f = ObjectRef::new_native_function("double", double);
//! let result = f.call(&mut NativeEngine, &Any::Undefined, &[Any::from(21)]);
//! assert!(matches!(result, Ok(Any::Integer(42))));
//! ```

pub mod array;
pub mod compare;
pub mod config;
pub mod convert;
pub mod engine;
pub mod environment;
pub mod error;
pub mod function;
pub mod gc;
pub mod json;
pub mod object;
pub mod ops;
pub mod prelude;
pub mod realm;
pub mod string;
pub mod value;

pub use compare::StrictKey;
pub use config::Config;
pub use convert::{FromAny, TryFromAny};
pub use engine::{Engine, NativeEngine};
pub use environment::{Binding, Environment};
pub use error::Error;
pub use function::{
    CallKind, CompiledFunction, Function, FunctionBody, FunctionTemplate, Native, NativeClosure,
    NativeFn, NativeStatus, ScriptFunction,
};
pub use gc::GcStats;
pub use object::{HeapObject, ObjectKind, ObjectRef, PROTO_KEY};
pub use ops::{BinaryOp, UnaryOp};
pub use value::{Any, CheapClone, Str};
