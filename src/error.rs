//! Error types for the value core

use thiserror::Error;

use crate::value::{Any, Str};

/// Main error type for the value core
#[derive(Debug, Error)]
pub enum Error {
    /// A checked conversion could not produce the requested type
    #[error("InvalidConversion: cannot convert {} `{value}` to {target}", .value.type_to_string())]
    InvalidConversion { value: Any, target: &'static str },

    #[error("TypeError: {value} is not a function")]
    NotCallable { value: Any },

    #[error("TypeError: wrong number of arguments to {function}")]
    WrongArgCount { function: Str },

    #[error("TypeError: wrong type of argument to {function}")]
    WrongArgType { function: Str },

    /// A native callable returned a value to be rethrown by the caller
    #[error("Uncaught {0}")]
    Thrown(Any),

    /// The engine in use cannot run this kind of callable
    #[error("Unsupported: engine cannot invoke {kind} function {function}")]
    Unsupported { kind: &'static str, function: Str },

    #[error("TypeError: compiled function {function} has no closure environment")]
    UnboundTemplate { function: Str },

    #[error("TypeError: cyclic __proto__ value")]
    PrototypeCycle,

    #[error("ReferenceError: {name} is not defined")]
    UndefinedVariable { name: Str },

    #[error("TypeError: assignment to constant variable {name}")]
    ConstAssignment { name: Str },

    #[error("TypeError: converting circular structure to JSON")]
    CyclicStructure,

    #[error("RangeError: structure nested deeper than {limit} levels")]
    NestingTooDeep { limit: usize },

    #[error("ConfigError: {0}")]
    Config(String),
}

impl Error {
    pub fn invalid_conversion(value: &Any, target: &'static str) -> Self {
        Error::InvalidConversion {
            value: value.clone(),
            target,
        }
    }

    pub fn not_callable(value: &Any) -> Self {
        Error::NotCallable {
            value: value.clone(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Extract a script value from this error, for handing to a `catch` clause
    pub fn to_value(&self) -> Any {
        match self {
            Error::Thrown(value) => value.clone(),
            other => Any::from(other.to_string()),
        }
    }
}
