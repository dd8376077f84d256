//! Execution engine boundary
//!
//! Script bodies are not run by this crate. When a callable backed by an
//! interpreted body or compiled bytecode is invoked, the call is handed to
//! the [`Engine`] passed in by the caller. Native callables receive the same
//! engine so they can call back into script code.

use crate::error::Error;
use crate::function::{CompiledFunction, ScriptFunction};
use crate::object::ObjectRef;
use crate::value::Any;

/// Evaluator or bytecode VM that runs script-defined callables.
///
/// Both methods receive the callee (so the engine can reach its fields and
/// prototype), the payload, the effective `this` (already resolved against
/// any bound value) and the arguments.
pub trait Engine {
    /// Run an interpreted body in a new scope under `script.closure`
    fn call_interpreted(
        &mut self,
        callee: &ObjectRef,
        script: &ScriptFunction,
        this: &Any,
        args: &[Any],
    ) -> Result<Any, Error> {
        let _ = (script, this, args);
        Err(Error::Unsupported {
            kind: "interpreted",
            function: callee.function_name().unwrap_or_default(),
        })
    }

    /// Run bytecode under the environment captured by `copy_compiled`
    fn call_compiled(
        &mut self,
        callee: &ObjectRef,
        compiled: &CompiledFunction,
        this: &Any,
        args: &[Any],
    ) -> Result<Any, Error> {
        let _ = (compiled, this, args);
        Err(Error::Unsupported {
            kind: "compiled",
            function: callee.function_name().unwrap_or_default(),
        })
    }
}

/// Engine for hosts that only register native callables
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEngine;

impl Engine for NativeEngine {}
