//! Callables
//!
//! A function is a heap object whose exotic payload is a [`Function`]. The
//! payload is one of four implementations sharing a single calling
//! convention: a native function pointer, a native closure capturing host
//! state, an interpreted body with its captured environment, or a compiled
//! bytecode blob that is bound to an environment per closure instance.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::engine::Engine;
use crate::environment::Environment;
use crate::error::Error;
use crate::gc::Traceable;
use crate::object::{Exotic, HeapObject, ObjectKind, ObjectRef};
use crate::prelude::*;
use crate::realm;
use crate::value::{Any, CheapClone, Str};

/// Which implementation backs a callable
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CallKind {
    NativeFunction,
    NativeClosure,
    InterpretedScript,
    CompiledScript,
}

/// Out-parameter through which native callables report failure.
///
/// `ReturnIsException` means the returned value is to be thrown by the
/// caller rather than used as a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NativeStatus {
    #[default]
    NoError,
    WrongArgCount,
    WrongArgType,
    ReturnIsException,
}

impl NativeStatus {
    /// Turn the status and return value of a native call into a result
    pub fn into_result(self, function: &Str, value: Any) -> Result<Any, Error> {
        match self {
            NativeStatus::NoError => Ok(value),
            NativeStatus::WrongArgCount => Err(Error::WrongArgCount {
                function: function.cheap_clone(),
            }),
            NativeStatus::WrongArgType => Err(Error::WrongArgType {
                function: function.cheap_clone(),
            }),
            NativeStatus::ReturnIsException => Err(Error::Thrown(value)),
        }
    }
}

/// Native function pointer: `(engine, this, args, status) -> result`
pub type NativeFn = fn(&mut dyn Engine, &Any, &[Any], &mut NativeStatus) -> Any;

/// Native closure capturing host state
pub type NativeClosure = Rc<dyn Fn(&mut dyn Engine, &Any, &[Any], &mut NativeStatus) -> Any>;

/// Host-implemented callable
#[derive(Clone)]
pub enum Native {
    Function(NativeFn),
    Closure(NativeClosure),
}

impl Native {
    pub fn invoke(
        &self,
        engine: &mut dyn Engine,
        this: &Any,
        args: &[Any],
        status: &mut NativeStatus,
    ) -> Any {
        match self {
            Native::Function(func) => func(engine, this, args, status),
            Native::Closure(closure) => closure(engine, this, args, status),
        }
    }

    fn identity(&self) -> usize {
        match self {
            Native::Function(func) => *func as usize,
            Native::Closure(closure) => rc_addr(closure),
        }
    }
}

/// Script-defined callable run by a tree-walking evaluator.
///
/// The body is owned by the evaluator; the core only compares it by identity.
#[derive(Clone)]
pub struct ScriptFunction {
    pub body: Rc<dyn core::any::Any>,
    pub closure: Environment,
}

impl ScriptFunction {
    /// Typed access to the evaluator's body representation
    pub fn body<T: 'static>(&self) -> Option<&T> {
        self.body.downcast_ref::<T>()
    }
}

/// Bytecode callable. A template (fresh from the compiler) has no closure
/// environment until bound with [`ObjectRef::copy_compiled`].
#[derive(Clone)]
pub struct CompiledFunction {
    pub bytecode: Rc<[u8]>,
    pub closure: Option<Environment>,
}

impl CompiledFunction {
    pub fn is_template(&self) -> bool {
        self.closure.is_none()
    }
}

#[derive(Clone)]
pub enum FunctionBody {
    Native(Native),
    Interpreted(ScriptFunction),
    Compiled(CompiledFunction),
}

/// Callable payload of a function object
#[derive(Clone)]
pub struct Function {
    name: Str,
    params: Rc<[Str]>,
    /// Only affects display
    is_constructor: bool,
    bound_this: Option<Any>,
    body: FunctionBody,
}

impl Function {
    pub fn new(name: impl Into<Str>, params: Rc<[Str]>, body: FunctionBody) -> Self {
        Self {
            name: name.into(),
            params,
            is_constructor: false,
            bound_this: None,
            body,
        }
    }

    pub fn with_constructor(mut self, is_constructor: bool) -> Self {
        self.is_constructor = is_constructor;
        self
    }

    pub fn name(&self) -> &Str {
        &self.name
    }

    pub fn parameter_names(&self) -> &[Str] {
        &self.params
    }

    pub fn is_constructor(&self) -> bool {
        self.is_constructor
    }

    pub fn bound_this(&self) -> Option<&Any> {
        self.bound_this.as_ref()
    }

    pub fn body(&self) -> &FunctionBody {
        &self.body
    }

    pub fn call_kind(&self) -> CallKind {
        match &self.body {
            FunctionBody::Native(Native::Function(_)) => CallKind::NativeFunction,
            FunctionBody::Native(Native::Closure(_)) => CallKind::NativeClosure,
            FunctionBody::Interpreted(_) => CallKind::InterpretedScript,
            FunctionBody::Compiled(_) => CallKind::CompiledScript,
        }
    }

    /// Bytecode of a compiled callable
    pub fn bytecode(&self) -> Option<&Rc<[u8]>> {
        match &self.body {
            FunctionBody::Compiled(compiled) => Some(&compiled.bytecode),
            _ => None,
        }
    }

    /// Three-way comparison by kind, name, constructor flag, then payload.
    ///
    /// Compiled callables compare by bytecode contents, so every closure
    /// copied from one template compares equal.
    pub fn compare(&self, other: &Function) -> Ordering {
        self.call_kind()
            .cmp(&other.call_kind())
            .then_with(|| self.name.cmp(&other.name))
            .then_with(|| self.is_constructor.cmp(&other.is_constructor))
            .then_with(|| match (&self.body, &other.body) {
                (FunctionBody::Native(a), FunctionBody::Native(b)) => {
                    a.identity().cmp(&b.identity())
                }
                (FunctionBody::Interpreted(a), FunctionBody::Interpreted(b)) => rc_addr(&a.body)
                    .cmp(&rc_addr(&b.body))
                    .then_with(|| a.closure.id().cmp(&b.closure.id())),
                (FunctionBody::Compiled(a), FunctionBody::Compiled(b)) => {
                    a.bytecode.as_ref().cmp(b.bytecode.as_ref())
                }
                // Different kinds were already ordered above
                _ => Ordering::Equal,
            })
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Function {}

impl PartialOrd for Function {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for Function {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("kind", &self.call_kind())
            .field("is_constructor", &self.is_constructor)
            .finish()
    }
}

impl Traceable for Function {
    fn trace(&self, visit: &mut dyn FnMut(usize)) {
        if let Some(this) = &self.bound_this {
            this.trace(visit);
        }
        match &self.body {
            FunctionBody::Interpreted(script) => visit(script.closure.id()),
            FunctionBody::Compiled(CompiledFunction {
                closure: Some(env), ..
            }) => visit(env.id()),
            FunctionBody::Native(_) | FunctionBody::Compiled(_) => {}
        }
    }
}

fn collect_params<I, S>(params: I) -> Rc<[Str]>
where
    I: IntoIterator<Item = S>,
    S: Into<Str>,
{
    params.into_iter().map(Into::into).collect()
}

impl ObjectRef {
    /// Wrap a callable payload in a function object.
    ///
    /// Also creates the function's `prototype` object, whose `constructor`
    /// field points back at the function.
    pub fn new_function(function: Function) -> Self {
        let func = ObjectRef::alloc(HeapObject::with_exotic(
            "Function",
            Some(realm::function_prototype()),
            Exotic::Function(function),
        ));
        let prototype = ObjectRef::new_object();
        prototype.assign_field("constructor", Any::Object(func.cheap_clone()));
        func.assign_field("prototype", Any::Object(prototype));
        func
    }

    pub fn new_native_function(name: impl Into<Str>, func: NativeFn) -> Self {
        Self::new_function(Function::new(
            name,
            Rc::from([]),
            FunctionBody::Native(Native::Function(func)),
        ))
    }

    pub fn new_native_closure<F>(name: impl Into<Str>, closure: F) -> Self
    where
        F: Fn(&mut dyn Engine, &Any, &[Any], &mut NativeStatus) -> Any + 'static,
    {
        Self::new_function(Function::new(
            name,
            Rc::from([]),
            FunctionBody::Native(Native::Closure(Rc::new(closure))),
        ))
    }

    /// Script function whose body is run by the evaluator
    pub fn new_interpreted_function<I, S>(
        name: impl Into<Str>,
        params: I,
        body: Rc<dyn core::any::Any>,
        closure: Environment,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Str>,
    {
        Self::new_function(Function::new(
            name,
            collect_params(params),
            FunctionBody::Interpreted(ScriptFunction { body, closure }),
        ))
    }

    /// Compiled template; bind it with [`ObjectRef::copy_compiled`] before calling
    pub fn new_compiled_function<I, S>(
        name: impl Into<Str>,
        params: I,
        bytecode: impl Into<Rc<[u8]>>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Str>,
    {
        Self::new_function(Function::new(
            name,
            collect_params(params),
            FunctionBody::Compiled(CompiledFunction {
                bytecode: bytecode.into(),
                closure: None,
            }),
        ))
    }

    /// Clone of the callable payload, `None` for non-functions
    pub fn function(&self) -> Option<Function> {
        self.borrow().as_function().cloned()
    }

    pub fn function_name(&self) -> Option<Str> {
        self.borrow().as_function().map(|f| f.name().cheap_clone())
    }

    pub fn call_kind(&self) -> Option<CallKind> {
        self.borrow().as_function().map(Function::call_kind)
    }

    pub fn parameter_names(&self) -> Option<Rc<[Str]>> {
        self.borrow().as_function().map(|f| f.params.clone())
    }

    /// Bytecode of a compiled function, shared with every copy
    pub fn bytecode(&self) -> Option<Rc<[u8]>> {
        self.borrow().as_function()?.bytecode().cloned()
    }

    /// Fix `this` for every future call through this function.
    ///
    /// Binding is permanent: binding an already bound function keeps the
    /// first `this`.
    pub fn bind(&self, this: Any) -> Result<(), Error> {
        let bound = match self.borrow_mut().as_function_mut() {
            Some(func) => {
                func.bound_this.get_or_insert(this);
                true
            }
            None => false,
        };
        if bound {
            Ok(())
        } else {
            Err(Error::not_callable(&Any::Object(self.cheap_clone())))
        }
    }

    /// New closure instance of a compiled function, bound to `env`.
    ///
    /// The copy shares the bytecode with `self` and gets its own prototype
    /// object.
    pub fn copy_compiled(&self, env: &Environment) -> Result<ObjectRef, Error> {
        let Some(mut func) = self.function() else {
            return Err(Error::not_callable(&Any::Object(self.cheap_clone())));
        };
        match &mut func.body {
            FunctionBody::Compiled(compiled) => compiled.closure = Some(env.cheap_clone()),
            _ => {
                return Err(Error::invalid_conversion(
                    &Any::Object(self.cheap_clone()),
                    "compiled function",
                ));
            }
        }
        Ok(ObjectRef::new_function(func))
    }

    /// Invoke this function.
    ///
    /// A bound `this` takes precedence over the caller's. Native status
    /// failures become errors; script bodies are handed to `engine`.
    pub fn call(&self, engine: &mut dyn Engine, this: &Any, args: &[Any]) -> Result<Any, Error> {
        let Some(function) = self.function() else {
            return Err(Error::not_callable(&Any::Object(self.cheap_clone())));
        };
        let this = function.bound_this.as_ref().unwrap_or(this);
        trace!(function = %function.name, kind = ?function.call_kind(), argc = args.len(), "call");

        match &function.body {
            FunctionBody::Native(native) => {
                let mut status = NativeStatus::NoError;
                let value = native.invoke(engine, this, args, &mut status);
                if status != NativeStatus::NoError {
                    debug!(function = %function.name, ?status, "native call failed");
                }
                status.into_result(&function.name, value)
            }
            FunctionBody::Interpreted(script) => engine.call_interpreted(self, script, this, args),
            FunctionBody::Compiled(compiled) => {
                if compiled.is_template() {
                    return Err(Error::UnboundTemplate {
                        function: function.name.cheap_clone(),
                    });
                }
                engine.call_compiled(self, compiled, this, args)
            }
        }
    }

    /// Whether some link of this object's prototype chain has `constructor`
    /// set to `callable`
    pub fn is_instance_of(&self, callable: &ObjectRef) -> bool {
        let mut current = self.prototype();
        while let Some(link) = current {
            let matches = match link.borrow().get_own_field("constructor") {
                Some(Any::Object(ctor)) => ObjectRef::ptr_eq(ctor, callable),
                _ => false,
            };
            if matches {
                return true;
            }
            current = link.prototype();
        }
        false
    }
}

impl Any {
    /// Invoke this value as a function
    pub fn call(&self, engine: &mut dyn Engine, this: &Any, args: &[Any]) -> Result<Any, Error> {
        match self {
            Any::Object(obj) => obj.call(engine, this, args),
            _ => Err(Error::not_callable(self)),
        }
    }

    /// `instanceof`; false for non-objects and non-callables
    pub fn is_instance_of(&self, callable: &Any) -> bool {
        match (self, callable) {
            (Any::Object(obj), Any::Object(ctor)) if ctor.kind() == ObjectKind::Function => {
                obj.is_instance_of(ctor)
            }
            _ => false,
        }
    }
}

/// Serializable form of a compiled function, for compiler caches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionTemplate {
    pub name: Str,
    #[serde(default)]
    pub parameter_names: Vec<Str>,
    pub bytecode: Vec<u8>,
    #[serde(default)]
    pub is_constructor: bool,
}

impl ObjectRef {
    /// Compiled template function from its serialized form
    pub fn from_template(template: &FunctionTemplate) -> Self {
        let function = Function::new(
            template.name.cheap_clone(),
            template.parameter_names.iter().cloned().collect(),
            FunctionBody::Compiled(CompiledFunction {
                bytecode: Rc::from(template.bytecode.as_slice()),
                closure: None,
            }),
        )
        .with_constructor(template.is_constructor);
        Self::new_function(function)
    }

    /// Serializable form of a compiled function, `None` for other kinds
    pub fn to_template(&self) -> Option<FunctionTemplate> {
        let obj = self.borrow();
        let func = obj.as_function()?;
        let bytecode = func.bytecode()?;
        Some(FunctionTemplate {
            name: func.name.cheap_clone(),
            parameter_names: func.params.to_vec(),
            bytecode: bytecode.to_vec(),
            is_constructor: func.is_constructor,
        })
    }
}
