//! Closure environments
//!
//! A scope maps names to bindings and links to its enclosing scope. Script
//! callables capture an [`Environment`]; the evaluator and VM create child
//! scopes per call.

use crate::error::Error;
use crate::gc::{self, Reset, Traceable};
use crate::prelude::*;
use crate::value::{Any, CheapClone, Str};

/// A variable binding
#[derive(Debug, Clone)]
pub struct Binding {
    pub value: Any,
    pub mutable: bool,
}

/// Bindings of one lexical scope
#[derive(Default)]
pub struct Scope {
    pub bindings: FxHashMap<Str, Binding>,
    pub outer: Option<Environment>,
}

impl Traceable for Scope {
    fn trace(&self, visit: &mut dyn FnMut(usize)) {
        for binding in self.bindings.values() {
            binding.value.trace(visit);
        }
        if let Some(outer) = &self.outer {
            visit(outer.id());
        }
    }
}

impl Reset for Scope {
    fn reset(&mut self) -> Self {
        core::mem::take(self)
    }
}

/// Shared handle to a scope
#[derive(Clone)]
pub struct Environment(Rc<RefCell<Scope>>);

// Environment wraps Rc, so clone is cheap
impl CheapClone for Environment {}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    /// New global scope
    pub fn new() -> Self {
        Self::with_outer(None)
    }

    /// New scope nested in `outer`
    pub fn child(outer: &Environment) -> Self {
        Self::with_outer(Some(outer.cheap_clone()))
    }

    fn with_outer(outer: Option<Environment>) -> Self {
        let rc = Rc::new(RefCell::new(Scope {
            bindings: FxHashMap::default(),
            outer,
        }));
        gc::track_scope(&rc);
        Environment(rc)
    }

    pub fn id(&self) -> usize {
        rc_addr(&self.0)
    }

    pub fn ptr_eq(a: &Environment, b: &Environment) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    pub fn outer(&self) -> Option<Environment> {
        self.0.borrow().outer.clone()
    }

    /// Create or replace a binding in this scope
    pub fn define(&self, name: impl Into<Str>, value: Any, mutable: bool) {
        self.0
            .borrow_mut()
            .bindings
            .insert(name.into(), Binding { value, mutable });
    }

    /// Resolve `name`, walking outward
    pub fn get(&self, name: &str) -> Option<Any> {
        let mut current = self.cheap_clone();
        loop {
            let next = {
                let scope = current.0.borrow();
                if let Some(binding) = scope.bindings.get(name) {
                    return Some(binding.value.clone());
                }
                scope.outer.clone()?
            };
            current = next;
        }
    }

    /// Update the nearest binding of `name`
    pub fn assign(&self, name: &str, value: Any) -> Result<(), Error> {
        let mut current = self.cheap_clone();
        loop {
            let next = {
                let mut scope = current.0.borrow_mut();
                if let Some(binding) = scope.bindings.get_mut(name) {
                    if !binding.mutable {
                        return Err(Error::ConstAssignment {
                            name: Str::from(name),
                        });
                    }
                    binding.value = value;
                    return Ok(());
                }
                scope.outer.clone()
            };
            match next {
                Some(outer) => current = outer,
                None => {
                    return Err(Error::UndefinedVariable {
                        name: Str::from(name),
                    });
                }
            }
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn has_own(&self, name: &str) -> bool {
        self.0.borrow().bindings.contains_key(name)
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = self.0.borrow();
        let mut names: Vec<&str> = scope.bindings.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        f.debug_struct("Environment")
            .field("bindings", &names)
            .field("has_outer", &scope.outer.is_some())
            .finish()
    }
}
