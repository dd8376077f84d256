//! Array objects
//!
//! An array is a heap object whose exotic payload is a dense `Vec<Any>`.
//! Reading `length` yields the element count; assigning `length` truncates
//! or pads with `undefined`.

use tracing::trace;

use crate::object::{Exotic, HeapObject, ObjectRef};
use crate::realm;
use crate::value::Any;

/// Largest length an array may grow to; writes past it are refused
pub const MAX_ARRAY_LENGTH: usize = (1 << 30) - 1;

/// Resize to `len`, padding with `undefined`. Refuses lengths past
/// [`MAX_ARRAY_LENGTH`] and allocations the allocator cannot satisfy.
fn resize_elements(elements: &mut Vec<Any>, len: usize) -> bool {
    if len > MAX_ARRAY_LENGTH {
        trace!(len, "array length over limit ignored");
        return false;
    }
    if len > elements.len() && elements.try_reserve_exact(len - elements.len()).is_err() {
        trace!(len, "array growth failed");
        return false;
    }
    elements.resize(len, Any::Undefined);
    true
}

impl ObjectRef {
    /// New array object
    pub fn new_array(elements: Vec<Any>) -> Self {
        ObjectRef::alloc(HeapObject::with_exotic(
            "Array",
            Some(realm::array_prototype()),
            Exotic::Array(elements),
        ))
    }

    /// Snapshot of the elements, `None` for non-arrays
    pub fn elements(&self) -> Option<Vec<Any>> {
        self.borrow().as_array().cloned()
    }

    pub fn array_len(&self) -> Option<usize> {
        self.borrow().as_array().map(Vec::len)
    }

    /// Element at `index`; `Undefined` when out of range or not an array
    pub fn get_index(&self, index: usize) -> Any {
        self.borrow()
            .as_array()
            .and_then(|elements| elements.get(index).cloned())
            .unwrap_or_default()
    }

    /// Store at `index`, growing with `undefined` holes as needed.
    ///
    /// Returns false if this is not an array or the index is at or past
    /// [`MAX_ARRAY_LENGTH`].
    pub fn set_index(&self, index: usize, value: Any) -> bool {
        let mut obj = self.borrow_mut();
        let Some(elements) = obj.as_array_mut() else {
            return false;
        };
        if index >= elements.len() && !resize_elements(elements, index.saturating_add(1)) {
            return false;
        }
        match elements.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Append and return the new length
    pub fn push(&self, value: Any) -> Option<usize> {
        let mut obj = self.borrow_mut();
        let elements = obj.as_array_mut()?;
        if elements.len() >= MAX_ARRAY_LENGTH {
            return None;
        }
        elements.push(value);
        Some(elements.len())
    }

    pub fn pop(&self) -> Option<Any> {
        self.borrow_mut().as_array_mut()?.pop()
    }

    /// Resize to exactly `len` elements.
    ///
    /// Returns false if this is not an array or `len` is past
    /// [`MAX_ARRAY_LENGTH`]; the array is left unchanged then.
    pub fn set_length(&self, len: usize) -> bool {
        match self.borrow_mut().as_array_mut() {
            Some(elements) => resize_elements(elements, len),
            None => false,
        }
    }

    /// `length` assignment; returns false for values that are not a valid length
    pub(crate) fn assign_array_length(&self, value: &Any) -> bool {
        let len = match value {
            Any::Integer(n) => usize::try_from(*n).ok(),
            Any::Double(d) if d.is_finite() && *d >= 0.0 && *d <= MAX_ARRAY_LENGTH as f64 => {
                Some(d.trunc() as usize)
            }
            Any::Boolean(b) => Some(usize::from(*b)),
            Any::Null => Some(0),
            _ => None,
        };
        match len {
            Some(len) => self.set_length(len),
            None => false,
        }
    }
}
