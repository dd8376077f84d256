//! String objects
//!
//! Strings are immutable heap objects linked to the realm's string
//! prototype. The script-visible `length` counts UTF-16 code units, so the
//! encoded form is computed lazily on first use.

use crate::object::{Exotic, HeapObject, ObjectRef};
use crate::prelude::*;
use crate::realm;
use crate::value::{Any, CheapClone, Str};

/// Text payload of a string object
pub struct StringData {
    text: Str,
    utf16: OnceCell<Vec<u16>>,
}

impl StringData {
    pub fn new(text: Str) -> Self {
        Self {
            text,
            utf16: OnceCell::new(),
        }
    }

    pub fn text(&self) -> &Str {
        &self.text
    }

    fn utf16(&self) -> &[u16] {
        self.utf16.get_or_init(|| self.text.encode_utf16().collect())
    }

    /// Length in UTF-16 code units
    pub fn utf16_len(&self) -> usize {
        // ASCII text has one code unit per byte
        if self.text.is_ascii() {
            return self.text.len();
        }
        self.utf16().len()
    }

    pub fn code_unit_at(&self, index: usize) -> Option<u16> {
        if self.text.is_ascii() {
            return self.text.as_bytes().get(index).map(|&b| u16::from(b));
        }
        self.utf16().get(index).copied()
    }
}

impl ObjectRef {
    /// New string object
    pub fn new_string(text: impl Into<Str>) -> Self {
        let data = StringData::new(text.into());
        ObjectRef::alloc(HeapObject::with_exotic(
            "String",
            Some(realm::string_prototype()),
            Exotic::String(data),
        ))
    }

    /// Text of a string object, `None` for any other kind
    pub fn string_text(&self) -> Option<Str> {
        self.borrow().as_string().map(|data| data.text().cheap_clone())
    }

    pub fn utf16_len(&self) -> Option<usize> {
        self.borrow().as_string().map(StringData::utf16_len)
    }

    /// Single code unit at `index` as a one-element string
    pub fn char_at(&self, index: usize) -> Any {
        let unit = self
            .borrow()
            .as_string()
            .and_then(|data| data.code_unit_at(index));
        match unit {
            Some(unit) => Any::from(String::from_utf16_lossy(&[unit])),
            None => Any::from(""),
        }
    }

    /// Code unit at `index`, `0` when out of range
    pub fn char_code_at(&self, index: usize) -> Any {
        let unit = self
            .borrow()
            .as_string()
            .and_then(|data| data.code_unit_at(index));
        match unit {
            Some(unit) => Any::Integer(i64::from(unit)),
            None => Any::Integer(0),
        }
    }
}
