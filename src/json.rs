//! Conversion between script values and `serde_json::Value`

use crate::error::Error;
use crate::object::{ObjectKind, ObjectRef};
use crate::prelude::*;
use crate::value::{Any, Str};

/// Object/array nesting accepted by [`Any::to_json`]
pub const MAX_JSON_DEPTH: usize = 128;

impl Any {
    /// Build a script value from JSON. Integral numbers that fit in `i64`
    /// stay integers.
    pub fn from_json(json: &serde_json::Value) -> Any {
        match json {
            serde_json::Value::Null => Any::Null,
            serde_json::Value::Bool(b) => Any::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Any::Integer(i),
                None => Any::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Any::from(s.as_str()),
            serde_json::Value::Array(items) => {
                Any::from(items.iter().map(Any::from_json).collect::<Vec<_>>())
            }
            serde_json::Value::Object(map) => {
                let mut fields: IndexMap<Str, Any> = index_map_with_capacity(map.len());
                for (key, value) in map {
                    fields.insert(key.as_str().into(), Any::from_json(value));
                }
                let obj = ObjectRef::new_object();
                *obj.fields_mut() = fields;
                Any::Object(obj)
            }
        }
    }

    /// Serialize to JSON.
    ///
    /// `undefined` and functions are dropped from objects and become `null`
    /// inside arrays. Non-finite numbers become `null`. A value that
    /// contains itself fails with `Error::CyclicStructure`; an object
    /// reachable twice without a cycle is serialized twice. Nesting past
    /// [`MAX_JSON_DEPTH`] fails with `Error::NestingTooDeep`.
    pub fn to_json(&self) -> Result<serde_json::Value, Error> {
        let mut visiting = FxHashSet::default();
        to_json_with_visiting(self, &mut visiting)
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    if !n.is_finite() {
        return serde_json::Value::Null;
    }
    match serde_json::Number::from_f64(n) {
        Some(num) => serde_json::Value::Number(num),
        None => serde_json::Value::Null,
    }
}

/// Values with no JSON form inside objects
fn is_skipped(value: &Any) -> bool {
    value.is_undefined() || value.is_function()
}

fn to_json_with_visiting(
    value: &Any,
    visiting: &mut FxHashSet<usize>,
) -> Result<serde_json::Value, Error> {
    Ok(match value {
        Any::Undefined | Any::Null => serde_json::Value::Null,
        Any::Boolean(b) => serde_json::Value::Bool(*b),
        Any::Integer(i) => serde_json::Value::Number((*i).into()),
        Any::Double(d) => number_to_json(*d),
        Any::Object(obj) => {
            if let Some(text) = obj.string_text() {
                return Ok(serde_json::Value::String(text.to_string()));
            }
            if obj.kind() == ObjectKind::Function {
                return Ok(serde_json::Value::Null);
            }

            // `visiting` holds exactly the enclosing objects
            if visiting.len() >= MAX_JSON_DEPTH {
                return Err(Error::NestingTooDeep {
                    limit: MAX_JSON_DEPTH,
                });
            }
            let id = obj.id();
            if !visiting.insert(id) {
                return Err(Error::CyclicStructure);
            }
            let result = object_to_json(obj, visiting);
            visiting.remove(&id);
            result?
        }
    })
}

fn object_to_json(
    obj: &ObjectRef,
    visiting: &mut FxHashSet<usize>,
) -> Result<serde_json::Value, Error> {
    // Snapshot before recursing so no borrow is held across calls
    if let Some(elements) = obj.elements() {
        let items = elements
            .iter()
            .map(|elem| to_json_with_visiting(elem, visiting))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(serde_json::Value::Array(items));
    }

    let entries: Vec<(String, Any)> = obj
        .fields()
        .iter()
        .filter(|(_, value)| !is_skipped(value))
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();
    let mut map = serde_json::Map::with_capacity(entries.len());
    for (key, value) in entries {
        map.insert(key, to_json_with_visiting(&value, visiting)?);
    }
    Ok(serde_json::Value::Object(map))
}
