//! Conversions from script values to Rust types
//!
//! [`FromAny`] never fails and falls back to a neutral value (`0`, `NaN`,
//! `""`, `None`). [`TryFromAny`] reports `Error::InvalidConversion` carrying
//! the offending value when the tag cannot produce the target.

use crate::error::Error;
use crate::object::ObjectRef;
use crate::value::{Any, CheapClone, Str};

/// Lenient conversion
pub trait FromAny: Sized {
    fn from_any(value: &Any) -> Self;
}

/// Checked conversion
pub trait TryFromAny: Sized {
    fn try_from_any(value: &Any) -> Result<Self, Error>;
}

impl Any {
    /// Coerce to `T`, using a default on mismatch
    pub fn to_value<T: FromAny>(&self) -> T {
        T::from_any(self)
    }

    /// Convert to `T`, failing if this value's type cannot produce one
    pub fn check_value<T: TryFromAny>(&self) -> Result<T, Error> {
        T::try_from_any(self)
    }

    /// Numeric coercion (`Number(x)`)
    pub fn to_number(&self) -> f64 {
        match self {
            Any::Undefined => f64::NAN,
            Any::Null => 0.0,
            Any::Boolean(b) => f64::from(u8::from(*b)),
            Any::Integer(i) => *i as f64,
            Any::Double(d) => *d,
            Any::Object(obj) => match obj.string_text() {
                Some(text) => parse_number(&text),
                None => f64::NAN,
            },
        }
    }
}

/// Parse numeric text the way scripts coerce strings
pub fn parse_number(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    match text {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return match u64::from_str_radix(hex, 16) {
            Ok(n) => n as f64,
            Err(_) => f64::NAN,
        };
    }
    // Rust accepts "inf"/"nan" spellings that scripts do not
    if text.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return f64::NAN;
    }
    text.parse::<f64>().unwrap_or(f64::NAN)
}

fn float_to_i64(n: f64) -> i64 {
    // NaN maps to 0, infinities saturate
    n as i64
}

// ═══════════════════════════════════════════════════════════════════════════════
// Lenient conversions
// ═══════════════════════════════════════════════════════════════════════════════

impl FromAny for Any {
    fn from_any(value: &Any) -> Self {
        value.clone()
    }
}

impl FromAny for bool {
    fn from_any(value: &Any) -> Self {
        value.to_bool()
    }
}

impl FromAny for f64 {
    fn from_any(value: &Any) -> Self {
        value.to_number()
    }
}

impl FromAny for i64 {
    fn from_any(value: &Any) -> Self {
        match value {
            Any::Integer(i) => *i,
            other => float_to_i64(other.to_number()),
        }
    }
}

impl FromAny for i32 {
    fn from_any(value: &Any) -> Self {
        i64::from_any(value) as i32
    }
}

impl FromAny for u32 {
    fn from_any(value: &Any) -> Self {
        i64::from_any(value) as u32
    }
}

impl FromAny for usize {
    fn from_any(value: &Any) -> Self {
        usize::try_from(i64::from_any(value)).unwrap_or(0)
    }
}

impl FromAny for Str {
    fn from_any(value: &Any) -> Self {
        value.to_str()
    }
}

impl FromAny for String {
    fn from_any(value: &Any) -> Self {
        value.to_str().to_string()
    }
}

impl FromAny for Option<ObjectRef> {
    fn from_any(value: &Any) -> Self {
        value.as_object().map(CheapClone::cheap_clone)
    }
}

/// Array elements; empty for non-arrays
impl<T: FromAny> FromAny for Vec<T> {
    fn from_any(value: &Any) -> Self {
        value
            .as_object()
            .and_then(ObjectRef::elements)
            .map(|elements| elements.iter().map(T::from_any).collect())
            .unwrap_or_default()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Checked conversions
// ═══════════════════════════════════════════════════════════════════════════════

fn checked_number(value: &Any, target: &'static str) -> Result<f64, Error> {
    if value.is_number() {
        Ok(value.to_number())
    } else {
        Err(Error::invalid_conversion(value, target))
    }
}

fn checked_integer(value: &Any, target: &'static str) -> Result<i64, Error> {
    match value {
        Any::Integer(i) => Ok(*i),
        other => checked_number(other, target).map(float_to_i64),
    }
}

impl TryFromAny for Any {
    fn try_from_any(value: &Any) -> Result<Self, Error> {
        Ok(value.clone())
    }
}

/// Every value has a truthiness
impl TryFromAny for bool {
    fn try_from_any(value: &Any) -> Result<Self, Error> {
        Ok(value.to_bool())
    }
}

impl TryFromAny for f64 {
    fn try_from_any(value: &Any) -> Result<Self, Error> {
        checked_number(value, "f64")
    }
}

impl TryFromAny for i64 {
    fn try_from_any(value: &Any) -> Result<Self, Error> {
        checked_integer(value, "i64")
    }
}

impl TryFromAny for i32 {
    fn try_from_any(value: &Any) -> Result<Self, Error> {
        let n = checked_integer(value, "i32")?;
        i32::try_from(n).map_err(|_| Error::invalid_conversion(value, "i32"))
    }
}

impl TryFromAny for u32 {
    fn try_from_any(value: &Any) -> Result<Self, Error> {
        let n = checked_integer(value, "u32")?;
        u32::try_from(n).map_err(|_| Error::invalid_conversion(value, "u32"))
    }
}

impl TryFromAny for usize {
    fn try_from_any(value: &Any) -> Result<Self, Error> {
        let n = checked_integer(value, "usize")?;
        usize::try_from(n).map_err(|_| Error::invalid_conversion(value, "usize"))
    }
}

/// Every value has a display form
impl TryFromAny for Str {
    fn try_from_any(value: &Any) -> Result<Self, Error> {
        Ok(value.to_str())
    }
}

impl TryFromAny for String {
    fn try_from_any(value: &Any) -> Result<Self, Error> {
        Ok(value.to_str().to_string())
    }
}

impl TryFromAny for ObjectRef {
    fn try_from_any(value: &Any) -> Result<Self, Error> {
        value
            .as_object()
            .map(CheapClone::cheap_clone)
            .ok_or_else(|| Error::invalid_conversion(value, "object"))
    }
}

/// `null` and `undefined` are the absent object
impl TryFromAny for Option<ObjectRef> {
    fn try_from_any(value: &Any) -> Result<Self, Error> {
        match value {
            Any::Null | Any::Undefined => Ok(None),
            Any::Object(obj) => Ok(Some(obj.cheap_clone())),
            other => Err(Error::invalid_conversion(other, "object or null")),
        }
    }
}

impl<T: TryFromAny> TryFromAny for Vec<T> {
    fn try_from_any(value: &Any) -> Result<Self, Error> {
        let elements = value
            .as_object()
            .and_then(ObjectRef::elements)
            .ok_or_else(|| Error::invalid_conversion(value, "array"))?;
        elements.iter().map(T::try_from_any).collect()
    }
}
