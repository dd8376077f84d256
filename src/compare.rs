//! Equality, ordering and hashing of script values

use core::cmp::Ordering;

use crate::object::{ObjectKind, ObjectRef};
use crate::prelude::*;
use crate::value::Any;

/// Nesting past which array comparison falls back to identity
const MAX_COMPARE_DEPTH: usize = 64;

/// Numeric comparison view, promoting to f64 only when either side is a double
fn numeric_pair(a: &Any, b: &Any) -> Option<(f64, f64, bool)> {
    let int = |v: &Any| match v {
        Any::Null => Some(0),
        Any::Boolean(b) => Some(i64::from(*b)),
        Any::Integer(i) => Some(*i),
        _ => None,
    };
    match (a, b) {
        (Any::Double(x), Any::Double(y)) => Some((*x, *y, true)),
        (Any::Double(x), other) => int(other).map(|y| (*x, y as f64, true)),
        (other, Any::Double(y)) => int(other).map(|x| (x as f64, *y, true)),
        _ => {
            let (x, y) = (int(a)?, int(b)?);
            // Integers compare exactly below
            Some((x as f64, y as f64, false))
        }
    }
}

fn integer(value: &Any) -> i64 {
    match value {
        Any::Boolean(b) => i64::from(*b),
        Any::Integer(i) => *i,
        _ => 0,
    }
}

fn both_kind(a: &ObjectRef, b: &ObjectRef, kind: ObjectKind) -> bool {
    a.kind() == kind && b.kind() == kind
}

fn loose_equals(a: &Any, b: &Any, depth: usize) -> bool {
    match (a, b) {
        (Any::Undefined, Any::Undefined) => return true,
        (Any::Undefined, _) | (_, Any::Undefined) => return false,
        _ => {}
    }
    if a.is_string() || b.is_string() {
        return a.to_str() == b.to_str();
    }
    if let Some((x, y, floating)) = numeric_pair(a, b) {
        return if floating {
            x == y
        } else {
            integer(a) == integer(b)
        };
    }
    let (Any::Object(x), Any::Object(y)) = (a, b) else {
        return false;
    };
    if ObjectRef::ptr_eq(x, y) {
        return true;
    }
    if both_kind(x, y, ObjectKind::Array) && depth < MAX_COMPARE_DEPTH {
        let (Some(xs), Some(ys)) = (x.elements(), y.elements()) else {
            return false;
        };
        return xs.len() == ys.len()
            && xs
                .iter()
                .zip(ys.iter())
                .all(|(l, r)| loose_equals(l, r, depth + 1));
    }
    if both_kind(x, y, ObjectKind::Function) {
        return x.function() == y.function();
    }
    false
}

/// Loose equality (`==`)
impl PartialEq for Any {
    fn eq(&self, other: &Self) -> bool {
        loose_equals(self, other, 0)
    }
}

fn compare(a: &Any, b: &Any, depth: usize) -> Ordering {
    match (a, b) {
        (Any::Undefined, Any::Undefined) => return Ordering::Equal,
        (Any::Undefined, _) => return Ordering::Less,
        (_, Any::Undefined) => return Ordering::Greater,
        _ => {}
    }
    if a.is_string() || b.is_string() {
        return a.to_str().cmp(&b.to_str());
    }
    if let Some((x, y, floating)) = numeric_pair(a, b) {
        return if floating {
            x.partial_cmp(&y).unwrap_or(Ordering::Less)
        } else {
            integer(a).cmp(&integer(b))
        };
    }
    if let (Any::Object(x), Any::Object(y)) = (a, b) {
        if ObjectRef::ptr_eq(x, y) {
            return Ordering::Equal;
        }
        if both_kind(x, y, ObjectKind::Array) && depth < MAX_COMPARE_DEPTH {
            if let (Some(xs), Some(ys)) = (x.elements(), y.elements()) {
                for (l, r) in xs.iter().zip(ys.iter()) {
                    let ord = compare(l, r, depth + 1);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                return xs.len().cmp(&ys.len());
            }
        }
        if both_kind(x, y, ObjectKind::Function) {
            if let (Some(f), Some(g)) = (x.function(), y.function()) {
                return f.compare(&g);
            }
        }
    }
    // Not meaningfully ordered
    Ordering::Less
}

impl Any {
    /// Strict equality (`===`): same tag, same scalar value or same object
    pub fn strict_equals(&self, other: &Any) -> bool {
        match (self, other) {
            (Any::Undefined, Any::Undefined) | (Any::Null, Any::Null) => true,
            (Any::Boolean(a), Any::Boolean(b)) => a == b,
            (Any::Integer(a), Any::Integer(b)) => a == b,
            (Any::Double(a), Any::Double(b)) => a == b,
            (Any::Object(a), Any::Object(b)) => ObjectRef::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Three-way comparison used by `<`, `>` and sorting.
    ///
    /// `undefined` sorts first. Values of unrelated types compare as
    /// `Less`, which is defined but not a total order; sort callers should
    /// not rely on a meaningful result for mixed-type input.
    pub fn compare(&self, other: &Any) -> Ordering {
        compare(self, other, 0)
    }
}

impl PartialOrd for Any {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

fn hash_number<H: Hasher>(n: f64, state: &mut H) {
    let bits = if n.is_nan() {
        f64::NAN.to_bits()
    } else if n == 0.0 {
        0u64
    } else {
        n.to_bits()
    };
    bits.hash(state);
}

/// Scalars hash by numeric value (`1`, `1.0` and `true` collide), strings by
/// text, and other objects by identity. Consistent with `strict_equals`.
impl Hash for Any {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Any::Undefined | Any::Null => hash_number(0.0, state),
            Any::Boolean(b) => hash_number(if *b { 1.0 } else { 0.0 }, state),
            Any::Integer(i) => hash_number(*i as f64, state),
            Any::Double(d) => hash_number(*d, state),
            Any::Object(obj) => match obj.string_text() {
                Some(text) => text.hash(state),
                None => obj.id().hash(state),
            },
        }
    }
}

/// Map key under strict equality, except that `NaN` equals itself
#[derive(Debug, Clone)]
pub struct StrictKey(pub Any);

impl PartialEq for StrictKey {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Any::Double(a), Any::Double(b)) if a.is_nan() && b.is_nan() => true,
            (a, b) => a.strict_equals(b),
        }
    }
}

impl Eq for StrictKey {}

impl Hash for StrictKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}
