//! Arithmetic and bitwise operators on script values
//!
//! Operators never fail. `undefined` on either side poisons the result,
//! invalid operand types degrade to `NaN` (arithmetic) or `0` (bitwise),
//! and integer arithmetic wraps.

use crate::value::Any;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    BitNot,
}

/// Numeric view of a value; null and booleans count as integers
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(value: &Any) -> Option<Num> {
        match value {
            Any::Null => Some(Num::Int(0)),
            Any::Boolean(b) => Some(Num::Int(i64::from(*b))),
            Any::Integer(i) => Some(Num::Int(*i)),
            Any::Double(d) => Some(Num::Float(*d)),
            Any::Undefined | Any::Object(_) => None,
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(d) => d,
        }
    }

    /// Truncating; NaN becomes 0 and out-of-range values saturate
    fn to_i64(self) -> i64 {
        match self {
            Num::Int(i) => i,
            Num::Float(d) => d as i64,
        }
    }
}

fn nan() -> Any {
    Any::Double(f64::NAN)
}

fn arithmetic(
    lhs: &Any,
    rhs: &Any,
    int_op: impl FnOnce(i64, i64) -> Any,
    float_op: impl FnOnce(f64, f64) -> f64,
) -> Any {
    match (Num::of(lhs), Num::of(rhs)) {
        (Some(Num::Int(a)), Some(Num::Int(b))) => int_op(a, b),
        (Some(a), Some(b)) => Any::Double(float_op(a.to_f64(), b.to_f64())),
        _ => nan(),
    }
}

fn floating(lhs: &Any, rhs: &Any, op: impl FnOnce(f64, f64) -> f64) -> Any {
    match (Num::of(lhs), Num::of(rhs)) {
        (Some(a), Some(b)) => Any::Double(op(a.to_f64(), b.to_f64())),
        _ => nan(),
    }
}

fn bitwise(lhs: &Any, rhs: &Any, op: impl FnOnce(i64, i64) -> i64) -> Any {
    match (Num::of(lhs), Num::of(rhs)) {
        (Some(a), Some(b)) => Any::Integer(op(a.to_i64(), b.to_i64())),
        _ => Any::Integer(0),
    }
}

fn shift_count(n: i64) -> u32 {
    (n & 63) as u32
}

fn add(lhs: &Any, rhs: &Any) -> Any {
    if lhs.is_string() || rhs.is_string() {
        let mut text = lhs.to_str().to_string();
        text.push_str(&rhs.to_str());
        return Any::from(text);
    }
    match (Num::of(lhs), Num::of(rhs)) {
        (Some(Num::Int(a)), Some(Num::Int(b))) => Any::Integer(a.wrapping_add(b)),
        (Some(a), Some(b)) => Any::Double(a.to_f64() + b.to_f64()),
        _ => Any::from(format!("{}{}", lhs, rhs)),
    }
}

impl Any {
    /// Apply a binary operator
    pub fn binary_op(&self, op: BinaryOp, rhs: &Any) -> Any {
        if self.is_undefined() || rhs.is_undefined() {
            return Any::Undefined;
        }
        match op {
            BinaryOp::Add => add(self, rhs),
            BinaryOp::Sub => arithmetic(self, rhs, |a, b| Any::Integer(a.wrapping_sub(b)), |a, b| a - b),
            BinaryOp::Mul => arithmetic(self, rhs, |a, b| Any::Integer(a.wrapping_mul(b)), |a, b| a * b),
            BinaryOp::Mod => arithmetic(
                self,
                rhs,
                |a, b| {
                    if b == 0 {
                        nan()
                    } else {
                        Any::Integer(a.wrapping_rem(b))
                    }
                },
                |a, b| a % b,
            ),
            BinaryOp::Div => floating(self, rhs, |a, b| a / b),
            BinaryOp::Pow => floating(self, rhs, f64::powf),
            BinaryOp::BitAnd => bitwise(self, rhs, |a, b| a & b),
            BinaryOp::BitOr => bitwise(self, rhs, |a, b| a | b),
            BinaryOp::BitXor => bitwise(self, rhs, |a, b| a ^ b),
            BinaryOp::Shl => bitwise(self, rhs, |a, b| a.wrapping_shl(shift_count(b))),
            BinaryOp::Shr => bitwise(self, rhs, |a, b| a.wrapping_shr(shift_count(b))),
            BinaryOp::UShr => bitwise(self, rhs, |a, b| ((a as u64) >> shift_count(b)) as i64),
        }
    }

    /// Apply a unary operator
    pub fn unary_op(&self, op: UnaryOp) -> Any {
        match (op, Num::of(self)) {
            (UnaryOp::Plus, Some(Num::Int(i))) => Any::Integer(i),
            (UnaryOp::Plus, Some(Num::Float(d))) => Any::Double(d),
            (UnaryOp::Minus, Some(Num::Int(i))) => Any::Integer(i.wrapping_neg()),
            (UnaryOp::Minus, Some(Num::Float(d))) => Any::Double(-d),
            (UnaryOp::Plus | UnaryOp::Minus, None) => nan(),
            (UnaryOp::BitNot, Some(n)) => Any::Integer(!n.to_i64()),
            (UnaryOp::BitNot, None) => Any::Undefined,
        }
    }

    /// `**`
    pub fn pow(&self, rhs: &Any) -> Any {
        self.binary_op(BinaryOp::Pow, rhs)
    }

    /// `>>>`
    pub fn ushr(&self, rhs: &Any) -> Any {
        self.binary_op(BinaryOp::UShr, rhs)
    }

    /// `~`
    pub fn bit_not(&self) -> Any {
        self.unary_op(UnaryOp::BitNot)
    }
}

macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident, $op:expr) => {
        impl core::ops::$trait for Any {
            type Output = Any;

            fn $method(self, rhs: Any) -> Any {
                self.binary_op($op, &rhs)
            }
        }

        impl core::ops::$trait<&Any> for &Any {
            type Output = Any;

            fn $method(self, rhs: &Any) -> Any {
                self.binary_op($op, rhs)
            }
        }
    };
}

impl_binary_operator!(Add, add, BinaryOp::Add);
impl_binary_operator!(Sub, sub, BinaryOp::Sub);
impl_binary_operator!(Mul, mul, BinaryOp::Mul);
impl_binary_operator!(Div, div, BinaryOp::Div);
impl_binary_operator!(Rem, rem, BinaryOp::Mod);
impl_binary_operator!(BitAnd, bitand, BinaryOp::BitAnd);
impl_binary_operator!(BitOr, bitor, BinaryOp::BitOr);
impl_binary_operator!(BitXor, bitxor, BinaryOp::BitXor);
impl_binary_operator!(Shl, shl, BinaryOp::Shl);
impl_binary_operator!(Shr, shr, BinaryOp::Shr);

impl core::ops::Neg for Any {
    type Output = Any;

    fn neg(self) -> Any {
        self.unary_op(UnaryOp::Minus)
    }
}

impl core::ops::Neg for &Any {
    type Output = Any;

    fn neg(self) -> Any {
        self.unary_op(UnaryOp::Minus)
    }
}
