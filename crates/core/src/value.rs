//! Value types for quiver
//!
//! A session is heterogeneous: it stores labeled arrays next to axes,
//! scalars, strings, nested objects and arbitrary Rust values. [`Value`] is
//! the closed set of shapes the container knows about.
//!
//! ## Sharing
//!
//! Arrays, axes and opaque payloads are reference counted. Inserting a value
//! into a session, or copying a session, never duplicates the payload.
//!
//! ## Operators
//!
//! [`Value::binary_op`] returns `Ok(None)` when the left operand does not
//! know how to combine with the right one (a scalar does not know about
//! arrays). The caller then retries with the reflected operator on the
//! right operand. Genuine failures (incompatible axes, integer overflow,
//! division by zero on scalars) are `Err`.

use crate::array::{ArrayRhs, Axis, Dtype, LabeledArray};
use crate::error::{Error, Result};
use crate::ops::{BinaryOp, FloatErrors, UnaryOp};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Arbitrary Rust value stored behind a reference count
///
/// The container never inspects it; elementwise operators on an opaque
/// entry always produce the undefined sentinel.
#[derive(Clone)]
pub struct OpaqueValue {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl OpaqueValue {
    /// Wrap a value
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: Arc::new(value),
        }
    }

    /// Rust type name of the wrapped value
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrow the wrapped value if it has type `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// True if both handles point to the same allocation
    pub fn ptr_eq(&self, other: &OpaqueValue) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for OpaqueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueValue<{}>", self.type_name)
    }
}

/// Any value a session can hold
#[derive(Debug, Clone)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point (IEEE-754); NaN doubles as the undefined sentinel
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Labeled array
    Array(Arc<LabeledArray>),
    /// Standalone axis
    Axis(Arc<Axis>),
    /// Object with string keys
    Object(BTreeMap<String, Value>),
    /// Arbitrary Rust value
    Opaque(OpaqueValue),
}

// Custom PartialEq implementation for IEEE-754 float semantics
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Axis(a), Value::Axis(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => a.ptr_eq(b),
            // Different types are never equal
            _ => false,
        }
    }
}

impl Value {
    /// The undefined sentinel (`Float(NaN)`)
    pub fn undefined() -> Self {
        Value::Float(f64::NAN)
    }

    /// True for `Float(NaN)`
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Float(f) if f.is_nan())
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Array(_) => "Array",
            Value::Axis(_) => "Axis",
            Value::Object(_) => "Object",
            Value::Opaque(o) => o.type_name(),
        }
    }

    /// Name the value carries itself, if any (axes are named)
    pub fn name(&self) -> Option<&str> {
        match self {
            Value::Axis(axis) => Some(axis.name()),
            _ => None,
        }
    }

    /// Check if this is a labeled array
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Get the array if this is an Array value
    pub fn as_array(&self) -> Option<&Arc<LabeledArray>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get the axis if this is an Axis value
    pub fn as_axis(&self) -> Option<&Arc<Axis>> {
        match self {
            Value::Axis(a) => Some(a),
            _ => None,
        }
    }

    /// Get as bool if this is a Bool value
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Int value
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a Float value
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Get as &str if this is a String value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as object map if this is an Object value
    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Get the opaque handle if this is an Opaque value
    pub fn as_opaque(&self) -> Option<&OpaqueValue> {
        match self {
            Value::Opaque(o) => Some(o),
            _ => None,
        }
    }

    /// Numeric scalar view: Bool, Int and Float
    pub fn as_numeric(&self) -> Option<(f64, Dtype)> {
        match self {
            Value::Bool(b) => Some((if *b { 1.0 } else { 0.0 }, Dtype::Bool)),
            Value::Int(i) => Some((*i as f64, Dtype::Int)),
            Value::Float(f) => Some((*f, Dtype::Float)),
            _ => None,
        }
    }

    /// Integer view of Bool and Int scalars, exact for every `i64`
    pub fn as_exact_int(&self) -> Option<i64> {
        match self {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Apply a binary operator with `self` on the left
    ///
    /// `Ok(None)` means "not implemented for this pair": the caller should
    /// try `rhs.binary_op(op.reflected(), self)`.
    pub fn binary_op(
        &self,
        op: BinaryOp,
        rhs: &Value,
        errors: &mut FloatErrors,
    ) -> Result<Option<Value>> {
        match (self, rhs) {
            (Value::Array(lhs), Value::Array(rhs)) => {
                let out = lhs.binary_op(op, ArrayRhs::Array(rhs), errors)?;
                Ok(Some(Value::Array(Arc::new(out))))
            }
            (Value::Array(lhs), rhs) => {
                let (scalar, dtype) = rhs.as_numeric().ok_or_else(|| {
                    Error::type_mismatch(format!(
                        "unsupported operand types for {}: Array and {}",
                        op,
                        rhs.type_name()
                    ))
                })?;
                let out = lhs.binary_op(op, ArrayRhs::Scalar(scalar, dtype), errors)?;
                Ok(Some(Value::Array(Arc::new(out))))
            }
            // scalars and other values do not know about arrays
            (_, Value::Array(_)) => Ok(None),
            _ => {
                if let (Some(a), Some(b)) = (self.as_numeric(), rhs.as_numeric()) {
                    let exact = self.as_exact_int().zip(rhs.as_exact_int());
                    return scalar_op(op, a, b, exact, errors).map(Some);
                }
                Ok(self.same_kind_op(op, rhs))
            }
        }
    }

    fn same_kind_op(&self, op: BinaryOp, rhs: &Value) -> Option<Value> {
        let same_kind = std::mem::discriminant(self) == std::mem::discriminant(rhs);
        match op {
            BinaryOp::Eq if same_kind => Some(Value::Bool(self == rhs)),
            BinaryOp::Ne if same_kind => Some(Value::Bool(self != rhs)),
            BinaryOp::Add | BinaryOp::RAdd => match (self, rhs) {
                (Value::String(a), Value::String(b)) if op == BinaryOp::Add => {
                    Some(Value::String(format!("{}{}", a, b)))
                }
                (Value::String(a), Value::String(b)) => Some(Value::String(format!("{}{}", b, a))),
                _ => None,
            },
            _ => None,
        }
    }

    /// Apply a unary operator
    ///
    /// # Errors
    ///
    /// `TypeMismatch` for values that do not support the operator.
    pub fn unary_op(&self, op: UnaryOp) -> Result<Value> {
        let unsupported = || {
            Error::type_mismatch(format!(
                "bad operand type for unary {}: {}",
                op,
                self.type_name()
            ))
        };
        match (self, op) {
            (Value::Array(a), _) => Ok(Value::Array(Arc::new(a.unary_op(op)?))),
            (Value::Int(i), UnaryOp::Neg) => i.checked_neg().map(Value::Int).ok_or_else(overflow),
            (Value::Int(i), UnaryOp::Abs) => i.checked_abs().map(Value::Int).ok_or_else(overflow),
            (Value::Int(i), UnaryOp::Pos) => Ok(Value::Int(*i)),
            (Value::Int(i), UnaryOp::Invert) => Ok(Value::Int(!i)),
            (Value::Float(f), UnaryOp::Neg) => Ok(Value::Float(-f)),
            (Value::Float(f), UnaryOp::Abs) => Ok(Value::Float(f.abs())),
            (Value::Float(f), UnaryOp::Pos) => Ok(Value::Float(*f)),
            (Value::Bool(b), UnaryOp::Pos) => Ok(Value::Bool(*b)),
            (Value::Bool(b), UnaryOp::Invert) => Ok(Value::Bool(!b)),
            _ => Err(unsupported()),
        }
    }

    /// Equality with NaN equal to NaN, used to compare session entries
    ///
    /// A numeric scalar compared with an array is treated as a
    /// zero-dimensional array, so it only equals a zero-dimensional array.
    pub fn nan_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => a.equals(b, true),
            (Value::Array(a), scalar) | (scalar, Value::Array(a)) => match scalar.as_numeric() {
                Some((v, dtype)) => a.equals(&LabeledArray::scalar(dtype, v), true),
                None => false,
            },
            _ => match (self.as_exact_int(), other.as_exact_int()) {
                (Some(x), Some(y)) => x == y,
                _ => match (self.as_numeric(), other.as_numeric()) {
                    (Some((a, _)), Some((b, _))) => a == b || (a.is_nan() && b.is_nan()),
                    _ => self == other,
                },
            },
        }
    }
}

fn overflow() -> Error {
    Error::invalid_input("integer overflow")
}

/// Scalar arithmetic and comparison
///
/// `exact` carries both operands as `i64` when neither is a float; integer
/// results and comparisons use it so values beyond 2^53 stay exact.
fn scalar_op(
    op: BinaryOp,
    (a, a_dtype): (f64, Dtype),
    (b, b_dtype): (f64, Dtype),
    exact: Option<(i64, i64)>,
    errors: &mut FloatErrors,
) -> Result<Value> {
    match op {
        BinaryOp::Eq | BinaryOp::Ne => {
            let equal = match exact {
                Some((x, y)) => x == y,
                None => a == b,
            };
            return Ok(Value::Bool(equal == (op == BinaryOp::Eq)));
        }
        BinaryOp::Div | BinaryOp::RDiv => {
            let divisor = if op.is_reflected() { a } else { b };
            if divisor == 0.0 {
                return Err(Error::invalid_input("division by zero"));
            }
            return Ok(Value::Float(op.apply_f64(a, b, errors)));
        }
        _ => {}
    }

    let (x, y) = match exact {
        Some(pair) if a_dtype.promote(b_dtype, op) == Dtype::Int => pair,
        _ => return Ok(Value::Float(op.apply_f64(a, b, errors))),
    };
    let (x, y) = if op.is_reflected() { (y, x) } else { (x, y) };
    let out = match op {
        BinaryOp::Add | BinaryOp::RAdd => x.checked_add(y),
        BinaryOp::Sub | BinaryOp::RSub => x.checked_sub(y),
        BinaryOp::Mul | BinaryOp::RMul => x.checked_mul(y),
        _ => unreachable!("division and comparisons handled above"),
    };
    out.map(Value::Int).ok_or_else(overflow)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(a) => write!(f, "{}", a),
            Value::Axis(a) => write!(f, "Axis({}, {} labels)", a.name(), a.len()),
            Value::Object(o) => write!(f, "Object({} keys)", o.len()),
            Value::Opaque(o) => write!(f, "{:?}", o),
        }
    }
}

// ============================================================================
// From implementations for ergonomic API usage
// ============================================================================

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<LabeledArray> for Value {
    fn from(a: LabeledArray) -> Self {
        Value::Array(Arc::new(a))
    }
}

impl From<Arc<LabeledArray>> for Value {
    fn from(a: Arc<LabeledArray>) -> Self {
        Value::Array(a)
    }
}

impl From<Axis> for Value {
    fn from(a: Axis) -> Self {
        Value::Axis(Arc::new(a))
    }
}

impl From<Arc<Axis>> for Value {
    fn from(a: Arc<Axis>) -> Self {
        Value::Axis(a)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(o: BTreeMap<String, Value>) -> Self {
        Value::Object(o)
    }
}

impl From<OpaqueValue> for Value {
    fn from(o: OpaqueValue) -> Self {
        Value::Opaque(o)
    }
}
