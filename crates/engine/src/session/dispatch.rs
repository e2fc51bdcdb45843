//! Elementwise operators
//!
//! A binary operation walks the key universe: this session's names in
//! insertion order, then the right operand's extra names in its own order.
//! For each name:
//!
//! 1. the left value is this session's entry, or the undefined sentinel;
//! 2. the right value is the operand's entry (undefined if absent) when the
//!    operand is keyed, or the operand itself when it is broadcast;
//! 3. the left value evaluates the operator; if it declines (`Ok(None)`),
//!    the right value evaluates the reflected operator;
//! 4. any error, or both sides declining, yields the undefined sentinel.
//!
//! One entry failing never affects its siblings. Floating-point error
//! counts are summed over the whole pass and reported once.

use super::{NamedStore, Session};
use crate::config::FloatErrorPolicy;
use quiver_core::{BinaryOp, Error, FloatErrors, Operand, Result, UnaryOp, Value};
use std::ops::{Add, Div, Mul, Neg, Not, Sub};
use tracing::{trace, warn};

/// Evaluate `lhs op rhs`, falling back to `rhs reflected(op) lhs`
fn eval_binary(op: BinaryOp, lhs: &Value, rhs: &Value, errors: &mut FloatErrors) -> Result<Value> {
    if let Some(value) = lhs.binary_op(op, rhs, errors)? {
        return Ok(value);
    }
    if let Some(value) = rhs.binary_op(op.reflected(), lhs, errors)? {
        return Ok(value);
    }
    Err(Error::type_mismatch(format!(
        "unsupported operand types for {}: {} and {}",
        op,
        lhs.type_name(),
        rhs.type_name()
    )))
}

impl Session {
    /// Apply `op` per entry against `other`
    ///
    /// `other` is either keyed (a session, a map, a list of pairs) and
    /// aligned by name, or a single value broadcast to every entry.
    /// Never fails: entries that cannot be evaluated become
    /// [`Value::undefined()`].
    pub fn binop<'a>(&self, op: BinaryOp, other: impl Into<Operand<'a>>) -> Session {
        let other = other.into();
        let undefined = Value::undefined();

        let mut universe: Vec<&str> = self.keys().collect();
        if let Operand::Keyed(lookup) = other {
            universe.extend(
                lookup
                    .lookup_names()
                    .into_iter()
                    .filter(|name| !self.contains(name)),
            );
        }

        let mut errors = FloatErrors::default();
        let mut out = NamedStore::with_capacity(universe.len());
        for name in universe {
            let lhs = self.entries.get(name).unwrap_or(&undefined);
            let rhs = match other {
                Operand::Keyed(lookup) => lookup.lookup(name).unwrap_or(&undefined),
                Operand::Broadcast(value) => value,
            };

            let mut entry_errors = FloatErrors::default();
            let value = match eval_binary(op, lhs, rhs, &mut entry_errors) {
                Ok(value) => {
                    errors.merge(entry_errors);
                    value
                }
                Err(e) => {
                    trace!(target: "quiver::session", name, op = %op, error = %e, "Entry evaluated to undefined");
                    Value::undefined()
                }
            };
            out.insert(name.to_string(), value);
        }

        if !errors.is_clean() {
            self.report_float_errors(op, &errors);
        }
        self.derive(out)
    }

    /// Apply `op` to every entry
    ///
    /// Entries that do not support the operator become [`Value::undefined()`].
    pub fn unop(&self, op: UnaryOp) -> Session {
        let out = self
            .items()
            .map(|(name, value)| {
                let value = value.unary_op(op).unwrap_or_else(|e| {
                    trace!(target: "quiver::session", name, op = %op, error = %e, "Entry evaluated to undefined");
                    Value::undefined()
                });
                (name.to_string(), value)
            })
            .collect();
        self.derive(out)
    }

    fn report_float_errors(&self, op: BinaryOp, errors: &FloatErrors) {
        if let Some(handler) = &self.float_handler {
            handler(op, errors);
            return;
        }
        match self.config.float_errors {
            FloatErrorPolicy::Warn => {
                warn!(
                    target: "quiver::session",
                    op = %op,
                    divide_by_zero = errors.divide_by_zero,
                    invalid = errors.invalid,
                    overflow = errors.overflow,
                    "{}",
                    errors
                );
            }
            FloatErrorPolicy::Ignore => {}
        }
    }

    /// Elementwise `==`, one boolean per entry
    pub fn eq_elementwise<'a>(&self, other: impl Into<Operand<'a>>) -> Session {
        self.binop(BinaryOp::Eq, other)
    }

    /// Elementwise `!=`, one boolean per entry
    pub fn ne_elementwise<'a>(&self, other: impl Into<Operand<'a>>) -> Session {
        self.binop(BinaryOp::Ne, other)
    }

    /// Elementwise unary plus
    pub fn pos(&self) -> Session {
        self.unop(UnaryOp::Pos)
    }

    /// Elementwise absolute value
    pub fn abs(&self) -> Session {
        self.unop(UnaryOp::Abs)
    }

    /// Elementwise inversion (logical for booleans, bitwise for integers)
    pub fn invert(&self) -> Session {
        self.unop(UnaryOp::Invert)
    }
}

macro_rules! impl_session_binop {
    ($trait:ident, $method:ident, $op:expr, $rop:expr) => {
        impl<'a, 'b> $trait<&'b Session> for &'a Session {
            type Output = Session;

            fn $method(self, rhs: &'b Session) -> Session {
                self.binop($op, rhs)
            }
        }

        impl<'a, 'b> $trait<&'b Value> for &'a Session {
            type Output = Session;

            fn $method(self, rhs: &'b Value) -> Session {
                self.binop($op, rhs)
            }
        }

        impl<'a> $trait<f64> for &'a Session {
            type Output = Session;

            fn $method(self, rhs: f64) -> Session {
                self.binop($op, &Value::Float(rhs))
            }
        }

        impl<'a> $trait<i64> for &'a Session {
            type Output = Session;

            fn $method(self, rhs: i64) -> Session {
                self.binop($op, &Value::Int(rhs))
            }
        }

        // value on the left: every entry evaluates the reflected operator
        impl<'a, 'b> $trait<&'b Session> for &'a Value {
            type Output = Session;

            fn $method(self, rhs: &'b Session) -> Session {
                rhs.binop($rop, self)
            }
        }

        impl<'a> $trait<&'a Session> for f64 {
            type Output = Session;

            fn $method(self, rhs: &'a Session) -> Session {
                rhs.binop($rop, &Value::Float(self))
            }
        }

        impl<'a> $trait<&'a Session> for i64 {
            type Output = Session;

            fn $method(self, rhs: &'a Session) -> Session {
                rhs.binop($rop, &Value::Int(self))
            }
        }
    };
}

impl_session_binop!(Add, add, BinaryOp::Add, BinaryOp::RAdd);
impl_session_binop!(Sub, sub, BinaryOp::Sub, BinaryOp::RSub);
impl_session_binop!(Mul, mul, BinaryOp::Mul, BinaryOp::RMul);
impl_session_binop!(Div, div, BinaryOp::Div, BinaryOp::RDiv);

impl<'a> Neg for &'a Session {
    type Output = Session;

    fn neg(self) -> Session {
        self.unop(UnaryOp::Neg)
    }
}

impl<'a> Not for &'a Session {
    type Output = Session;

    fn not(self) -> Session {
        self.unop(UnaryOp::Invert)
    }
}
