//! Operator identities and floating-point error accounting
//!
//! Binary operators come in forward and reflected pairs (`Sub` / `RSub`).
//! A reflected operator evaluates with the operands swapped, so
//! `x.binary_op(RSub, y)` computes `y - x`. The dispatcher uses
//! [`BinaryOp::reflected`] to retry an operation on the right operand when
//! the left one reports "not implemented".

use std::fmt;

/// Elementwise binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `a + b`
    Add,
    /// `b + a`
    RAdd,
    /// `a - b`
    Sub,
    /// `b - a`
    RSub,
    /// `a * b`
    Mul,
    /// `b * a`
    RMul,
    /// `a / b` (true division, always floating point)
    Div,
    /// `b / a`
    RDiv,
    /// `a == b`
    Eq,
    /// `a != b`
    Ne,
}

impl BinaryOp {
    /// Operator to try on the right operand when the left one declines
    ///
    /// Comparisons are their own reflection.
    pub fn reflected(self) -> Self {
        match self {
            BinaryOp::Add => BinaryOp::RAdd,
            BinaryOp::RAdd => BinaryOp::Add,
            BinaryOp::Sub => BinaryOp::RSub,
            BinaryOp::RSub => BinaryOp::Sub,
            BinaryOp::Mul => BinaryOp::RMul,
            BinaryOp::RMul => BinaryOp::Mul,
            BinaryOp::Div => BinaryOp::RDiv,
            BinaryOp::RDiv => BinaryOp::Div,
            BinaryOp::Eq => BinaryOp::Eq,
            BinaryOp::Ne => BinaryOp::Ne,
        }
    }

    /// True for the reflected (`R*`) variants
    pub fn is_reflected(self) -> bool {
        matches!(
            self,
            BinaryOp::RAdd | BinaryOp::RSub | BinaryOp::RMul | BinaryOp::RDiv
        )
    }

    /// True for `Eq` and `Ne`
    pub fn is_comparison(self) -> bool {
        matches!(self, BinaryOp::Eq | BinaryOp::Ne)
    }

    /// Apply to two floats, recording exceptional conditions
    ///
    /// Operand order is already resolved: reflected variants swap here.
    pub fn apply_f64(self, lhs: f64, rhs: f64, errors: &mut FloatErrors) -> f64 {
        let (a, b) = if self.is_reflected() {
            (rhs, lhs)
        } else {
            (lhs, rhs)
        };
        let out = match self {
            BinaryOp::Add | BinaryOp::RAdd => a + b,
            BinaryOp::Sub | BinaryOp::RSub => a - b,
            BinaryOp::Mul | BinaryOp::RMul => a * b,
            BinaryOp::Div | BinaryOp::RDiv => {
                if b == 0.0 {
                    if a == 0.0 {
                        errors.invalid += 1;
                    } else if !a.is_nan() {
                        errors.divide_by_zero += 1;
                    }
                    return a / b;
                }
                a / b
            }
            BinaryOp::Eq => return bool_to_f64(a == b),
            BinaryOp::Ne => return bool_to_f64(a != b),
        };
        if !a.is_nan() && !b.is_nan() {
            if out.is_nan() {
                errors.invalid += 1;
            } else if out.is_infinite() && a.is_finite() && b.is_finite() && b != 0.0 {
                errors.overflow += 1;
            }
        }
        out
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "add",
            BinaryOp::RAdd => "radd",
            BinaryOp::Sub => "sub",
            BinaryOp::RSub => "rsub",
            BinaryOp::Mul => "mul",
            BinaryOp::RMul => "rmul",
            BinaryOp::Div => "truediv",
            BinaryOp::RDiv => "rtruediv",
            BinaryOp::Eq => "eq",
            BinaryOp::Ne => "ne",
        };
        f.write_str(s)
    }
}

/// Elementwise unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-a`
    Neg,
    /// `+a`
    Pos,
    /// `|a|`
    Abs,
    /// bitwise not for integers, logical not for booleans
    Invert,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnaryOp::Neg => "neg",
            UnaryOp::Pos => "pos",
            UnaryOp::Abs => "abs",
            UnaryOp::Invert => "invert",
        };
        f.write_str(s)
    }
}

pub(crate) fn bool_to_f64(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Counts of floating-point exceptional conditions seen during one pass
///
/// Kernels increment these instead of raising; the session reports the
/// totals once per elementwise call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FloatErrors {
    /// Finite non-zero value divided by zero
    pub divide_by_zero: usize,
    /// NaN produced from non-NaN inputs (0/0, inf - inf, ...)
    pub invalid: usize,
    /// Finite inputs producing an infinite result
    pub overflow: usize,
}

impl FloatErrors {
    /// True when nothing was recorded
    pub fn is_clean(&self) -> bool {
        self.divide_by_zero == 0 && self.invalid == 0 && self.overflow == 0
    }

    /// Add another accumulator's counts into this one
    pub fn merge(&mut self, other: FloatErrors) {
        self.divide_by_zero += other.divide_by_zero;
        self.invalid += other.invalid;
        self.overflow += other.overflow;
    }

    /// Names of the conditions that occurred, e.g. `["divide by zero"]`
    pub fn kinds(&self) -> Vec<&'static str> {
        let mut kinds = Vec::new();
        if self.divide_by_zero > 0 {
            kinds.push("divide by zero");
        }
        if self.invalid > 0 {
            kinds.push("invalid value");
        }
        if self.overflow > 0 {
            kinds.push("overflow");
        }
        kinds
    }
}

impl fmt::Display for FloatErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} encountered during operation", self.kinds().join(", "))
    }
}
