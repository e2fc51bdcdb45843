//! Core types and traits for quiver
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: Unified value enum for everything a session can hold
//! - LabeledArray / Axis / Dtype: the array type sessions dispatch to
//! - BinaryOp / UnaryOp / FloatErrors: operator identities and float error accounting
//! - ValueKind: predicates used to select entries
//! - NameLookup / Operand: the keyed-lookup capability of operator operands
//! - Error: Error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod array;
pub mod error;
pub mod kind;
pub mod ops;
pub mod traits;
pub mod value;

pub use array::{ArrayRhs, Axis, Dtype, LabeledArray, ELLIPSIS};
pub use error::{BoxedCause, Error, Result};
pub use kind::ValueKind;
pub use ops::{BinaryOp, FloatErrors, UnaryOp};
pub use traits::{NameLookup, Operand};
pub use value::{OpaqueValue, Value};
