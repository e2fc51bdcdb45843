//! Labeled arrays
//!
//! A minimal n-dimensional array whose axes carry a name and string labels.
//! This is the value type the session container dispatches to; it only
//! implements what the container relies on:
//!
//! - elementwise arithmetic and comparison against another array with the
//!   same axes or against a numeric scalar
//! - unary negation, absolute value and inversion
//! - NaN-aware equality
//! - axis reordering and compaction of constant axes
//!
//! Data is stored row-major as `f64` alongside a [`Dtype`] tag. Integer
//! arrays are exact up to 2^53. Booleans are stored as `0.0` / `1.0`.

use crate::error::{Error, Result};
use crate::ops::{bool_to_f64, BinaryOp, FloatErrors, UnaryOp};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Token accepted by [`LabeledArray::transpose`] standing for "all other axes"
pub const ELLIPSIS: &str = "...";

/// Element type of a [`LabeledArray`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dtype {
    /// `true` / `false`
    Bool,
    /// 64-bit signed integer
    Int,
    /// 64-bit floating point
    Float,
}

impl Dtype {
    /// Result dtype of `op` applied to operands of type `self` and `other`
    pub fn promote(self, other: Dtype, op: BinaryOp) -> Dtype {
        match op {
            BinaryOp::Eq | BinaryOp::Ne => Dtype::Bool,
            BinaryOp::Div | BinaryOp::RDiv => Dtype::Float,
            _ if self == Dtype::Float || other == Dtype::Float => Dtype::Float,
            _ => Dtype::Int,
        }
    }

    /// Lowercase name, as used in file headers
    pub fn as_str(&self) -> &'static str {
        match self {
            Dtype::Bool => "bool",
            Dtype::Int => "int",
            Dtype::Float => "float",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named axis with unique string labels
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawAxis")]
pub struct Axis {
    name: String,
    labels: Vec<String>,
}

/// Serialized form of [`Axis`], checked by [`Axis::new`] on the way in
#[derive(Deserialize)]
struct RawAxis {
    name: String,
    labels: Vec<String>,
}

impl TryFrom<RawAxis> for Axis {
    type Error = Error;

    fn try_from(raw: RawAxis) -> Result<Self> {
        Axis::new(raw.name, raw.labels)
    }
}

impl Axis {
    /// Create an axis
    ///
    /// # Errors
    ///
    /// Fails if the name is empty or labels are not unique.
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        labels: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::invalid_input("axis name must not be empty"));
        }
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let mut seen = HashSet::with_capacity(labels.len());
        for label in &labels {
            if !seen.insert(label.as_str()) {
                return Err(Error::invalid_input(format!(
                    "duplicate label '{}' on axis '{}'",
                    label, name
                )));
            }
        }
        Ok(Self { name, labels })
    }

    /// Axis `name` with labels `{name}0 .. {name}{len-1}`
    pub fn range(name: impl Into<String>, len: usize) -> Self {
        let name = name.into();
        let labels = (0..len).map(|i| format!("{}{}", name, i)).collect();
        Self { name, labels }
    }

    /// Axis name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Labels in order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True if the axis has no labels
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Position of a label
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}

/// Right-hand operand of an array kernel
#[derive(Debug, Clone, Copy)]
pub enum ArrayRhs<'a> {
    /// Another array; axes must match exactly
    Array(&'a LabeledArray),
    /// Scalar broadcast to every element
    Scalar(f64, Dtype),
}

/// N-dimensional array with named, labeled axes
///
/// Deserialization goes through [`LabeledArray::new`], so stored data
/// whose length does not match its axes is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLabeledArray")]
pub struct LabeledArray {
    axes: Vec<Axis>,
    dtype: Dtype,
    data: Vec<f64>,
    title: String,
}

#[derive(Deserialize)]
struct RawLabeledArray {
    axes: Vec<Axis>,
    dtype: Dtype,
    data: Vec<f64>,
    #[serde(default)]
    title: String,
}

impl TryFrom<RawLabeledArray> for LabeledArray {
    type Error = Error;

    fn try_from(raw: RawLabeledArray) -> Result<Self> {
        Ok(LabeledArray::new(raw.axes, raw.dtype, raw.data)?.with_title(raw.title))
    }
}

fn shape_of(axes: &[Axis]) -> Vec<usize> {
    axes.iter().map(Axis::len).collect()
}

fn strides_of(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for i in (0..shape.len().saturating_sub(1)).rev() {
        strides[i] = strides[i + 1] * shape[i + 1];
    }
    strides
}

fn nan_eq(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

impl LabeledArray {
    /// Create an array from raw row-major data
    ///
    /// # Errors
    ///
    /// Fails if `data.len()` does not match the product of the axis lengths
    /// or if two axes share a name.
    pub fn new(axes: Vec<Axis>, dtype: Dtype, data: Vec<f64>) -> Result<Self> {
        let mut names = HashSet::with_capacity(axes.len());
        for axis in &axes {
            if !names.insert(axis.name()) {
                return Err(Error::invalid_input(format!(
                    "duplicate axis name '{}'",
                    axis.name()
                )));
            }
        }
        let expected: usize = axes.iter().map(Axis::len).product();
        if data.len() != expected {
            return Err(Error::invalid_input(format!(
                "data has {} elements but axes {:?} require {}",
                data.len(),
                shape_of(&axes),
                expected
            )));
        }
        let data = match dtype {
            Dtype::Bool => data.into_iter().map(|v| bool_to_f64(v != 0.0)).collect(),
            Dtype::Int => data.into_iter().map(f64::trunc).collect(),
            Dtype::Float => data,
        };
        Ok(Self {
            axes,
            dtype,
            data,
            title: String::new(),
        })
    }

    /// Float array
    pub fn from_floats(axes: Vec<Axis>, data: Vec<f64>) -> Result<Self> {
        Self::new(axes, Dtype::Float, data)
    }

    /// Integer array
    pub fn from_ints(axes: Vec<Axis>, data: Vec<i64>) -> Result<Self> {
        Self::new(axes, Dtype::Int, data.into_iter().map(|v| v as f64).collect())
    }

    /// Boolean array
    pub fn from_bools(axes: Vec<Axis>, data: Vec<bool>) -> Result<Self> {
        Self::new(axes, Dtype::Bool, data.into_iter().map(bool_to_f64).collect())
    }

    /// Zero-dimensional array holding one value
    pub fn scalar(dtype: Dtype, value: f64) -> Self {
        Self {
            axes: Vec::new(),
            dtype,
            data: vec![value],
            title: String::new(),
        }
    }

    /// Integer array holding `0, 1, 2, ...` in row-major order
    pub fn sequence(axes: Vec<Axis>) -> Self {
        let size: usize = axes.iter().map(Axis::len).product();
        Self {
            axes,
            dtype: Dtype::Int,
            data: (0..size).map(|v| v as f64).collect(),
            title: String::new(),
        }
    }

    /// Array with the same axes and dtype filled with `value`
    pub fn full_like(&self, value: f64) -> Self {
        Self {
            axes: self.axes.clone(),
            dtype: self.dtype,
            data: vec![value; self.data.len()],
            title: String::new(),
        }
    }

    /// Array with the same axes and dtype filled with zeros
    pub fn zeros_like(&self) -> Self {
        self.full_like(0.0)
    }

    /// Array with the same axes and dtype filled with ones
    pub fn ones_like(&self) -> Self {
        self.full_like(1.0)
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Title (may be empty)
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Axes in order
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// Axis by name
    pub fn axis(&self, name: &str) -> Option<&Axis> {
        self.axes.iter().find(|a| a.name() == name)
    }

    /// True if an axis with this name exists
    pub fn has_axis(&self, name: &str) -> bool {
        self.axis(name).is_some()
    }

    /// Axis names in order
    pub fn axis_names(&self) -> Vec<&str> {
        self.axes.iter().map(Axis::name).collect()
    }

    /// Human-readable axis list, e.g. `"a, b"`
    pub fn display_names(&self) -> String {
        self.axis_names().join(", ")
    }

    /// Axis lengths
    pub fn shape(&self) -> Vec<usize> {
        shape_of(&self.axes)
    }

    /// Number of axes
    pub fn ndim(&self) -> usize {
        self.axes.len()
    }

    /// Number of elements
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Element type
    pub fn dtype(&self) -> Dtype {
        self.dtype
    }

    /// Raw row-major values
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    /// Element at the given labels (one per axis, in axis order)
    pub fn get(&self, labels: &[&str]) -> Option<f64> {
        if labels.len() != self.axes.len() {
            return None;
        }
        let strides = strides_of(&self.shape());
        let mut flat = 0;
        for ((axis, label), stride) in self.axes.iter().zip(labels).zip(&strides) {
            flat += axis.index_of(label)? * stride;
        }
        self.data.get(flat).copied()
    }

    /// True if every element is non-zero (NaN counts as true)
    pub fn all(&self) -> bool {
        self.data.iter().all(|v| *v != 0.0)
    }

    /// True if any element is non-zero
    pub fn any(&self) -> bool {
        self.data.iter().any(|v| *v != 0.0)
    }

    /// True if every element is NaN
    pub fn all_nan(&self) -> bool {
        self.data.iter().all(|v| v.is_nan())
    }

    /// Labels of a one-dimensional boolean array where the value is true
    ///
    /// # Errors
    ///
    /// `TypeMismatch` if the array is not boolean or not one-dimensional.
    pub fn true_labels(&self) -> Result<Vec<&str>> {
        if self.dtype != Dtype::Bool {
            return Err(Error::type_mismatch(format!(
                "expected a boolean array, got dtype {}",
                self.dtype
            )));
        }
        if self.ndim() != 1 {
            return Err(Error::type_mismatch(format!(
                "expected a one-dimensional array, got {} dimensions",
                self.ndim()
            )));
        }
        Ok(self.axes[0]
            .labels()
            .iter()
            .zip(&self.data)
            .filter(|(_, v)| **v != 0.0)
            .map(|(l, _)| l.as_str())
            .collect())
    }

    /// Elementwise binary operation
    ///
    /// # Errors
    ///
    /// `IncompatibleAxes` if an array operand does not have exactly the same
    /// axes. Floating-point exceptional conditions are recorded in `errors`.
    pub fn binary_op(
        &self,
        op: BinaryOp,
        rhs: ArrayRhs<'_>,
        errors: &mut FloatErrors,
    ) -> Result<LabeledArray> {
        let (dtype, data) = match rhs {
            ArrayRhs::Array(other) => {
                if self.axes != other.axes {
                    return Err(Error::incompatible_axes(format!(
                        "{:?} {:?} vs {:?} {:?}",
                        self.axis_names(),
                        self.shape(),
                        other.axis_names(),
                        other.shape()
                    )));
                }
                let data = self
                    .data
                    .iter()
                    .zip(&other.data)
                    .map(|(a, b)| op.apply_f64(*a, *b, errors))
                    .collect();
                (self.dtype.promote(other.dtype, op), data)
            }
            ArrayRhs::Scalar(value, scalar_dtype) => {
                let data = self
                    .data
                    .iter()
                    .map(|a| op.apply_f64(*a, value, errors))
                    .collect();
                (self.dtype.promote(scalar_dtype, op), data)
            }
        };
        Ok(Self {
            axes: self.axes.clone(),
            dtype,
            data,
            title: String::new(),
        })
    }

    /// Elementwise unary operation
    ///
    /// # Errors
    ///
    /// `TypeMismatch` for negation or absolute value of a boolean array and
    /// for inversion of a float array.
    pub fn unary_op(&self, op: UnaryOp) -> Result<LabeledArray> {
        let data: Vec<f64> = match (op, self.dtype) {
            (UnaryOp::Pos, _) => self.data.clone(),
            (UnaryOp::Neg | UnaryOp::Abs, Dtype::Bool) => {
                return Err(Error::type_mismatch(format!(
                    "operator {} is not supported for boolean arrays",
                    op
                )))
            }
            (UnaryOp::Neg, _) => self.data.iter().map(|v| -v + 0.0).collect(),
            (UnaryOp::Abs, _) => self.data.iter().map(|v| v.abs()).collect(),
            (UnaryOp::Invert, Dtype::Bool) => self.data.iter().map(|v| 1.0 - v).collect(),
            (UnaryOp::Invert, Dtype::Int) => {
                self.data.iter().map(|v| !(*v as i64) as f64).collect()
            }
            (UnaryOp::Invert, Dtype::Float) => {
                return Err(Error::type_mismatch(
                    "operator invert is not supported for float arrays",
                ))
            }
        };
        Ok(Self {
            axes: self.axes.clone(),
            dtype: self.dtype,
            data,
            title: self.title.clone(),
        })
    }

    /// Same axes and same values
    ///
    /// With `nan_equals`, NaN compares equal to NaN. Dtype is not compared:
    /// an integer array equals a float array holding the same numbers.
    pub fn equals(&self, other: &LabeledArray, nan_equals: bool) -> bool {
        if self.axes != other.axes {
            return false;
        }
        self.data.iter().zip(&other.data).all(|(a, b)| {
            if nan_equals {
                nan_eq(*a, *b)
            } else {
                a == b
            }
        })
    }

    /// Reorder axes
    ///
    /// `order` lists axis names. Listed axes come first in the given order
    /// and unlisted axes follow in their current order. If `order` contains
    /// [`ELLIPSIS`], the names before it go first, the names after it go
    /// last and unlisted axes fill the middle.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if a name is not an axis of this array or is repeated.
    pub fn transpose(&self, order: &[&str]) -> Result<LabeledArray> {
        let perm = self.resolve_axis_order(order)?;
        if perm.iter().enumerate().all(|(i, p)| i == *p) {
            return Ok(self.clone());
        }

        let old_strides = strides_of(&self.shape());
        let axes: Vec<Axis> = perm.iter().map(|p| self.axes[*p].clone()).collect();
        let new_shape = shape_of(&axes);
        let mut data = Vec::with_capacity(self.data.len());
        let mut index = vec![0usize; new_shape.len()];
        for _ in 0..self.data.len() {
            let flat: usize = index
                .iter()
                .zip(&perm)
                .map(|(i, p)| i * old_strides[*p])
                .sum();
            data.push(self.data[flat]);
            // odometer increment, last axis fastest
            for d in (0..index.len()).rev() {
                index[d] += 1;
                if index[d] < new_shape[d] {
                    break;
                }
                index[d] = 0;
            }
        }

        Ok(Self {
            axes,
            dtype: self.dtype,
            data,
            title: self.title.clone(),
        })
    }

    fn resolve_axis_order(&self, order: &[&str]) -> Result<Vec<usize>> {
        let ellipsis = order.iter().position(|name| *name == ELLIPSIS);
        let (front, back) = match ellipsis {
            Some(pos) => (&order[..pos], &order[pos + 1..]),
            None => (order, &[][..]),
        };

        let mut seen = HashSet::new();
        let mut lookup = |name: &str| -> Result<usize> {
            if name == ELLIPSIS {
                return Err(Error::invalid_input("'...' may only appear once"));
            }
            let pos = self
                .axes
                .iter()
                .position(|a| a.name() == name)
                .ok_or_else(|| {
                    Error::invalid_input(format!(
                        "axis '{}' not found in {:?}",
                        name,
                        self.axis_names()
                    ))
                })?;
            if !seen.insert(pos) {
                return Err(Error::invalid_input(format!("axis '{}' listed twice", name)));
            }
            Ok(pos)
        };

        let front: Vec<usize> = front.iter().map(|n| lookup(n)).collect::<Result<_>>()?;
        let back: Vec<usize> = back.iter().map(|n| lookup(n)).collect::<Result<_>>()?;
        let middle = (0..self.axes.len()).filter(|i| !seen.contains(i));

        Ok(front.into_iter().chain(middle).chain(back).collect())
    }

    /// Drop axes along which the values never change
    ///
    /// Returns `None` if no axis is constant, otherwise the compacted array
    /// and the names of the removed axes.
    pub fn compact(&self) -> Option<(LabeledArray, Vec<String>)> {
        let mut current = self.clone();
        let mut removed = Vec::new();
        let mut axis = 0;
        while axis < current.ndim() {
            if current.size() > 0 && current.is_constant_along(axis) {
                removed.push(current.axes[axis].name().to_string());
                current = current.take_first(axis);
            } else {
                axis += 1;
            }
        }
        if removed.is_empty() {
            None
        } else {
            Some((current, removed))
        }
    }

    fn is_constant_along(&self, axis: usize) -> bool {
        let strides = strides_of(&self.shape());
        let len = self.axes[axis].len();
        let stride = strides[axis];
        self.data.iter().enumerate().all(|(flat, v)| {
            let pos = (flat / stride) % len;
            nan_eq(*v, self.data[flat - pos * stride])
        })
    }

    fn take_first(&self, axis: usize) -> LabeledArray {
        let strides = strides_of(&self.shape());
        let len = self.axes[axis].len();
        let stride = strides[axis];
        let data = self
            .data
            .iter()
            .enumerate()
            .filter(|(flat, _)| (flat / stride) % len == 0)
            .map(|(_, v)| *v)
            .collect();
        let mut axes = self.axes.clone();
        axes.remove(axis);
        LabeledArray {
            axes,
            dtype: self.dtype,
            data,
            title: self.title.clone(),
        }
    }
}

impl fmt::Display for LabeledArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self
            .axes
            .iter()
            .map(|a| format!("{} [{}]", a.name(), a.len()))
            .collect();
        write!(f, "LabeledArray<{}>({})", self.dtype, dims.join(" x "))
    }
}
