//! Quiver - ordered containers of named labeled arrays
//!
//! A [`Session`] maps names to values (labeled arrays, axes, scalars,
//! strings, arbitrary objects) in insertion order. Arithmetic and
//! comparison operators apply per entry, aligned by name; an entry that
//! cannot be evaluated becomes the undefined sentinel instead of failing
//! the whole operation.
//!
//! # Quick Start
//!
//! ```ignore
//! use quiver::{Axis, LabeledArray, Session};
//!
//! let mut s = Session::new();
//! s.set("e", LabeledArray::sequence(vec![Axis::range("a", 2), Axis::range("b", 3)]));
//! s.set("f", LabeledArray::sequence(vec![Axis::range("a", 3), Axis::range("b", 2)]));
//!
//! let shifted = &s + 1i64;
//! shifted.save("out.h5")?;
//! let back = Session::open("out.h5")?;
//! assert!(back.equals(&shifted));
//! ```
//!
//! # Architecture
//!
//! - `quiver-core`: values, labeled arrays, operator kernels, errors
//! - `quiver-durability`: format engines (bundle, binary, csv, excel) and their registry
//! - `quiver-engine`: the session container, configuration and shared handle
//!
//! Everything public is re-exported from `quiver-engine`.

pub use quiver_engine::*;
