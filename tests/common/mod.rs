//! Shared test utilities for the integration suites.
//!
//! Import via `mod common;` from a suite's main.rs.

#![allow(dead_code)]
#![allow(unused_imports)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex, Once};

pub use quiver::{
    Axis, BinaryOp, Dtype, Error, FloatErrors, LabeledArray, LoadOptions, SaveOptions, Session,
    SessionConfig, Value, ValueKind,
};
use tempfile::TempDir;

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness writer
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

// ============================================================================
// Fixtures
// ============================================================================

/// `e`: Int array over axes a (2) x b (3), values 0..6
pub fn e() -> LabeledArray {
    LabeledArray::sequence(vec![Axis::range("a", 2), Axis::range("b", 3)])
}

/// `f`: Int array over axes a (3) x b (2), values 0..6
pub fn f() -> LabeledArray {
    LabeledArray::sequence(vec![Axis::range("a", 3), Axis::range("b", 2)])
}

/// `g`: Float array over axis a (4) with a title
pub fn g() -> LabeledArray {
    LabeledArray::from_floats(vec![Axis::range("a", 4)], vec![0.5, 1.5, f64::NAN, -2.0])
        .unwrap()
        .with_title("quarterly g")
}

/// Session {e, f}
pub fn session_ef() -> Session {
    Session::from_pairs([("e", e()), ("f", f())])
}

/// Session mixing arrays, an axis and plain values
pub fn mixed_session() -> Session {
    let mut s = Session::new();
    s.set("e", e());
    s.set("g", g());
    s.set("f", f());
    s.add([Axis::range("b", 3)]).unwrap();
    s.set("title", "mixed");
    s.set("count", 3i64);
    s
}

// ============================================================================
// TestDir - temporary directory wrapper
// ============================================================================

/// Temporary directory removed on drop
pub struct TestDir {
    pub dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        TestDir { dir }
    }

    /// Path of `name` inside the directory
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

// ============================================================================
// Float error capture
// ============================================================================

/// Handler that records every report it receives
pub fn recording_handler() -> (quiver::FloatErrorHandler, Arc<Mutex<Vec<(BinaryOp, FloatErrors)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let handler: quiver::FloatErrorHandler = Arc::new(move |op: BinaryOp, errors: &FloatErrors| {
        sink.lock().unwrap().push((op, *errors));
    });
    (handler, seen)
}

/// Assert that two sessions hold the same names, in the same order, with equal values
pub fn assert_same_session(actual: &Session, expected: &Session) {
    assert_eq!(
        actual.keys().collect::<Vec<_>>(),
        expected.keys().collect::<Vec<_>>()
    );
    assert!(actual.equals(expected), "{:?} != {:?}", actual, expected);
}
