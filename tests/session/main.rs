//! Session integration tests
//!
//! Cross-crate tests through the public `quiver` facade:
//! - scenarios: worked examples of elementwise dispatch and filtering
//! - persistence: round trips through every format engine
//! - invariants: property tests over ordering and key unions
//! - configuration: `quiver.toml` driving sessions and logging

#[path = "../common/mod.rs"]
mod common;

mod configuration;
mod invariants;
mod persistence;
mod scenarios;
