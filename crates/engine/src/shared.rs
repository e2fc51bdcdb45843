//! Shared session handle
//!
//! A [`Session`] is not synchronized. Callers that mutate one session from
//! several threads wrap it in a [`SharedSession`]:
//! - `parking_lot::RwLock` for many readers / one writer, no poisoning
//! - `Arc` so every thread holds the same session
//!
//! Elementwise operators and derived operations only need a read lock;
//! they build a new session.

use crate::session::Session;
use parking_lot::RwLock;
use std::sync::Arc;

/// Session behind a reader-writer lock
pub type SharedSession = Arc<RwLock<Session>>;

/// Wrap `session` for sharing between threads
pub fn share(session: Session) -> SharedSession {
    Arc::new(RwLock::new(session))
}

/// Shallow copy of the current state, taken under a read lock
pub fn snapshot(shared: &SharedSession) -> Session {
    shared.read().copy()
}

impl Session {
    /// Move this session behind a [`SharedSession`]
    pub fn into_shared(self) -> SharedSession {
        share(self)
    }
}
