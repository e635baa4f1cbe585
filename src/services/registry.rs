//! Document Registry
//!
//! In-memory store of pending analysis sessions, keyed by session id.
//! Entries live from upload until their analysis stream starts. Leasing
//! takes the entry out under the lock, so each session streams at most once
//! and a second lease on the same id is `NotFound`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::models::session::SessionRecord;
use crate::utils::error::{AppError, AppResult};

/// Shared session store. Cheap to clone; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct DocumentRegistry {
    sessions: Arc<Mutex<HashMap<String, SessionRecord>>>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionRecord>> {
        // A poisoned map is still structurally valid
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store a session and return its id.
    pub fn put(&self, session: SessionRecord) -> String {
        let id = session.id.clone();
        let mut sessions = self.lock();
        if sessions.insert(id.clone(), session).is_some() {
            tracing::warn!("Session {} replaced an existing entry", id);
        }
        tracing::debug!("Registered session {} ({} pending)", id, sessions.len());
        id
    }

    /// Clone of a stored session.
    pub fn get(&self, id: &str) -> Option<SessionRecord> {
        self.lock().get(id).cloned()
    }

    /// Remove a session, returning it if it existed.
    pub fn remove(&self, id: &str) -> Option<SessionRecord> {
        let removed = self.lock().remove(id);
        if removed.is_some() {
            tracing::debug!("Removed session {}", id);
        }
        removed
    }

    /// Take a session out of the store for streaming.
    pub fn lease(&self, id: &str) -> AppResult<SessionLease> {
        let session = self
            .remove(id)
            .ok_or_else(|| AppError::not_found(format!("Session {}", id)))?;
        Ok(SessionLease { session })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Sole owner of a session for the duration of one analysis stream.
#[derive(Debug)]
pub struct SessionLease {
    session: SessionRecord,
}

impl SessionLease {
    pub fn session(&self) -> &SessionRecord {
        &self.session
    }

    pub fn id(&self) -> &str {
        &self.session.id
    }
}
