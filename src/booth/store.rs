//! In-memory registry of booth sessions

use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

use crate::booth::session::BoothSession;
use crate::error::{AppError, Result};

pub type SharedSession = Arc<Mutex<BoothSession>>;

/// Sessions keyed by id. Guards are short-lived and never held across an await.
pub struct SessionStore {
    sessions: DashMap<Uuid, SharedSession>,
    max_retakes: u32,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(max_retakes: u32, ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            max_retakes,
            ttl,
        }
    }

    /// Start a new session, dropping any that have been idle past the TTL
    pub fn create(&self) -> SharedSession {
        self.prune();
        let session = BoothSession::new(self.max_retakes);
        let id = session.id();
        let shared = Arc::new(Mutex::new(session));
        self.sessions.insert(id, shared.clone());
        debug!(session = %id, "Created booth session");
        shared
    }

    pub fn get(&self, id: &Uuid) -> Result<SharedSession> {
        self.sessions
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| AppError::SessionNotFound(id.to_string()))
    }

    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// Remove idle sessions without an operation in flight
    pub fn prune(&self) -> usize {
        let before = self.sessions.len();
        let ttl = self.ttl;
        self.sessions.retain(|_, session| {
            let session = session.lock();
            session.processing().is_some() || session.idle_for() < ttl
        });
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            debug!(removed = removed, "Pruned idle booth sessions");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
