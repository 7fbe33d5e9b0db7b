use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::debug;

use cargohold_protocol::TransferStatus;

use crate::{RegistryError, TransferSession};

/// Process-scoped table of live transfer sessions.
///
/// The table lock is held only for lookups and inserts; all per-transfer
/// state lives behind each session's own lock, so chunk traffic on one
/// transfer never blocks another.
pub struct TransferRegistry {
    sessions: RwLock<HashMap<String, Arc<TransferSession>>>,
    max_sessions: usize,
    ttl: Duration,
}

impl TransferRegistry {
    pub fn new(max_sessions: usize, ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_sessions,
            ttl,
        }
    }

    /// Session time-to-live applied at creation.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of registered sessions (live and not yet swept).
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().unwrap().is_empty()
    }

    /// Registers a new open session under `id`.
    ///
    /// Fails `CapacityExhausted` at the concurrent-session limit.
    pub fn create(
        &self,
        id: String,
        target_path: String,
        declared_size: Option<u64>,
        chunk_size: usize,
    ) -> Result<Arc<TransferSession>, RegistryError> {
        let mut sessions = self.sessions.write().unwrap();
        if sessions.len() >= self.max_sessions {
            return Err(RegistryError::CapacityExhausted(self.max_sessions));
        }
        let session = Arc::new(TransferSession::new(
            id.clone(),
            target_path,
            declared_size,
            chunk_size,
            self.ttl,
        ));
        sessions.insert(id, Arc::clone(&session));
        Ok(session)
    }

    /// Looks up a live session.
    ///
    /// A session past its deadline is marked expired and reported as
    /// `NotFound`; expiry needs no sweeper to be observable. The entry
    /// stays in the table until [`take_expired`](Self::take_expired)
    /// harvests it, so its spool data is still reclaimed exactly once.
    pub fn get(&self, id: &str) -> Result<Arc<TransferSession>, RegistryError> {
        let session = { self.sessions.read().unwrap().get(id).cloned() };
        let Some(session) = session else {
            return Err(RegistryError::NotFound(id.to_string()));
        };
        if session.is_expired() {
            session.expire();
            debug!(transfer_id = %id, "expired session blocked on access");
        }
        if session.status() == TransferStatus::Expired {
            return Err(RegistryError::NotFound(id.to_string()));
        }
        Ok(session)
    }

    /// Removes a session from the table, returning it if present.
    pub fn remove(&self, id: &str) -> Option<Arc<TransferSession>> {
        self.sessions.write().unwrap().remove(id)
    }

    /// Evicts every expired session and returns them for reclamation.
    pub fn take_expired(&self) -> Vec<Arc<TransferSession>> {
        let mut sessions = self.sessions.write().unwrap();
        let expired_ids: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| s.is_expired() || s.status() == TransferStatus::Expired)
            .map(|(id, _)| id.clone())
            .collect();

        expired_ids
            .into_iter()
            .filter_map(|id| sessions.remove(&id))
            .map(|s| {
                s.expire();
                s
            })
            .collect()
    }
}
