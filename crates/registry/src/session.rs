use std::sync::RwLock;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use cargohold_protocol::{TransferInfo, TransferStatus};

use crate::{RegistryError, ReceivedRangeSet};

/// One in-flight transfer session (thread-safe).
///
/// Identity and negotiated parameters are fixed at creation; only status
/// and the received ranges mutate, behind the session's own lock.
#[derive(Debug)]
pub struct TransferSession {
    id: String,
    target_path: String,
    declared_size: Option<u64>,
    chunk_size: usize,
    deadline: Instant,
    expires_at: DateTime<Utc>,
    inner: RwLock<SessionState>,
}

#[derive(Debug)]
struct SessionState {
    status: TransferStatus,
    ranges: ReceivedRangeSet,
}

impl TransferSession {
    /// Creates a new open session expiring `ttl` from now.
    pub fn new(
        id: String,
        target_path: String,
        declared_size: Option<u64>,
        chunk_size: usize,
        ttl: Duration,
    ) -> Self {
        Self {
            id,
            target_path,
            declared_size,
            chunk_size,
            deadline: Instant::now() + ttl,
            expires_at: Utc::now() + ttl,
            inner: RwLock::new(SessionState {
                status: TransferStatus::Open,
                ranges: ReceivedRangeSet::new(),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn target_path(&self) -> &str {
        &self.target_path
    }

    pub fn declared_size(&self) -> Option<u64> {
        self.declared_size
    }

    /// Largest payload WriteChunk accepts for this session.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn status(&self) -> TransferStatus {
        self.inner.read().unwrap().status
    }

    /// Snapshot of the received ranges.
    pub fn ranges(&self) -> ReceivedRangeSet {
        self.inner.read().unwrap().ranges.clone()
    }

    /// Total distinct bytes received so far.
    pub fn received_total(&self) -> u64 {
        self.inner.read().unwrap().ranges.total()
    }

    /// Returns `true` when an open session has outlived its deadline.
    pub fn is_expired(&self) -> bool {
        self.status() == TransferStatus::Open && Instant::now() >= self.deadline
    }

    /// Fails unless the session is open.
    pub fn ensure_open(&self) -> Result<(), RegistryError> {
        let status = self.status();
        if status != TransferStatus::Open {
            return Err(RegistryError::NotOpen {
                id: self.id.clone(),
                status,
            });
        }
        Ok(())
    }

    /// Records an accepted chunk range and returns the new received total.
    ///
    /// Fails when the session left the open state while the chunk was
    /// being written, leaving the range set untouched.
    pub fn record_range(&self, start: u64, end: u64) -> Result<u64, RegistryError> {
        let mut state = self.inner.write().unwrap();
        if state.status != TransferStatus::Open {
            return Err(RegistryError::NotOpen {
                id: self.id.clone(),
                status: state.status,
            });
        }
        state.ranges.insert(start, end);
        Ok(state.ranges.total())
    }

    /// Claims the session for completion (open → completing).
    ///
    /// Exclusive: a second claim fails until the first rolls back.
    pub fn begin_complete(&self) -> Result<(), RegistryError> {
        let mut state = self.inner.write().unwrap();
        if state.status != TransferStatus::Open {
            return Err(RegistryError::NotOpen {
                id: self.id.clone(),
                status: state.status,
            });
        }
        state.status = TransferStatus::Completing;
        Ok(())
    }

    /// Releases a failed completion claim (completing → open).
    pub fn rollback_complete(&self) {
        let mut state = self.inner.write().unwrap();
        if state.status == TransferStatus::Completing {
            state.status = TransferStatus::Open;
        }
    }

    /// Marks a successful commit (completing → completed).
    pub fn finish_complete(&self) {
        let mut state = self.inner.write().unwrap();
        if state.status == TransferStatus::Completing {
            state.status = TransferStatus::Completed;
        }
    }

    /// Abandons the session from any live state.
    pub fn abort(&self) {
        let mut state = self.inner.write().unwrap();
        if state.status.is_live() {
            state.status = TransferStatus::Aborted;
        }
    }

    /// Marks an open session expired.
    pub fn expire(&self) {
        let mut state = self.inner.write().unwrap();
        if state.status == TransferStatus::Open {
            state.status = TransferStatus::Expired;
        }
    }

    /// Operator snapshot.
    pub fn info(&self) -> TransferInfo {
        let state = self.inner.read().unwrap();
        TransferInfo {
            transfer_id: self.id.clone(),
            target_path: self.target_path.clone(),
            status: state.status,
            received_bytes: state.ranges.total() as i64,
            declared_size: self.declared_size.map(|s| s as i64),
            expires_at: self.expires_at,
        }
    }
}
