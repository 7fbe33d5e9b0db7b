//! Chunked file-transfer service.
//!
//! Callers open a session with Hello, move bytes with WriteChunk and
//! ReadChunk addressed by offset, then CompleteFile to verify and commit
//! atomically or DeleteFile to abandon. StoreWholeFile collapses the whole
//! exchange into one call for small payloads.

mod read;
mod service;
mod sweeper;

pub use read::ReadChunkStream;
pub use service::FileSenderService;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use cargohold_protocol::{ErrorKind, WireError};
use cargohold_registry::RegistryError;
use cargohold_store::StoreError;

/// Service limits and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceConfig {
    /// Largest chunk payload the server accepts. Hello lowers the
    /// per-session effective size when the client hints something smaller.
    pub max_chunk_size: usize,
    /// Largest single ReadChunk response payload.
    pub read_response_cap: usize,
    /// Largest StoreWholeFile payload. Must not exceed `max_chunk_size`.
    pub whole_file_cap: usize,
    /// Concurrent-session limit.
    pub max_sessions: usize,
    /// Session time-to-live from Hello until expiry.
    pub session_ttl: Duration,
    /// Interval between background expiry sweeps.
    pub sweep_interval: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: cargohold_protocol::DEFAULT_CHUNK_SIZE,
            read_response_cap: cargohold_protocol::DEFAULT_READ_RESPONSE_CAP,
            whole_file_cap: cargohold_protocol::DEFAULT_WHOLE_FILE_CAP,
            max_sessions: cargohold_protocol::DEFAULT_MAX_SESSIONS,
            session_ttl: cargohold_protocol::DEFAULT_SESSION_TTL,
            sweep_interval: cargohold_protocol::DEFAULT_SWEEP_INTERVAL,
        }
    }
}

/// Errors returned by the transfer service.
///
/// Validation failures are detected before any state mutation; storage
/// failures never leave a session's received-range bookkeeping out of
/// sync with what was actually accepted.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("failed precondition: {0}")]
    FailedPrecondition(String),

    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("data loss: {0}")]
    DataLoss(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl TransferError {
    /// The wire-level classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransferError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            TransferError::NotFound(_) => ErrorKind::NotFound,
            TransferError::FailedPrecondition(_) => ErrorKind::FailedPrecondition,
            TransferError::OutOfRange(_) => ErrorKind::OutOfRange,
            TransferError::DataLoss(_) => ErrorKind::DataLoss,
            TransferError::ResourceExhausted(_) => ErrorKind::ResourceExhausted,
            TransferError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            TransferError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Converts into the wire representation.
    pub fn to_wire(&self) -> WireError {
        WireError::new(self.kind(), self.to_string())
    }
}

impl From<StoreError> for TransferError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io(e) => TransferError::Internal(e.to_string()),
            StoreError::InvalidPath(msg) => TransferError::InvalidArgument(msg),
            StoreError::NotFound(what) => TransferError::NotFound(what),
            StoreError::AlreadyExists(what) => TransferError::AlreadyExists(what),
        }
    }
}

impl From<RegistryError> for TransferError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(id) => TransferError::NotFound(id),
            RegistryError::CapacityExhausted(limit) => {
                TransferError::ResourceExhausted(format!("session limit reached ({limit})"))
            }
            RegistryError::NotOpen { id, status } => {
                TransferError::FailedPrecondition(format!("transfer {id} is {status:?}"))
            }
        }
    }
}
