//! Byte-range storage for transfer spools and committed objects.
//!
//! A spool holds the partially received bytes of one transfer session,
//! addressed by (transfer id, byte offset). Committing atomically turns a
//! spool into an immutable object at its target path.

mod checksum;
mod disk;
mod validation;

pub use checksum::{checksum_bytes, file_checksum};
pub use disk::DiskStore;
pub use validation::validate_target_path;

use std::path::PathBuf;

/// Errors produced by the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),
}

/// Byte-addressable storage backing the transfer service.
///
/// Methods are synchronous; callers on an async runtime dispatch them via
/// `spawn_blocking`. Implementations must be safe to call from multiple
/// threads at once, since concurrent writes to disjoint ranges of one
/// spool are the normal case.
pub trait ChunkStore: Send + Sync + 'static {
    /// Writes `data` into the spool for `id` at `offset`, extending the
    /// spool as needed. Returns the number of bytes written.
    fn write_at(&self, id: &str, offset: u64, data: &[u8]) -> Result<usize, StoreError>;

    /// Reads up to `len` bytes from the spool for `id` starting at `offset`,
    /// clipped to the current spool length. A missing spool reads as empty.
    fn read_spool(&self, id: &str, offset: u64, len: usize) -> Result<Vec<u8>, StoreError>;

    /// Current spool length in bytes (0 if nothing was written).
    fn spool_len(&self, id: &str) -> Result<u64, StoreError>;

    /// SHA-256 hex digest over the entire spool for `id`.
    fn spool_checksum(&self, id: &str) -> Result<String, StoreError>;

    /// Atomically publishes the spool for `id` as the object at `target`.
    ///
    /// With `overwrite` false an existing object fails `AlreadyExists`
    /// before anything is moved. Concurrent readers never observe a
    /// partially assembled object.
    fn publish(&self, id: &str, target: &str, overwrite: bool) -> Result<PathBuf, StoreError>;

    /// Removes spool data for `id`. Removing an absent spool succeeds.
    fn discard(&self, id: &str) -> Result<(), StoreError>;

    /// Reads up to `len` bytes of the committed object at `target`
    /// starting at `offset`, clipped to the object length.
    fn read_object(&self, target: &str, offset: u64, len: usize) -> Result<Vec<u8>, StoreError>;

    /// Length of the committed object at `target`, or `NotFound`.
    fn object_len(&self, target: &str) -> Result<u64, StoreError>;

    /// Removes the committed object at `target`. Removing an absent
    /// object succeeds.
    fn delete_object(&self, target: &str) -> Result<(), StoreError>;
}
