//! Wire protocol types for the cargohold transfer service.
//!
//! One request/response type pair per RPC operation, plus the error
//! taxonomy shared by every handler. Payload bytes are base64-encoded in
//! JSON; field names are camelCase on the wire.

pub mod error;
pub mod messages;
pub mod types;

pub use error::{ErrorKind, WireError};
pub use types::{TransferInfo, TransferStatus};

use std::time::Duration;

/// Default negotiated chunk size: 4 MiB.
///
/// Larger chunks reduce per-chunk overhead (SHA-256, ACKs, syscalls).
/// Hello lowers the effective size when a client hints something smaller.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Cap on a single ReadChunk response payload (256 KiB).
///
/// Longer reads are delivered as a finite sequence of responses.
pub const DEFAULT_READ_RESPONSE_CAP: usize = 256 * 1024;

/// Cap on StoreWholeFile payloads (2 MiB). Larger files must use the
/// chunked path. Must not exceed the server chunk size.
pub const DEFAULT_WHOLE_FILE_CAP: usize = 2 * 1024 * 1024;

/// Default limit on concurrently open transfer sessions.
pub const DEFAULT_MAX_SESSIONS: usize = 64;

/// Default session time-to-live from Hello until expiry.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(15 * 60);

/// Default interval between expiry sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);
