//! Transfer session registry.
//!
//! Tracks every in-flight transfer: which byte ranges arrived, what state
//! the session is in, and when it expires. Sessions are locked
//! individually so unrelated transfers never serialize on each other.

mod ranges;
mod registry;
mod session;

pub use ranges::ReceivedRangeSet;
pub use registry::TransferRegistry;
pub use session::TransferSession;

use cargohold_protocol::TransferStatus;

/// Errors produced by the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("transfer not found: {0}")]
    NotFound(String),

    #[error("session limit reached ({0})")]
    CapacityExhausted(usize),

    #[error("transfer {id} is {status:?}, expected open")]
    NotOpen { id: String, status: TransferStatus },
}
