use serde::{Deserialize, Serialize};

/// Classification of a failed RPC operation.
///
/// Every error a handler returns maps onto exactly one kind; transports
/// translate kinds into their own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed input, detected before any state mutation.
    #[serde(rename = "invalid_argument")]
    InvalidArgument,
    /// Unknown transfer session or committed object.
    #[serde(rename = "not_found")]
    NotFound,
    /// The session is in the wrong state for the requested transition.
    #[serde(rename = "failed_precondition")]
    FailedPrecondition,
    /// Address beyond the bounds of the addressed data.
    #[serde(rename = "out_of_range")]
    OutOfRange,
    /// Integrity check failed at commit time.
    #[serde(rename = "data_loss")]
    DataLoss,
    /// A configured limit was reached.
    #[serde(rename = "resource_exhausted")]
    ResourceExhausted,
    /// Commit-time collision with an existing object.
    #[serde(rename = "already_exists")]
    AlreadyExists,
    /// Storage-layer failure.
    #[serde(rename = "internal")]
    Internal,
}

/// Error details returned to a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireError {
    pub kind: ErrorKind,
    pub message: String,
}

impl WireError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}
