use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Session negotiation
// ---------------------------------------------------------------------------

/// Opens a new transfer session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelloRequest {
    /// Relative path the committed file will live at.
    pub target_path: String,
    /// Total file size in bytes, when the caller knows it up front.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_size: Option<i64>,
    /// Client-preferred chunk size (0 = no preference).
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub chunk_size_hint: i64,
}

/// Negotiated session parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelloResponse {
    pub transfer_id: String,
    /// Largest payload WriteChunk will accept for this session.
    pub effective_chunk_size: i64,
    pub expires_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Chunk I/O
// ---------------------------------------------------------------------------

/// Uploads one contiguous byte range.
///
/// The `data` field is base64-encoded in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteChunkRequest {
    pub transfer_id: String,
    /// Byte offset within the file.
    pub offset: i64,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    /// SHA-256 hex checksum of `data` (empty means no verification).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub checksum: String,
}

/// Acknowledges an accepted chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteChunkResponse {
    pub bytes_written: i64,
    /// Running total of distinct bytes received for the session.
    pub received_total: i64,
}

/// Downloads a byte range from a session spool or a committed object.
///
/// `target` is resolved as a live transfer id first, then as an object path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadChunkRequest {
    pub target: String,
    pub offset: i64,
    pub length: i64,
}

/// One response in a ReadChunk stream. The offset lets callers detect
/// skipped gaps when reading an in-flight session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadChunkResponse {
    pub offset: i64,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// Verifies coverage and commits the assembled file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteFileRequest {
    pub transfer_id: String,
    /// SHA-256 hex checksum over the whole file (empty means no verification).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub checksum: String,
    /// Replace an existing object at the target path instead of failing.
    #[serde(default, skip_serializing_if = "is_false")]
    pub overwrite: bool,
}

/// Result of a successful commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteFileResponse {
    pub final_size: i64,
    pub committed_path: String,
}

/// Discards a live session or removes a committed object.
///
/// `target` is resolved the same way as in [`ReadChunkRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileRequest {
    pub target: String,
}

/// Deletion acknowledgement. Absent targets still report `ok`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFileResponse {
    pub ok: bool,
}

// ---------------------------------------------------------------------------
// Whole-file shortcut
// ---------------------------------------------------------------------------

/// Stores a small file in a single call (session + write + commit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreWholeFileRequest {
    pub target_path: String,
    #[serde(with = "base64_bytes")]
    pub data: Vec<u8>,
    /// SHA-256 hex checksum of `data` (empty means no verification).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub checksum: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub overwrite: bool,
}

/// Result of a successful whole-file store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreWholeFileResponse {
    pub final_size: i64,
    pub committed_path: String,
}

// ---------------------------------------------------------------------------
// Serde helpers
// ---------------------------------------------------------------------------

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}

fn is_false(v: &bool) -> bool {
    !*v
}

mod base64_bytes {
    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        STANDARD.encode(data).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_chunk_base64_roundtrip() {
        let req = WriteChunkRequest {
            transfer_id: "t1".into(),
            offset: 0,
            data: vec![0x48, 0x65, 0x6c, 0x6c, 0x6f],
            checksum: String::new(),
        };
        let json = serde_json::to_string(&req).unwrap();
        // "Hello" = "SGVsbG8=" in base64.
        assert!(json.contains("SGVsbG8="));
        let parsed: WriteChunkRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.data, vec![0x48, 0x65, 0x6c, 0x6c, 0x6f]);
    }

    #[test]
    fn hello_omits_absent_fields() {
        let req = HelloRequest {
            target_path: "backups/db.tar".into(),
            declared_size: None,
            chunk_size_hint: 0,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("declaredSize"));
        assert!(!json.contains("chunkSizeHint"));
    }

    #[test]
    fn hello_keeps_zero_declared_size() {
        // declaredSize: 0 is a real declaration (empty file), not absence.
        let req = HelloRequest {
            target_path: "empty.bin".into(),
            declared_size: Some(0),
            chunk_size_hint: 0,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"declaredSize\":0"));
    }

    #[test]
    fn complete_file_omits_defaults() {
        let req = CompleteFileRequest {
            transfer_id: "t1".into(),
            checksum: String::new(),
            overwrite: false,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(!json.contains("checksum"));
        assert!(!json.contains("overwrite"));
    }

    #[test]
    fn complete_file_defaults_on_parse() {
        let req: CompleteFileRequest =
            serde_json::from_str(r#"{"transferId":"t1"}"#).unwrap();
        assert_eq!(req.transfer_id, "t1");
        assert!(req.checksum.is_empty());
        assert!(!req.overwrite);
    }

    #[test]
    fn read_chunk_request_camel_case() {
        let req = ReadChunkRequest {
            target: "t1".into(),
            offset: 4096,
            length: 1024,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"offset\":4096"));
        assert!(json.contains("\"length\":1024"));
    }

    #[test]
    fn store_whole_file_roundtrip() {
        let req = StoreWholeFileRequest {
            target_path: "notes/todo.txt".into(),
            data: b"buy milk".to_vec(),
            checksum: String::new(),
            overwrite: true,
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"overwrite\":true"));
        let parsed: StoreWholeFileRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, req);
    }
}
