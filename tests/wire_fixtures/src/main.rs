fn main() {
    println!("Run `cargo test -p wire-fixtures` to execute wire-shape tests.");
}

#[cfg(test)]
mod tests {
    use cargohold_protocol::messages::*;
    use cargohold_protocol::{ErrorKind, TransferInfo, TransferStatus, WireError};

    /// Deserializes a fixture document into `T`, re-serializes it, and
    /// compares the JSON values (order-independent). Catches renamed
    /// fields, missing defaults, and encoding drift in one assertion.
    fn roundtrip<T>(fixture: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let doc: serde_json::Value = serde_json::from_str(fixture)
            .unwrap_or_else(|e| panic!("bad fixture JSON: {e}\n{fixture}"));
        let parsed: T = serde_json::from_value(doc.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize fixture: {e}\n{fixture}"));
        let reserialized = serde_json::to_value(&parsed).expect("failed to re-serialize");
        assert_eq!(
            doc, reserialized,
            "roundtrip mismatch:\n  fixture: {doc}\n  rust:    {reserialized}"
        );
    }

    // --- Session negotiation ---

    #[test]
    fn fixture_hello_request_full() {
        roundtrip::<HelloRequest>(
            r#"{"targetPath":"backups/db.tar","declaredSize":1048576,"chunkSizeHint":65536}"#,
        );
    }

    #[test]
    fn fixture_hello_request_minimal() {
        roundtrip::<HelloRequest>(r#"{"targetPath":"notes.txt"}"#);
    }

    #[test]
    fn fixture_hello_response() {
        roundtrip::<HelloResponse>(
            r#"{"transferId":"4c2e1b1e-31b5-4ee2-b04d-6e2c4e1f9ab0","effectiveChunkSize":4194304,"expiresAt":"2025-06-01T12:00:00Z"}"#,
        );
    }

    // --- Chunk I/O ---

    #[test]
    fn fixture_write_chunk_request() {
        // "Hello" = "SGVsbG8=" in base64.
        roundtrip::<WriteChunkRequest>(
            r#"{"transferId":"t1","offset":4096,"data":"SGVsbG8=","checksum":"185f8db32271fe25f561a6fc938b2e264306ec304eda518007d1764826381969"}"#,
        );
    }

    #[test]
    fn fixture_write_chunk_request_no_checksum() {
        roundtrip::<WriteChunkRequest>(r#"{"transferId":"t1","offset":0,"data":"SGVsbG8="}"#);
    }

    #[test]
    fn fixture_write_chunk_response() {
        roundtrip::<WriteChunkResponse>(r#"{"bytesWritten":5,"receivedTotal":4101}"#);
    }

    #[test]
    fn fixture_read_chunk_request() {
        roundtrip::<ReadChunkRequest>(r#"{"target":"reports/q2.pdf","offset":0,"length":262144}"#);
    }

    #[test]
    fn fixture_read_chunk_response() {
        roundtrip::<ReadChunkResponse>(r#"{"offset":262144,"data":"SGVsbG8="}"#);
    }

    // --- Completion ---

    #[test]
    fn fixture_complete_file_request() {
        roundtrip::<CompleteFileRequest>(
            r#"{"transferId":"t1","checksum":"e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855","overwrite":true}"#,
        );
    }

    #[test]
    fn fixture_complete_file_request_minimal() {
        roundtrip::<CompleteFileRequest>(r#"{"transferId":"t1"}"#);
    }

    #[test]
    fn fixture_complete_file_response() {
        roundtrip::<CompleteFileResponse>(
            r#"{"finalSize":1048576,"committedPath":"/srv/objects/backups/db.tar"}"#,
        );
    }

    #[test]
    fn fixture_delete_file() {
        roundtrip::<DeleteFileRequest>(r#"{"target":"backups/db.tar"}"#);
        roundtrip::<DeleteFileResponse>(r#"{"ok":true}"#);
    }

    // --- Whole-file shortcut ---

    #[test]
    fn fixture_store_whole_file_request() {
        roundtrip::<StoreWholeFileRequest>(
            r#"{"targetPath":"notes.txt","data":"SGVsbG8=","overwrite":true}"#,
        );
    }

    #[test]
    fn fixture_store_whole_file_response() {
        roundtrip::<StoreWholeFileResponse>(
            r#"{"finalSize":5,"committedPath":"/srv/objects/notes.txt"}"#,
        );
    }

    // --- Errors and introspection ---

    #[test]
    fn fixture_wire_error() {
        roundtrip::<WireError>(
            r#"{"kind":"failed_precondition","message":"transfer t1 is Completing"}"#,
        );
    }

    #[test]
    fn fixture_transfer_info() {
        roundtrip::<TransferInfo>(
            r#"{"transferId":"t1","targetPath":"backups/db.tar","status":"open","receivedBytes":4096,"declaredSize":1048576,"expiresAt":"2025-06-01T12:00:00Z"}"#,
        );
    }

    #[test]
    fn fixture_transfer_status_values() {
        for (status, wire) in [
            (TransferStatus::Open, "\"open\""),
            (TransferStatus::Completing, "\"completing\""),
            (TransferStatus::Completed, "\"completed\""),
            (TransferStatus::Aborted, "\"aborted\""),
            (TransferStatus::Expired, "\"expired\""),
        ] {
            assert_eq!(serde_json::to_string(&status).unwrap(), wire);
        }
    }

    #[test]
    fn fixture_error_kind_values() {
        for (kind, wire) in [
            (ErrorKind::InvalidArgument, "\"invalid_argument\""),
            (ErrorKind::NotFound, "\"not_found\""),
            (ErrorKind::OutOfRange, "\"out_of_range\""),
            (ErrorKind::ResourceExhausted, "\"resource_exhausted\""),
            (ErrorKind::AlreadyExists, "\"already_exists\""),
        ] {
            assert_eq!(serde_json::to_string(&kind).unwrap(), wire);
        }
    }
}
