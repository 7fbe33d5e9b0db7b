use std::sync::Arc;

use tracing::{debug, info};

use cargohold_protocol::messages::{
    CompleteFileRequest, CompleteFileResponse, DeleteFileRequest, DeleteFileResponse,
    HelloRequest, HelloResponse, StoreWholeFileRequest, StoreWholeFileResponse,
    WriteChunkRequest, WriteChunkResponse,
};
use cargohold_protocol::TransferInfo;
use cargohold_registry::{TransferRegistry, TransferSession};
use cargohold_store::{ChunkStore, StoreError, checksum_bytes, validate_target_path};

use crate::{ServiceConfig, TransferError};

/// The transfer service: one method per RPC operation.
///
/// Generic over the storage backend so tests and alternative backends
/// plug in behind [`ChunkStore`].
pub struct FileSenderService<S: ChunkStore> {
    store: Arc<S>,
    registry: Arc<TransferRegistry>,
    config: ServiceConfig,
}

/// Runs a storage closure off the async runtime.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, TransferError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| TransferError::Internal(format!("storage task failed: {e}")))?
        .map_err(TransferError::from)
}

impl<S: ChunkStore> FileSenderService<S> {
    pub fn new(store: S, config: ServiceConfig) -> Self {
        let registry = Arc::new(TransferRegistry::new(
            config.max_sessions,
            config.session_ttl,
        ));
        Self {
            store: Arc::new(store),
            registry,
            config,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub(crate) fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    pub(crate) fn registry(&self) -> Arc<TransferRegistry> {
        Arc::clone(&self.registry)
    }

    /// Number of registered sessions (live and not yet swept).
    pub fn session_count(&self) -> usize {
        self.registry.len()
    }

    /// Operator snapshot of a live session.
    pub fn transfer_info(&self, transfer_id: &str) -> Result<TransferInfo, TransferError> {
        Ok(self.registry.get(transfer_id)?.info())
    }

    /// Opens a transfer session and negotiates the chunk size.
    ///
    /// No bytes are stored yet; the session holds a spool reservation
    /// until commit, deletion, or expiry.
    pub async fn hello(&self, req: HelloRequest) -> Result<HelloResponse, TransferError> {
        if req.target_path.is_empty() {
            return Err(TransferError::InvalidArgument(
                "targetPath is required".into(),
            ));
        }
        validate_target_path(&req.target_path)?;

        let declared_size = match req.declared_size {
            Some(n) if n < 0 => {
                return Err(TransferError::InvalidArgument(format!(
                    "negative declaredSize: {n}"
                )));
            }
            Some(n) => Some(n as u64),
            None => None,
        };
        if req.chunk_size_hint < 0 {
            return Err(TransferError::InvalidArgument(format!(
                "negative chunkSizeHint: {}",
                req.chunk_size_hint
            )));
        }

        // The server limit wins over an absent or larger hint.
        let effective_chunk_size = if req.chunk_size_hint > 0 {
            self.config.max_chunk_size.min(req.chunk_size_hint as usize)
        } else {
            self.config.max_chunk_size
        };

        let transfer_id = uuid::Uuid::new_v4().to_string();
        let session = self.registry.create(
            transfer_id.clone(),
            req.target_path.clone(),
            declared_size,
            effective_chunk_size,
        )?;

        info!(
            transfer_id = %transfer_id,
            path = %req.target_path,
            chunk_size = effective_chunk_size,
            declared_size = ?declared_size,
            "transfer session opened"
        );

        Ok(HelloResponse {
            transfer_id,
            effective_chunk_size: effective_chunk_size as i64,
            expires_at: session.expires_at(),
        })
    }

    /// Accepts one uploaded byte range.
    ///
    /// Validation happens before the spool is touched; a chunk that fails
    /// verification mutates nothing. Overlapping ranges are last-write-wins
    /// per byte, with coverage recomputed from the range set.
    pub async fn write_chunk(
        &self,
        req: WriteChunkRequest,
    ) -> Result<WriteChunkResponse, TransferError> {
        if req.offset < 0 {
            return Err(TransferError::InvalidArgument(format!(
                "negative offset: {}",
                req.offset
            )));
        }
        let session = self.registry.get(&req.transfer_id)?;
        session.ensure_open()?;

        let len = req.data.len();
        if len > session.chunk_size() {
            return Err(TransferError::InvalidArgument(format!(
                "chunk of {len} bytes exceeds negotiated size {}",
                session.chunk_size()
            )));
        }
        if !req.checksum.is_empty() && checksum_bytes(&req.data) != req.checksum {
            return Err(TransferError::InvalidArgument("chunk checksum mismatch".into()));
        }

        let offset = req.offset as u64;
        let end = offset + len as u64;
        if let Some(size) = session.declared_size() {
            if end > size {
                return Err(TransferError::OutOfRange(format!(
                    "write ends at {end}, beyond declared size {size}"
                )));
            }
        }

        if len == 0 {
            return Ok(WriteChunkResponse {
                bytes_written: 0,
                received_total: session.received_total() as i64,
            });
        }

        // Disk I/O off the runtime; the range is recorded only afterwards,
        // so a failed write leaves the received state untouched.
        let store = self.store();
        let id = req.transfer_id.clone();
        let data = req.data;
        let written = run_blocking(move || store.write_at(&id, offset, &data)).await?;

        // The session may have left the open state while the bytes were in
        // flight; the late write then fails and is not recorded.
        let received_total = session.record_range(offset, offset + written as u64)?;

        debug!(
            transfer_id = %req.transfer_id,
            offset,
            len = written,
            received_total,
            "chunk accepted"
        );

        Ok(WriteChunkResponse {
            bytes_written: written as i64,
            received_total: received_total as i64,
        })
    }

    /// Verifies coverage and atomically commits the assembled file.
    ///
    /// Exactly one concurrent caller wins the completion claim; every
    /// failure path rolls the session back to open for retry or abort.
    pub async fn complete_file(
        &self,
        req: CompleteFileRequest,
    ) -> Result<CompleteFileResponse, TransferError> {
        let session = self.registry.get(&req.transfer_id)?;
        session.begin_complete()?;

        match self.try_commit(&session, &req.checksum, req.overwrite).await {
            Ok(resp) => {
                session.finish_complete();
                self.registry.remove(&req.transfer_id);
                info!(
                    transfer_id = %req.transfer_id,
                    path = %resp.committed_path,
                    final_size = resp.final_size,
                    "transfer committed"
                );
                Ok(resp)
            }
            Err(e) => {
                session.rollback_complete();
                Err(e)
            }
        }
    }

    async fn try_commit(
        &self,
        session: &Arc<TransferSession>,
        checksum: &str,
        overwrite: bool,
    ) -> Result<CompleteFileResponse, TransferError> {
        // Status is completing, so the range set can no longer change.
        let ranges = session.ranges();
        let final_size = match session.declared_size() {
            Some(size) => {
                if !ranges.covers_exactly(size) {
                    return Err(TransferError::DataLoss(format!(
                        "received {} of {} declared bytes",
                        ranges.total(),
                        size
                    )));
                }
                size
            }
            None => ranges.contiguous_from_zero().ok_or_else(|| {
                TransferError::DataLoss("gaps in received data and no declared size".into())
            })?,
        };

        if !checksum.is_empty() {
            let store = self.store();
            let id = session.id().to_string();
            let actual = run_blocking(move || store.spool_checksum(&id)).await?;
            if actual != checksum {
                return Err(TransferError::DataLoss("file checksum mismatch".into()));
            }
        }

        let store = self.store();
        let id = session.id().to_string();
        let target = session.target_path().to_string();
        let path = run_blocking(move || store.publish(&id, &target, overwrite)).await?;

        Ok(CompleteFileResponse {
            final_size: final_size as i64,
            committed_path: path.display().to_string(),
        })
    }

    /// Discards a live session or removes a committed object.
    ///
    /// Idempotent: deleting an absent target succeeds either way.
    pub async fn delete_file(
        &self,
        req: DeleteFileRequest,
    ) -> Result<DeleteFileResponse, TransferError> {
        // A live transfer id wins over an object path.
        if let Some(session) = self.registry.remove(&req.target) {
            session.abort();
            let store = self.store();
            let id = req.target.clone();
            run_blocking(move || store.discard(&id)).await?;
            info!(transfer_id = %req.target, "transfer session discarded");
            return Ok(DeleteFileResponse { ok: true });
        }

        validate_target_path(&req.target)?;
        let store = self.store();
        let target = req.target.clone();
        run_blocking(move || store.delete_object(&target)).await?;
        debug!(object = %req.target, "object delete requested");
        Ok(DeleteFileResponse { ok: true })
    }

    /// Stores a small file in one call: session, single write, commit.
    ///
    /// One logical transaction: any sub-step failure tears the session
    /// and its spool down before the error surfaces, so no dangling
    /// session or partial object is ever observable.
    pub async fn store_whole_file(
        &self,
        req: StoreWholeFileRequest,
    ) -> Result<StoreWholeFileResponse, TransferError> {
        let size = req.data.len();
        if size > self.config.whole_file_cap {
            return Err(TransferError::ResourceExhausted(format!(
                "payload of {size} bytes exceeds the whole-file cap of {}; use the chunked path",
                self.config.whole_file_cap
            )));
        }

        let hello = self
            .hello(HelloRequest {
                target_path: req.target_path.clone(),
                declared_size: Some(size as i64),
                chunk_size_hint: size as i64,
            })
            .await?;
        let transfer_id = hello.transfer_id;

        let result = self.store_whole_steps(&transfer_id, req).await;
        if result.is_err() {
            if let Some(session) = self.registry.remove(&transfer_id) {
                session.abort();
            }
            let store = self.store();
            let id = transfer_id.clone();
            // Best-effort spool cleanup; the original error wins.
            let _ = tokio::task::spawn_blocking(move || store.discard(&id)).await;
        }
        result
    }

    async fn store_whole_steps(
        &self,
        transfer_id: &str,
        req: StoreWholeFileRequest,
    ) -> Result<StoreWholeFileResponse, TransferError> {
        if !req.data.is_empty() {
            self.write_chunk(WriteChunkRequest {
                transfer_id: transfer_id.to_string(),
                offset: 0,
                data: req.data,
                checksum: String::new(),
            })
            .await?;
        }
        let completed = self
            .complete_file(CompleteFileRequest {
                transfer_id: transfer_id.to_string(),
                checksum: req.checksum,
                overwrite: req.overwrite,
            })
            .await?;
        Ok(StoreWholeFileResponse {
            final_size: completed.final_size,
            committed_path: completed.committed_path,
        })
    }
}
