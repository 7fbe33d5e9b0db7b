use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use cargohold_protocol::messages::{ReadChunkRequest, ReadChunkResponse};
use cargohold_registry::RegistryError;
use cargohold_store::ChunkStore;

use crate::service::{FileSenderService, run_blocking};
use crate::TransferError;

/// Response buffer depth for one ReadChunk stream.
const READ_STREAM_BUFFER: usize = 8;

/// A finite sequence of ReadChunk responses.
///
/// Not restartable mid-stream: to resume after dropping it, issue a new
/// ReadChunk with a fresh offset. Dropping the stream cancels the
/// producer task promptly.
#[derive(Debug)]
pub struct ReadChunkStream {
    rx: mpsc::Receiver<Result<ReadChunkResponse, TransferError>>,
    cancel: CancellationToken,
}

impl ReadChunkStream {
    /// Next response, or `None` when the requested range is exhausted.
    pub async fn next(&mut self) -> Option<Result<ReadChunkResponse, TransferError>> {
        self.rx.recv().await
    }

    /// Stops the producer; any buffered responses drain, then `next`
    /// returns `None`.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for ReadChunkStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Where the bytes come from: a session spool or a committed object.
enum ReadSource {
    Spool,
    Object,
}

impl<S: ChunkStore> FileSenderService<S> {
    /// Streams a byte range from a live session or a committed object.
    ///
    /// `target` is resolved as a transfer id first, then as an object
    /// path. Session reads clip to the received ranges and skip gaps;
    /// each response carries its own offset. Object reads clip the tail
    /// to the object size, and an offset at or past the end fails
    /// `OutOfRange`.
    pub async fn read_chunk(
        &self,
        req: ReadChunkRequest,
    ) -> Result<ReadChunkStream, TransferError> {
        if req.offset < 0 {
            return Err(TransferError::InvalidArgument(format!(
                "negative offset: {}",
                req.offset
            )));
        }
        if req.length < 0 {
            return Err(TransferError::InvalidArgument(format!(
                "negative length: {}",
                req.length
            )));
        }
        let offset = req.offset as u64;
        let window_end = offset.saturating_add(req.length as u64);

        let (pieces, source) = match self.registry().get(&req.target) {
            Ok(session) => {
                let ranges = session.ranges();
                if req.length > 0 && offset > 0 && offset >= ranges.end() {
                    return Err(TransferError::OutOfRange(format!(
                        "offset {offset} beyond received data ({})",
                        ranges.end()
                    )));
                }
                (ranges.intersect(offset, window_end), ReadSource::Spool)
            }
            Err(RegistryError::NotFound(_)) => {
                let store = self.store();
                let target = req.target.clone();
                let object_len = run_blocking(move || store.object_len(&target)).await?;
                if object_len == 0 {
                    (Vec::new(), ReadSource::Object)
                } else if offset >= object_len {
                    return Err(TransferError::OutOfRange(format!(
                        "offset {offset} beyond object size {object_len}"
                    )));
                } else {
                    let end = window_end.min(object_len);
                    let pieces = if end > offset {
                        vec![(offset, end)]
                    } else {
                        Vec::new()
                    };
                    (pieces, ReadSource::Object)
                }
            }
            Err(e) => return Err(e.into()),
        };

        let (tx, rx) = mpsc::channel(READ_STREAM_BUFFER);
        let cancel = CancellationToken::new();
        let producer = ReadProducer {
            store: self.store(),
            target: req.target.clone(),
            source,
            cap: self.config().read_response_cap,
            cancel: cancel.clone(),
            tx,
        };
        tokio::spawn(producer.run(pieces));

        Ok(ReadChunkStream { rx, cancel })
    }
}

struct ReadProducer<S: ChunkStore> {
    store: Arc<S>,
    target: String,
    source: ReadSource,
    cap: usize,
    cancel: CancellationToken,
    tx: mpsc::Sender<Result<ReadChunkResponse, TransferError>>,
}

impl<S: ChunkStore> ReadProducer<S> {
    async fn run(self, pieces: Vec<(u64, u64)>) {
        for (start, end) in pieces {
            let mut pos = start;
            while pos < end {
                if self.cancel.is_cancelled() {
                    debug!(source = %self.target, "read stream cancelled");
                    return;
                }

                let n = self.cap.min((end - pos) as usize);
                let store = Arc::clone(&self.store);
                let target = self.target.clone();
                let from_spool = matches!(self.source, ReadSource::Spool);
                let read = run_blocking(move || {
                    if from_spool {
                        store.read_spool(&target, pos, n)
                    } else {
                        store.read_object(&target, pos, n)
                    }
                })
                .await;

                let (advance, item, stop) = match read {
                    Ok(data) if data.is_empty() => {
                        // The backing file shrank under us; nothing more to send.
                        return;
                    }
                    Ok(data) => {
                        let got = data.len() as u64;
                        let resp = ReadChunkResponse {
                            offset: pos as i64,
                            data,
                        };
                        (got, Ok(resp), false)
                    }
                    Err(e) => (0, Err(e), true),
                };

                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        debug!(source = %self.target, "read stream cancelled");
                        return;
                    }
                    sent = self.tx.send(item) => {
                        if sent.is_err() {
                            // Receiver dropped.
                            return;
                        }
                    }
                }

                if stop {
                    return;
                }
                pos += advance;
            }
        }
    }
}
