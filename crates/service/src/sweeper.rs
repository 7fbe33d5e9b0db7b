use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use cargohold_store::ChunkStore;

use crate::service::FileSenderService;

impl<S: ChunkStore> FileSenderService<S> {
    /// Spawns the background expiry sweeper.
    ///
    /// Every sweep interval, expired sessions are evicted and their spool
    /// data released. Runs until the token is cancelled. Lazy expiry on
    /// access already blocks calls against stale sessions; the sweeper is
    /// what returns their storage.
    pub fn spawn_sweeper(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let registry = self.registry();
        let store = self.store();
        let interval = self.config().sweep_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("expiry sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        for session in registry.take_expired() {
                            let id = session.id().to_string();
                            let store = Arc::clone(&store);
                            let spool_id = id.clone();
                            match tokio::task::spawn_blocking(move || store.discard(&spool_id)).await {
                                Ok(Ok(())) => {
                                    info!(transfer_id = %id, "expired session reclaimed");
                                }
                                Ok(Err(e)) => {
                                    warn!(transfer_id = %id, "failed to reclaim expired spool: {e}");
                                }
                                Err(e) => {
                                    warn!(transfer_id = %id, "spool reclaim task failed: {e}");
                                }
                            }
                        }
                    }
                }
            }
        })
    }
}
