//! Fire-and-forget query log sink.
//!
//! Every handled request produces one [`QueryLogRecord`]. Records flow over
//! a bounded queue into a small worker pool that writes them to the scalar
//! tier; a full queue or a failed write never affects the request that
//! produced the record.


use std::sync::Arc;

use tracing::{debug, warn};

use crate::constants::AUDIT_QUEUE_DEPTH;
use crate::scalar::{QueryLogRecord, ScalarStore};

/// Asynchronous audit writer. Cheap to clone.
#[derive(Clone)]
pub struct QueryLogSink {
    tx: async_channel::Sender<QueryLogRecord>,
}

impl QueryLogSink {
    /// Spawns `workers` tasks draining audit records into `store`. Must be
    /// called from within a Tokio runtime.
    pub fn new(store: Arc<dyn ScalarStore>, workers: usize) -> Self {
        let (tx, rx) = async_channel::bounded::<QueryLogRecord>(AUDIT_QUEUE_DEPTH);

        for worker_id in 0..workers {
            let rx = rx.clone();
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                while let Ok(record) = rx.recv().await {
                    if let Err(e) = store.insert_query_resp(record).await {
                        warn!(worker_id, error = %e, "Audit write failed");
                    }
                }
                debug!(worker_id, "Audit worker exiting");
            });
        }

        Self { tx }
    }

    /// Enqueues one record. Never blocks; a full queue drops the record.
    pub fn submit(&self, record: QueryLogRecord) {
        if let Err(e) = self.tx.try_send(record) {
            warn!(error = %e, "Audit queue full, dropping record");
        }
    }

    /// Stops the workers once the queue drains.
    pub fn close(&self) {
        self.tx.close();
    }
}

impl std::fmt::Debug for QueryLogSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryLogSink")
            .field("queued", &self.tx.len())
            .finish()
    }
}
