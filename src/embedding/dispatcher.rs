//! Bounded embedding worker pool.
//!
//! `N` OS threads each own one loaded embedder; jobs fan in over a bounded
//! MPMC channel and resolve on whichever worker picks them up. No ordering
//! between enqueued jobs is guaranteed. A failed inference fails only that
//! job's future; the worker keeps serving.

use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::TextEmbedder;
use super::error::EmbeddingError;
use crate::constants::EMBEDDING_QUEUE_DEPTH;

struct EmbedJob {
    text: String,
    reply: oneshot::Sender<Result<Vec<f32>, EmbeddingError>>,
}

/// Handle to the embedding worker pool. Cheap to clone.
#[derive(Clone)]
pub struct EmbeddingDispatcher {
    tx: async_channel::Sender<EmbedJob>,
    dimension: usize,
    workers: usize,
}

impl EmbeddingDispatcher {
    /// Spawns `workers` threads, each owning one embedder produced by
    /// `factory`. Every embedder must report `dimension`.
    pub fn new<F>(factory: F, workers: usize, dimension: usize) -> Result<Self, EmbeddingError>
    where
        F: Fn(usize) -> Result<Box<dyn TextEmbedder>, EmbeddingError>,
    {
        if workers == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "at least one embedding worker is required".to_string(),
            });
        }

        let mut embedders = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let embedder = factory(worker_id)?;
            if embedder.dimension() != dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: dimension,
                    actual: embedder.dimension(),
                });
            }
            embedders.push(embedder);
        }

        let (tx, rx) = async_channel::bounded::<EmbedJob>(EMBEDDING_QUEUE_DEPTH);

        for (worker_id, embedder) in embedders.into_iter().enumerate() {
            let rx = rx.clone();
            std::thread::Builder::new()
                .name(format!("embed-worker-{worker_id}"))
                .spawn(move || worker_loop(worker_id, embedder, rx))
                .map_err(|e| EmbeddingError::InvalidConfig {
                    reason: format!("failed to spawn embedding worker: {e}"),
                })?;
        }

        debug!(workers, dimension, "Embedding dispatcher started");
        Ok(Self {
            tx,
            dimension,
            workers,
        })
    }

    /// Embeds one text on any worker.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(EmbedJob {
                text: text.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| EmbeddingError::DispatcherClosed)?;

        let embedding = reply_rx
            .await
            .map_err(|_| EmbeddingError::WorkerGone)??;

        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(embedding)
    }

    /// Fixed output dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Stops accepting jobs; idle workers exit once the queue drains.
    pub fn close(&self) {
        self.tx.close();
    }
}

impl std::fmt::Debug for EmbeddingDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingDispatcher")
            .field("workers", &self.workers)
            .field("dimension", &self.dimension)
            .field("queued", &self.tx.len())
            .finish()
    }
}

fn worker_loop(
    worker_id: usize,
    embedder: Box<dyn TextEmbedder>,
    rx: async_channel::Receiver<EmbedJob>,
) {
    while let Ok(job) = rx.recv_blocking() {
        let result = embedder.embed(&job.text);
        if let Err(e) = &result {
            warn!(worker_id, error = %e, "Embedding job failed");
        }
        // The requester may have been cancelled; a dead reply channel is fine.
        let _ = job.reply.send(result);
    }
    debug!(worker_id, "Embedding worker exiting");
}
