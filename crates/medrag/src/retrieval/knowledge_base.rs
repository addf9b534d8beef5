//! Shared, persisted handle to the current index
//!
//! Readers take a cheap `Arc` snapshot of the current index and never block
//! on uploads. Writers are serialised: each upload clones the current index,
//! extends the clone, persists it, and only then publishes it.

use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::providers::EmbedderFingerprint;
use crate::types::Document;

use super::index::{DistanceMetric, ScoredDocument, VectorIndex};
use super::snapshot;

/// Injectable store object shared by the upload and ask paths
pub struct KnowledgeBase {
    current: RwLock<Option<Arc<VectorIndex>>>,
    writer: Mutex<()>,
    snapshot_path: PathBuf,
    embedder: EmbedderFingerprint,
    metric: DistanceMetric,
}

impl KnowledgeBase {
    /// Open the knowledge base, loading the snapshot once if it exists.
    ///
    /// A snapshot written by a different embedder configuration is refused:
    /// its distances would not be comparable with new vectors.
    pub fn open(
        snapshot_path: impl Into<PathBuf>,
        embedder: EmbedderFingerprint,
        metric: DistanceMetric,
    ) -> Result<Self> {
        let snapshot_path = snapshot_path.into();
        let loaded = snapshot::read_file(&snapshot_path)?;

        if let Some(index) = &loaded {
            if index.embedder() != &embedder {
                return Err(Error::EmbedderMismatch {
                    stored: index.embedder().to_string(),
                    configured: embedder.to_string(),
                });
            }
            if index.metric() != metric {
                tracing::warn!(
                    "Snapshot uses {:?} distance, keeping it instead of configured {:?}",
                    index.metric(),
                    metric
                );
            }
            tracing::info!(
                "Loaded index snapshot from {} ({} documents)",
                snapshot_path.display(),
                index.len()
            );
        } else {
            tracing::info!(
                "No index snapshot at {}, knowledge base starts empty",
                snapshot_path.display()
            );
        }

        let metric = loaded.as_ref().map_or(metric, |index| index.metric());

        Ok(Self {
            current: RwLock::new(loaded.map(Arc::new)),
            writer: Mutex::new(()),
            snapshot_path,
            embedder,
            metric,
        })
    }

    /// Current index, if anything has been ingested
    pub fn snapshot(&self) -> Option<Arc<VectorIndex>> {
        self.current.read().clone()
    }

    /// Whether queries can be answered
    pub fn is_ready(&self) -> bool {
        self.current.read().is_some()
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.current.read().as_ref().map_or(0, |index| index.len())
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Embedder identity every vector must come from
    pub fn embedder(&self) -> &EmbedderFingerprint {
        &self.embedder
    }

    /// Distance metric of the index
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Nearest documents for a query vector.
    ///
    /// Returns [`Error::IndexNotReady`] when nothing has been ingested.
    pub fn query(&self, query_vector: &[f32], k: usize) -> Result<Vec<ScoredDocument>> {
        let index = self.snapshot().ok_or(Error::IndexNotReady)?;
        index.query(query_vector, k)
    }

    /// Add a batch, persist it, and publish the new index.
    ///
    /// Builds the index on first use and extends it afterwards. Nothing is
    /// published unless the snapshot write succeeds. Returns the new size.
    pub async fn add_batch(
        &self,
        documents: Vec<Document>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<usize> {
        let _guard = self.writer.lock().await;

        let next = match self.snapshot() {
            Some(current) => {
                let mut next = VectorIndex::clone(&current);
                next.extend(documents, embeddings)?;
                next
            }
            None => VectorIndex::build(self.embedder.clone(), self.metric, documents, embeddings)?,
        };

        let bytes = snapshot::persist(&next)?;
        let path = self.snapshot_path.clone();
        tokio::task::spawn_blocking(move || snapshot::write_file(&path, &bytes))
            .await
            .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

        let size = next.len();
        *self.current.write() = Some(Arc::new(next));
        Ok(size)
    }
}
