//! In-memory similarity index over (vector, document) pairs

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::providers::EmbedderFingerprint;
use crate::types::Document;

/// Distance metric used to rank entries
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Squared L2 distance
    #[default]
    Euclidean,
    /// 1 - cosine similarity
    Cosine,
}

impl DistanceMetric {
    /// Distance between two vectors of equal length; smaller is closer
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| {
                    let d = x - y;
                    d * d
                })
                .sum(),
            Self::Cosine => {
                let mut dot = 0.0f32;
                let mut norm_a = 0.0f32;
                let mut norm_b = 0.0f32;
                for (x, y) in a.iter().zip(b) {
                    dot += x * y;
                    norm_a += x * x;
                    norm_b += y * y;
                }
                if norm_a == 0.0 || norm_b == 0.0 {
                    return 1.0;
                }
                1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
            }
        }
    }
}

/// One stored pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Embedding of `document.text()`
    pub vector: Vec<f32>,
    /// The stored page
    pub document: Document,
}

/// A retrieved document with its distance to the query
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    /// The matched document
    pub document: Document,
    /// Distance under the index metric (smaller is closer)
    pub distance: f32,
}

/// Exact nearest-neighbour index.
///
/// Entries are append-only and keep insertion order, which is also the
/// tie-breaker when two entries are equally distant from a query.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    embedder: EmbedderFingerprint,
    metric: DistanceMetric,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Build a new index from a non-empty batch
    pub fn build(
        embedder: EmbedderFingerprint,
        metric: DistanceMetric,
        documents: Vec<Document>,
        embeddings: Vec<Vec<f32>>,
    ) -> Result<Self> {
        if documents.is_empty() {
            return Err(Error::EmptyBatch);
        }
        let mut index = Self {
            embedder,
            metric,
            entries: Vec::with_capacity(documents.len()),
        };
        index.extend(documents, embeddings)?;
        Ok(index)
    }

    /// Rebuild from previously validated entries
    pub(crate) fn from_parts(
        embedder: EmbedderFingerprint,
        metric: DistanceMetric,
        entries: Vec<IndexEntry>,
    ) -> Self {
        Self {
            embedder,
            metric,
            entries,
        }
    }

    /// Append a batch; existing entries are left untouched.
    ///
    /// The whole batch is validated before anything is inserted.
    pub fn extend(&mut self, documents: Vec<Document>, embeddings: Vec<Vec<f32>>) -> Result<()> {
        if documents.is_empty() {
            return Err(Error::EmptyBatch);
        }
        if documents.len() != embeddings.len() {
            return Err(Error::internal(format!(
                "{} documents but {} embeddings",
                documents.len(),
                embeddings.len()
            )));
        }
        for vector in &embeddings {
            self.check_dimensions(vector)?;
            // JSON cannot represent NaN or infinity, so the snapshot would not reload
            if vector.iter().any(|v| !v.is_finite()) {
                return Err(Error::embedding("Embedding contains a non-finite component"));
            }
        }

        self.entries.extend(
            embeddings
                .into_iter()
                .zip(documents)
                .map(|(vector, document)| IndexEntry { vector, document }),
        );
        Ok(())
    }

    /// The `k` nearest documents, nearest first.
    ///
    /// `k` is capped at the number of entries.
    pub fn query(&self, query_vector: &[f32], k: usize) -> Result<Vec<ScoredDocument>> {
        if self.entries.is_empty() {
            return Err(Error::IndexNotReady);
        }
        self.check_dimensions(query_vector)?;

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, self.metric.distance(query_vector, &entry.vector)))
            .collect();

        scored.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

        Ok(scored
            .into_iter()
            .take(k.min(self.entries.len()))
            .map(|(i, distance)| ScoredDocument {
                document: self.entries[i].document.clone(),
                distance,
            })
            .collect())
    }

    /// Confirm a vector can be compared with this index
    pub fn check_dimensions(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.embedder.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.embedder.dimensions,
                actual: vector.len(),
            });
        }
        Ok(())
    }

    /// Identity of the provider that produced every vector here
    pub fn embedder(&self) -> &EmbedderFingerprint {
        &self.embedder
    }

    /// Distance metric
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Vector dimensions
    pub fn dimensions(&self) -> usize {
        self.embedder.dimensions
    }

    /// Stored entries in insertion order
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Number of stored documents
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
