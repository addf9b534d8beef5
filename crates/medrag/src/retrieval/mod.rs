//! Similarity index, snapshot persistence, and the shared knowledge base

mod index;
mod knowledge_base;
pub mod snapshot;

pub use index::{DistanceMetric, IndexEntry, ScoredDocument, VectorIndex};
pub use knowledge_base::KnowledgeBase;
