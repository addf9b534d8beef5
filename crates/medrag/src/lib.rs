//! medrag: question answering over uploaded medical PDFs
//!
//! PDFs are split into page documents, embedded, and kept in a persisted
//! exact-search index. Questions retrieve the nearest pages, which are folded
//! into a constrained prompt for a hosted generative model.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod service;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use retrieval::{DistanceMetric, KnowledgeBase, VectorIndex};
pub use service::{AskOutcome, RagService, UploadReport};
pub use types::{Document, SourceMetadata};
