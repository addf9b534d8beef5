//! Core data types

pub mod document;

pub use document::{Document, SourceMetadata};
