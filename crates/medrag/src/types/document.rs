//! Page documents with source tracking

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a document's text came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceMetadata {
    /// Original upload filename
    pub source: String,
    /// Page number (1-indexed)
    pub page: u32,
}

impl fmt::Display for SourceMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Page {}", self.source, self.page)
    }
}

/// A page of extracted text, the unit that is embedded, stored and retrieved.
///
/// Fields are private so a document cannot change after it is indexed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    text: String,
    metadata: SourceMetadata,
}

impl Document {
    /// Create a document for one page of a source file
    pub fn new(text: impl Into<String>, source: impl Into<String>, page: u32) -> Self {
        Self {
            text: text.into(),
            metadata: SourceMetadata {
                source: source.into(),
                page,
            },
        }
    }

    /// Page text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Source file and page
    pub fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }
}
