//! Versioned on-disk snapshot of the index
//!
//! The snapshot is a JSON document:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "embedder": { "provider": "ollama", "model": "nomic-embed-text", "dimensions": 768 },
//!   "metric": "euclidean",
//!   "dimensions": 768,
//!   "document_count": 2,
//!   "saved_at": "2026-01-01T00:00:00Z",
//!   "entries": [ { "vector": [...], "document": { "text": "...", "metadata": { "source": "a.pdf", "page": 1 } } } ]
//! }
//! ```
//!
//! Every field needed to interpret the vectors is explicit, so the file can be
//! read without this crate's in-memory types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::error::{Error, Result};
use crate::providers::EmbedderFingerprint;

use super::index::{DistanceMetric, IndexEntry, VectorIndex};

/// Current snapshot format version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    format_version: u32,
    embedder: &'a EmbedderFingerprint,
    metric: DistanceMetric,
    dimensions: usize,
    document_count: usize,
    saved_at: DateTime<Utc>,
    entries: &'a [IndexEntry],
}

#[derive(Deserialize)]
struct SnapshotOwned {
    format_version: u32,
    embedder: EmbedderFingerprint,
    metric: DistanceMetric,
    dimensions: usize,
    document_count: usize,
    entries: Vec<IndexEntry>,
}

/// Serialize an index to snapshot bytes
pub fn persist(index: &VectorIndex) -> Result<Vec<u8>> {
    let snapshot = SnapshotRef {
        format_version: SNAPSHOT_FORMAT_VERSION,
        embedder: index.embedder(),
        metric: index.metric(),
        dimensions: index.dimensions(),
        document_count: index.len(),
        saved_at: Utc::now(),
        entries: index.entries(),
    };
    Ok(serde_json::to_vec(&snapshot)?)
}

/// Parse and validate snapshot bytes
pub fn load(bytes: &[u8]) -> Result<VectorIndex> {
    let snapshot: SnapshotOwned = serde_json::from_slice(bytes)
        .map_err(|e| Error::snapshot(format!("Malformed snapshot: {}", e)))?;

    if snapshot.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(Error::snapshot(format!(
            "Unsupported snapshot version {} (expected {})",
            snapshot.format_version, SNAPSHOT_FORMAT_VERSION
        )));
    }
    if snapshot.dimensions != snapshot.embedder.dimensions {
        return Err(Error::snapshot(format!(
            "Snapshot declares {} dimensions but embedder {}",
            snapshot.dimensions, snapshot.embedder
        )));
    }
    if snapshot.document_count != snapshot.entries.len() {
        return Err(Error::snapshot(format!(
            "Snapshot declares {} documents but holds {}",
            snapshot.document_count,
            snapshot.entries.len()
        )));
    }
    if snapshot.entries.is_empty() {
        return Err(Error::snapshot("Snapshot holds no documents"));
    }
    if let Some((position, entry)) = snapshot
        .entries
        .iter()
        .enumerate()
        .find(|(_, e)| e.vector.len() != snapshot.dimensions)
    {
        return Err(Error::snapshot(format!(
            "Entry {} has {} dimensions, expected {}",
            position,
            entry.vector.len(),
            snapshot.dimensions
        )));
    }

    Ok(VectorIndex::from_parts(
        snapshot.embedder,
        snapshot.metric,
        snapshot.entries,
    ))
}

/// Read a snapshot file if it exists
pub fn read_file(path: &Path) -> Result<Option<VectorIndex>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(path)?;
    load(&bytes).map(Some)
}

/// Overwrite the snapshot file atomically (temp file in the same directory, then rename)
pub fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::index::tests::fingerprint;
    use crate::types::Document;

    fn sample_index() -> VectorIndex {
        VectorIndex::build(
            fingerprint(3),
            DistanceMetric::Cosine,
            vec![
                Document::new("Aspirin reduces fever.", "aspirin.pdf", 1),
                Document::new("Ibuprofen reduces swelling.", "nsaid.pdf", 1),
                Document::new("Rest helps recovery.", "nsaid.pdf", 2),
            ],
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.7, 0.7, 0.0],
                vec![0.0, 0.0, 1.0],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip_preserves_query_results() {
        let index = sample_index();
        let restored = load(&persist(&index).unwrap()).unwrap();

        assert_eq!(restored, index);
        for query in [[1.0, 0.1, 0.0], [0.0, 1.0, 0.0], [0.1, 0.1, 0.9]] {
            let before: Vec<_> = index
                .query(&query, 3)
                .unwrap()
                .into_iter()
                .map(|r| r.document)
                .collect();
            let after: Vec<_> = restored
                .query(&query, 3)
                .unwrap()
                .into_iter()
                .map(|r| r.document)
                .collect();
            assert_eq!(before, after);
        }
    }

    #[test]
    fn test_snapshot_is_self_describing() {
        let bytes = persist(&sample_index()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["format_version"], 1);
        assert_eq!(value["metric"], "cosine");
        assert_eq!(value["dimensions"], 3);
        assert_eq!(value["document_count"], 3);
        assert_eq!(value["embedder"]["provider"], "test");
        assert_eq!(value["entries"][0]["document"]["metadata"]["source"], "aspirin.pdf");
    }

    #[test]
    fn test_load_rejects_unknown_version() {
        let bytes = persist(&sample_index()).unwrap();
        let mut value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        value["format_version"] = serde_json::json!(99);

        let result = load(&serde_json::to_vec(&value).unwrap());
        assert!(matches!(result, Err(Error::Snapshot(_))));
    }

    #[test]
    fn test_load_rejects_inconsistent_counts_and_vectors() {
        let bytes = persist(&sample_index()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        let mut wrong_count = value.clone();
        wrong_count["document_count"] = serde_json::json!(7);
        assert!(load(&serde_json::to_vec(&wrong_count).unwrap()).is_err());

        let mut short_vector = value;
        short_vector["entries"][1]["vector"] = serde_json::json!([0.5, 0.5]);
        assert!(load(&serde_json::to_vec(&short_vector).unwrap()).is_err());

        assert!(load(b"not json").is_err());
    }

    #[test]
    fn test_write_file_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("vector_store.json");
        assert!(read_file(&path).unwrap().is_none());

        let mut index = sample_index();
        write_file(&path, &persist(&index).unwrap()).unwrap();
        assert_eq!(read_file(&path).unwrap().unwrap().len(), 3);

        index
            .extend(
                vec![Document::new("Fluids help.", "care.pdf", 1)],
                vec![vec![0.0, 1.0, 0.0]],
            )
            .unwrap();
        write_file(&path, &persist(&index).unwrap()).unwrap();
        assert_eq!(read_file(&path).unwrap().unwrap(), index);
    }
}
