//! Upload storage and page-document creation

use bytes::Bytes;
use std::path::PathBuf;

use crate::config::UploadRetention;
use crate::error::{Error, Result};
use crate::types::Document;

use super::parser::PdfParser;

/// A file received from the upload form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Client-supplied filename
    pub filename: String,
    /// File bytes
    pub data: Bytes,
}

impl UploadedFile {
    /// Create an uploaded file
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }
}

/// Turns uploaded PDFs into page documents
pub struct Ingestor {
    upload_dir: PathBuf,
    retention: UploadRetention,
}

impl Ingestor {
    /// Create an ingestor writing to `upload_dir`
    pub fn new(upload_dir: impl Into<PathBuf>, retention: UploadRetention) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            retention,
        }
    }

    /// Save every file and extract one document per non-blank page.
    ///
    /// The batch is validated up front; any extraction failure fails the
    /// whole batch.
    pub async fn ingest(&self, files: &[UploadedFile]) -> Result<Vec<Document>> {
        if files.is_empty() {
            return Err(Error::NoFileSelected);
        }
        let names = files
            .iter()
            .map(|f| sanitize_filename(&f.filename).ok_or(Error::NoFileSelected))
            .collect::<Result<Vec<_>>>()?;

        tokio::fs::create_dir_all(&self.upload_dir).await?;

        let mut saved = Vec::with_capacity(files.len());
        let result = self.save_and_extract(files, &names, &mut saved).await;

        if self.retention == UploadRetention::DeleteAfterIngest {
            for path in &saved {
                if let Err(e) = tokio::fs::remove_file(path).await {
                    tracing::warn!("Could not remove upload {}: {}", path.display(), e);
                }
            }
        }

        result
    }

    async fn save_and_extract(
        &self,
        files: &[UploadedFile],
        names: &[String],
        saved: &mut Vec<PathBuf>,
    ) -> Result<Vec<Document>> {
        let mut documents = Vec::new();

        for (file, name) in files.iter().zip(names) {
            let path = self.upload_dir.join(name);
            // Identical names overwrite the previous upload
            tokio::fs::write(&path, &file.data).await?;
            saved.push(path);

            let data = file.data.clone();
            let filename = name.clone();
            let pages =
                tokio::task::spawn_blocking(move || PdfParser::extract_pages(&filename, &data))
                    .await
                    .map_err(|e| Error::Internal(format!("Task join error: {}", e)))??;

            tracing::info!(
                "Extracted {} pages from {} ({} bytes)",
                pages.len(),
                name,
                file.data.len()
            );

            documents.extend(
                pages
                    .into_iter()
                    .map(|page| Document::new(page.content, name.as_str(), page.page_number)),
            );
        }

        Ok(documents)
    }
}

/// Reduce a client filename to its final component; `None` when nothing usable remains
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim();

    if name.is_empty() || name == "." || name == ".." {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::pdf_with_pages;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("notes.pdf").as_deref(), Some("notes.pdf"));
        assert_eq!(sanitize_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_filename("C:\\docs\\a.pdf").as_deref(), Some("a.pdf"));
        assert_eq!(sanitize_filename(""), None);
        assert_eq!(sanitize_filename("   "), None);
        assert_eq!(sanitize_filename("dir/"), None);
        assert_eq!(sanitize_filename(".."), None);
    }

    #[tokio::test]
    async fn test_rejects_empty_batch_and_empty_names() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = Ingestor::new(dir.path().join("uploads"), UploadRetention::Retain);

        assert!(matches!(ingestor.ingest(&[]).await, Err(Error::NoFileSelected)));

        let files = vec![
            UploadedFile::new("ok.pdf", pdf_with_pages(&["text"])),
            UploadedFile::new("", Vec::new()),
        ];
        assert!(matches!(ingestor.ingest(&files).await, Err(Error::NoFileSelected)));
        // nothing was written
        assert!(!dir.path().join("uploads").exists());
    }

    #[tokio::test]
    async fn test_emits_page_documents_and_retains_files() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = Ingestor::new(dir.path(), UploadRetention::Retain);

        let files = vec![
            UploadedFile::new("a.pdf", pdf_with_pages(&["Aspirin reduces fever."])),
            UploadedFile::new("b.pdf", pdf_with_pages(&["Rest.", "Fluids."])),
        ];
        let docs = ingestor.ingest(&files).await.unwrap();

        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].metadata().source, "a.pdf");
        assert_eq!(docs[0].metadata().page, 1);
        assert!(docs[0].text().contains("Aspirin"));
        assert_eq!(docs[2].metadata().source, "b.pdf");
        assert_eq!(docs[2].metadata().page, 2);

        assert!(dir.path().join("a.pdf").exists());
        assert!(dir.path().join("b.pdf").exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_fails_batch_and_delete_policy_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let ingestor = Ingestor::new(dir.path(), UploadRetention::DeleteAfterIngest);

        let files = vec![
            UploadedFile::new("good.pdf", pdf_with_pages(&["Aspirin reduces fever."])),
            UploadedFile::new("bad.pdf", b"garbage".to_vec()),
        ];
        let result = ingestor.ingest(&files).await;

        assert!(matches!(result, Err(Error::FileParse { .. })));
        assert!(!dir.path().join("good.pdf").exists());
        assert!(!dir.path().join("bad.pdf").exists());
    }
}
