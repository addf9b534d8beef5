//! PDF upload endpoint

use axum::{
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Redirect, Response},
};

use crate::error::{Error, Result};
use crate::ingestion::UploadedFile;
use crate::server::state::AppState;

/// Multipart field carrying the PDFs
pub const FILE_FIELD: &str = "pdf_files";

pub const NO_FILE_PART: &str = "No file part";
pub const NO_SELECTED_FILE: &str = "No selected file";
pub const UPLOAD_FAILED: &str = "An error occurred while processing the PDFs.";

/// POST /upload - ingest PDFs, then redirect home with a notice
pub async fn upload_pdfs(State(state): State<AppState>, multipart: Multipart) -> Response {
    let notice = match read_files(multipart).await {
        Ok(None) => NO_FILE_PART.to_string(),
        Ok(Some(files)) => match state.service().upload(&files).await {
            Ok(report) => format!(
                "PDFs uploaded and processed successfully ({} pages from {} files, {} in total). \
                 The knowledge base is ready.",
                report.documents, report.files, report.index_size
            ),
            Err(Error::NoFileSelected) => NO_SELECTED_FILE.to_string(),
            Err(e) => {
                tracing::error!("An error occurred while processing the PDFs: {}", e);
                UPLOAD_FAILED.to_string()
            }
        },
        Err(e) => {
            tracing::error!("Failed to read upload: {}", e);
            UPLOAD_FAILED.to_string()
        }
    };

    (
        [(header::SET_COOKIE, state.flash().set_cookie(&notice))],
        Redirect::to("/"),
    )
        .into_response()
}

/// Collect every `pdf_files` part; `None` when the form has no such field
async fn read_files(mut multipart: Multipart) -> Result<Option<Vec<UploadedFile>>> {
    let mut files = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::Internal(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::Internal(format!("Failed to read {}: {}", filename, e)))?;

        tracing::info!("Received file: {} ({} bytes)", filename, data.len());
        files
            .get_or_insert_with(Vec::new)
            .push(UploadedFile::new(filename, data));
    }

    Ok(files)
}
