//! Routes for the upload/ask interface

pub mod ask;
pub mod pages;
pub mod upload;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use crate::server::state::AppState;

/// Browser-facing routes
pub fn page_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/", get(pages::index))
        .route(
            "/upload",
            post(upload::upload_pdfs).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/ask", post(ask::ask_question))
}

/// JSON routes, nested under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new().route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<serde_json::Value> {
    let service = state.service();
    let kb = service.knowledge_base();

    Json(json!({
        "name": "medrag",
        "version": env!("CARGO_PKG_VERSION"),
        "ready": kb.is_ready(),
        "index": {
            "documents": kb.len(),
            "metric": kb.metric(),
            "embedder": kb.embedder(),
        },
        "retrieval": {
            "top_k": service.top_k(),
        },
        "llm": {
            "provider": service.llm().name(),
            "model": service.llm().model(),
        },
        "endpoints": {
            "GET /": "Upload and ask form",
            "POST /upload": "Upload PDFs (multipart field pdf_files)",
            "POST /ask": "Ask a question (form field prompt)",
            "GET /health": "Liveness",
            "GET /ready": "Knowledge base loaded"
        }
    }))
}
