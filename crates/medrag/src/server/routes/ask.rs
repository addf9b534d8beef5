//! Question endpoint

use axum::{extract::State, Form};
use serde::Deserialize;

use crate::error::Result;
use crate::server::state::AppState;

/// Form body of `POST /ask`
#[derive(Debug, Deserialize)]
pub struct AskForm {
    pub prompt: String,
}

/// POST /ask - answer a question as plain text
pub async fn ask_question(
    State(state): State<AppState>,
    Form(form): Form<AskForm>,
) -> Result<String> {
    // Questions may contain health details, so only their size is logged
    tracing::debug!("Question received ({} bytes)", form.prompt.len());

    let outcome = state.service().ask(&form.prompt).await.map_err(|e| {
        tracing::error!("Failed to answer question: {}", e);
        e
    })?;

    Ok(outcome.message().to_string())
}
