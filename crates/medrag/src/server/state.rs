//! Application state for the HTTP server

use std::sync::Arc;

use crate::error::Result;
use crate::service::RagService;

use super::flash::FlashKey;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    service: RagService,
    flash: FlashKey,
}

impl AppState {
    /// Wrap a service; `secret_key` signs flash notices
    pub fn new(service: RagService, secret_key: &str) -> Result<Self> {
        Ok(Self {
            inner: Arc::new(AppStateInner {
                service,
                flash: FlashKey::new(secret_key)?,
            }),
        })
    }

    /// Question-answering service
    pub fn service(&self) -> &RagService {
        &self.inner.service
    }

    /// Flash cookie signer
    pub fn flash(&self) -> &FlashKey {
        &self.inner.flash
    }

    /// Whether questions can be answered
    pub fn is_ready(&self) -> bool {
        self.inner.service.knowledge_base().is_ready()
    }
}
