//! Mixdesk Remote - recording sessions and channel templates over the wire.
//!
//! This crate is a typed client for a remote multi-channel recording
//! service. It owns the session and template lifecycle model: which
//! devices exist, how a template's channels are validated, and how a
//! recording moves from request to completion.

pub mod catalog;
pub mod client;
pub mod error;
pub mod session;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::{AudioDevice, DeviceCatalog};
pub use client::{ClientConfig, HttpTransport, ResourceClient, ResourceTransport};
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use session::{Recording, RecordingStatus, SessionManager};
pub use template::{Channel, Template, TemplateDraft, TemplateManager};

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// All four component contracts wired against one transport
#[derive(Clone)]
pub struct RemoteRecorder {
    pub catalog: DeviceCatalog,
    pub templates: TemplateManager,
    pub sessions: SessionManager,
}

impl RemoteRecorder {
    /// Wire the managers over an HTTP transport for the configured endpoint
    pub fn connect(config: ClientConfig) -> ApiResult<Self> {
        tracing::info!("Connecting to recording service at {}", config.base_url);
        let transport = Arc::new(HttpTransport::new(config)?);
        Ok(Self::with_transport(transport))
    }

    /// Wire the managers over any transport implementation
    pub fn with_transport(transport: Arc<dyn ResourceTransport>) -> Self {
        let catalog = DeviceCatalog::new(Arc::clone(&transport));
        let templates = TemplateManager::new(Arc::clone(&transport), catalog.clone());
        let sessions = SessionManager::new(transport, templates.clone());
        Self {
            catalog,
            templates,
            sessions,
        }
    }
}

/// Initialize tracing/logging for binaries embedding this crate
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mixdesk_remote=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
