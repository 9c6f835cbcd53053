//! Resource transport trait
//!
//! Collection-style CRUD plus action endpoints, abstracted behind a trait so
//! the managers never touch HTTP directly.

use crate::error::ApiResult;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

/// Server collection names
pub mod collections {
    pub const AUDIO_DEVICES: &str = "audiodevice";
    pub const RECORDINGS: &str = "recordings";
    pub const TEMPLATES: &str = "templates";
    pub const TEMPLATE_CHANNELS: &str = "template-channels";
}

/// A single query-string filter, e.g. `("template", "42")`
pub type QueryParam = (&'static str, String);

/// Capability to perform CRUD-shaped requests against a named collection.
///
/// One logical attempt per call: no caching, no retry. Retry policy belongs
/// to callers that can judge whether an operation warrants it.
#[async_trait]
pub trait ResourceTransport: Send + Sync {
    /// List entities, preserving server-reported order
    async fn list(&self, collection: &str, query: &[QueryParam]) -> ApiResult<Vec<Value>>;

    /// Fetch a single entity by identifier
    async fn get(&self, collection: &str, id: &str) -> ApiResult<Value>;

    /// Create an entity; the server assigns the identifier
    async fn create(&self, collection: &str, payload: Value) -> ApiResult<Value>;

    /// Replace an entity
    async fn update(&self, collection: &str, id: &str, payload: Value) -> ApiResult<Value>;

    /// Delete an entity
    async fn delete(&self, collection: &str, id: &str) -> ApiResult<()>;

    /// Invoke an action endpoint, collection-scoped (`id = None`) or
    /// item-scoped (`id = Some`)
    async fn action(
        &self,
        collection: &str,
        id: Option<&str>,
        name: &str,
        payload: Value,
    ) -> ApiResult<Value>;
}

/// Page envelope returned by paginated list endpoints
#[derive(Debug, Deserialize)]
struct PageEnvelope {
    results: Vec<Value>,
}

/// Unwrap a list response into a flat sequence.
///
/// The server returns either a bare array or a page envelope with a
/// `results` array; callers always see the flat form.
pub fn unwrap_list(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        other => serde_json::from_value::<PageEnvelope>(other)
            .map(|page| page.results)
            .unwrap_or_default(),
    }
}
