//! HTTP transport
//!
//! reqwest-backed implementation of [`ResourceTransport`] against the
//! remote recording service's REST API.

use super::config::ClientConfig;
use super::transport::{unwrap_list, QueryParam, ResourceTransport};
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

/// Transport speaking the service's collection-per-path REST dialect.
///
/// Every collection and item URL carries a trailing slash; list endpoints
/// may respond with a page envelope, which is unwrapped here.
pub struct HttpTransport {
    config: ClientConfig,
    client: Client,
}

impl HttpTransport {
    /// Build a transport for the configured endpoint
    pub fn new(config: ClientConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ApiError::TransportUnavailable(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{}/{}/", self.config.base_url, collection)
    }

    fn item_url(&self, collection: &str, id: &str) -> String {
        format!("{}/{}/{}/", self.config.base_url, collection, id)
    }

    fn action_url(&self, collection: &str, id: Option<&str>, name: &str) -> String {
        match id {
            Some(id) => format!("{}/{}/{}/{}/", self.config.base_url, collection, id, name),
            None => format!("{}/{}/{}/", self.config.base_url, collection, name),
        }
    }

    /// Classify a non-success HTTP response
    async fn classify(response: Response) -> ApiError {
        let status = response.status();
        let message = response.text().await.unwrap_or_default();

        match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                // Server-side rejection of a payload we could not rule out
                // locally; no channel detail is available from the wire.
                ApiError::ValidationRejected(vec![])
            }
            _ => ApiError::ServerFault {
                status: status.as_u16(),
                message,
            },
        }
    }

    async fn read_json(response: Response) -> ApiResult<Value> {
        if !response.status().is_success() {
            return Err(Self::classify(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| ApiError::TransportUnavailable(e.to_string()))
    }
}

fn transport_error(e: reqwest::Error) -> ApiError {
    ApiError::TransportUnavailable(e.to_string())
}

#[async_trait]
impl ResourceTransport for HttpTransport {
    async fn list(&self, collection: &str, query: &[QueryParam]) -> ApiResult<Vec<Value>> {
        let response = self
            .client
            .get(self.collection_url(collection))
            .query(query)
            .send()
            .await
            .map_err(transport_error)?;

        let body = Self::read_json(response).await?;
        Ok(unwrap_list(body))
    }

    async fn get(&self, collection: &str, id: &str) -> ApiResult<Value> {
        let response = self
            .client
            .get(self.item_url(collection, id))
            .send()
            .await
            .map_err(transport_error)?;

        Self::read_json(response).await
    }

    async fn create(&self, collection: &str, payload: Value) -> ApiResult<Value> {
        let response = self
            .client
            .post(self.collection_url(collection))
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        Self::read_json(response).await
    }

    async fn update(&self, collection: &str, id: &str, payload: Value) -> ApiResult<Value> {
        let response = self
            .client
            .put(self.item_url(collection, id))
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        Self::read_json(response).await
    }

    async fn delete(&self, collection: &str, id: &str) -> ApiResult<()> {
        let response = self
            .client
            .delete(self.item_url(collection, id))
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(Self::classify(response).await);
        }
        Ok(())
    }

    async fn action(
        &self,
        collection: &str,
        id: Option<&str>,
        name: &str,
        payload: Value,
    ) -> ApiResult<Value> {
        let response = self
            .client
            .post(self.action_url(collection, id, name))
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        Self::read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> HttpTransport {
        HttpTransport::new(ClientConfig::new("http://localhost:8000/api")).unwrap()
    }

    #[test]
    fn test_collection_url_has_trailing_slash() {
        let t = transport();
        assert_eq!(
            t.collection_url("recordings"),
            "http://localhost:8000/api/recordings/"
        );
    }

    #[test]
    fn test_item_url() {
        let t = transport();
        assert_eq!(
            t.item_url("templates", "42"),
            "http://localhost:8000/api/templates/42/"
        );
    }

    #[test]
    fn test_action_urls() {
        let t = transport();
        assert_eq!(
            t.action_url("recordings", None, "start"),
            "http://localhost:8000/api/recordings/start/"
        );
        assert_eq!(
            t.action_url("recordings", Some("7"), "stop"),
            "http://localhost:8000/api/recordings/7/stop/"
        );
    }
}
