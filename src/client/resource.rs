//! Typed resource client
//!
//! A thin typed wrapper over [`ResourceTransport`] bound to one collection.

use super::transport::{QueryParam, ResourceTransport};
use crate::error::{ApiError, ApiResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

/// Typed list/get/create/update/delete for a single collection
pub struct ResourceClient<T> {
    transport: Arc<dyn ResourceTransport>,
    collection: &'static str,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for ResourceClient<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            collection: self.collection,
            _entity: PhantomData,
        }
    }
}

impl<T: DeserializeOwned> ResourceClient<T> {
    pub fn new(transport: Arc<dyn ResourceTransport>, collection: &'static str) -> Self {
        Self {
            transport,
            collection,
            _entity: PhantomData,
        }
    }

    pub fn collection(&self) -> &'static str {
        self.collection
    }

    /// List entities in server-reported order
    pub async fn list(&self) -> ApiResult<Vec<T>> {
        self.list_filtered(&[]).await
    }

    /// List entities matching the given query filters
    pub async fn list_filtered(&self, query: &[QueryParam]) -> ApiResult<Vec<T>> {
        let values = self.transport.list(self.collection, query).await?;
        values
            .into_iter()
            .map(|v| serde_json::from_value(v).map_err(ApiError::from))
            .collect()
    }

    pub async fn get(&self, id: &str) -> ApiResult<T> {
        let value = self.transport.get(self.collection, id).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn create(&self, payload: &impl Serialize) -> ApiResult<T> {
        let body = serde_json::to_value(payload)?;
        let value = self.transport.create(self.collection, body).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn update(&self, id: &str, payload: &impl Serialize) -> ApiResult<T> {
        let body = serde_json::to_value(payload)?;
        let value = self.transport.update(self.collection, id, body).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn delete(&self, id: &str) -> ApiResult<()> {
        self.transport.delete(self.collection, id).await
    }

    /// Invoke an action endpoint and deserialize its response
    pub async fn action(
        &self,
        id: Option<&str>,
        name: &str,
        payload: Value,
    ) -> ApiResult<T> {
        let value = self
            .transport
            .action(self.collection, id, name, payload)
            .await?;
        Ok(serde_json::from_value(value)?)
    }
}
