//! In-memory transport for tests
//!
//! Simulates the remote recording service well enough to exercise the
//! managers: per-collection stores, page-free flat lists, `start`/`stop`
//! action semantics, and switchable per-collection outages.

use crate::client::transport::{collections, QueryParam, ResourceTransport};
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

#[derive(Default)]
struct Store {
    // Insertion-ordered, like the server's collection listing
    items: Vec<Value>,
    next_id: u64,
}

impl Store {
    fn mint_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item["id"].as_str() == Some(id))
    }
}

/// Fake remote service backing the manager tests
pub struct MockTransport {
    stores: Mutex<HashMap<String, Store>>,
    down: Mutex<HashSet<&'static str>>,
    actions_down: Mutex<HashSet<&'static str>>,
    deletes_down: Mutex<HashSet<&'static str>>,
    creates_left: Mutex<HashMap<&'static str, u64>>,
    action_log: Mutex<Vec<String>>,
    action_delay: Mutex<Option<Duration>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            stores: Mutex::new(HashMap::new()),
            down: Mutex::new(HashSet::new()),
            actions_down: Mutex::new(HashSet::new()),
            deletes_down: Mutex::new(HashSet::new()),
            creates_left: Mutex::new(HashMap::new()),
            action_log: Mutex::new(Vec::new()),
            action_delay: Mutex::new(None),
        }
    }

    /// Pre-populate a collection; ids must already be set on the values
    pub fn seed(&self, collection: &str, values: Vec<Value>) {
        let mut stores = self.stores.lock();
        let store = stores.entry(collection.to_string()).or_default();
        store.next_id += values.len() as u64;
        store.items.extend(values);
    }

    /// Make every call against the collection fail with
    /// `TransportUnavailable` until [`restore`](Self::restore) is called
    pub fn take_down(&self, collection: &'static str) {
        self.down.lock().insert(collection);
    }

    pub fn restore(&self, collection: &'static str) {
        self.down.lock().remove(collection);
        self.actions_down.lock().remove(collection);
        self.deletes_down.lock().remove(collection);
        self.creates_left.lock().remove(collection);
    }

    /// Fail only the collection's action endpoints, leaving CRUD reachable
    pub fn take_down_actions(&self, collection: &'static str) {
        self.actions_down.lock().insert(collection);
    }

    /// Let `n` more creates on the collection succeed, then fail them,
    /// to break a multi-row write sequence partway through
    pub fn fail_creates_after(&self, collection: &'static str, n: u64) {
        self.creates_left.lock().insert(collection, n);
    }

    /// Fail deletes on the collection, leaving other calls reachable
    pub fn fail_deletes(&self, collection: &'static str) {
        self.deletes_down.lock().insert(collection);
    }

    /// Drop an entity out-of-band, as if another client deleted it
    pub fn remove(&self, collection: &str, id: &str) {
        let mut stores = self.stores.lock();
        if let Some(store) = stores.get_mut(collection) {
            if let Some(pos) = store.position(id) {
                store.items.remove(pos);
            }
        }
    }

    /// Delay action endpoints, to hold a transition in flight
    pub fn set_action_delay(&self, delay: Duration) {
        *self.action_delay.lock() = Some(delay);
    }

    /// Action endpoints invoked so far, as `collection/name` strings
    pub fn actions(&self) -> Vec<String> {
        self.action_log.lock().clone()
    }

    fn check_up(&self, collection: &str) -> ApiResult<()> {
        if self.down.lock().contains(collection) {
            return Err(ApiError::TransportUnavailable(format!(
                "{collection}: connection refused"
            )));
        }
        Ok(())
    }

    fn matches(item: &Value, query: &[QueryParam]) -> bool {
        query.iter().all(|(key, expected)| {
            let direct = item[*key].as_str() == Some(expected);
            let by_reference = item[format!("{key}Id")].as_str() == Some(expected);
            direct || by_reference
        })
    }

    fn start_recording(&self, payload: Value) -> ApiResult<Value> {
        let mut stores = self.stores.lock();
        let store = stores.entry(collections::RECORDINGS.to_string()).or_default();
        let id = store.mint_id();

        let recording = json!({
            "id": id,
            "templateId": payload["templateId"],
            "status": "active",
            "filename": payload["filename"],
            "channelCount": payload["channelCount"],
            "startedAt": Utc::now().to_rfc3339(),
            "stoppedAt": null,
        });
        store.items.push(recording.clone());
        Ok(recording)
    }

    fn stop_recording(&self, id: &str) -> ApiResult<Value> {
        let mut stores = self.stores.lock();
        let store = stores.entry(collections::RECORDINGS.to_string()).or_default();
        let pos = store
            .position(id)
            .ok_or_else(|| ApiError::NotFound(format!("recordings/{id}")))?;

        let recording = &mut store.items[pos];
        if recording["status"] != "active" {
            return Err(ApiError::ValidationRejected(vec![]));
        }

        // Keep stoppedAt strictly after startedAt even within one test tick
        let started = recording["startedAt"]
            .as_str()
            .and_then(|s| s.parse::<chrono::DateTime<Utc>>().ok())
            .unwrap_or_else(Utc::now);
        let stopped = Utc::now().max(started + ChronoDuration::milliseconds(1));

        recording["status"] = json!("stopped");
        recording["stoppedAt"] = json!(stopped.to_rfc3339());
        Ok(recording.clone())
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceTransport for MockTransport {
    async fn list(&self, collection: &str, query: &[QueryParam]) -> ApiResult<Vec<Value>> {
        self.check_up(collection)?;
        let stores = self.stores.lock();
        let items = stores
            .get(collection)
            .map(|store| {
                store
                    .items
                    .iter()
                    .filter(|item| Self::matches(item, query))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(items)
    }

    async fn get(&self, collection: &str, id: &str) -> ApiResult<Value> {
        self.check_up(collection)?;
        let stores = self.stores.lock();
        stores
            .get(collection)
            .and_then(|store| store.position(id).map(|pos| store.items[pos].clone()))
            .ok_or_else(|| ApiError::NotFound(format!("{collection}/{id}")))
    }

    async fn create(&self, collection: &str, mut payload: Value) -> ApiResult<Value> {
        self.check_up(collection)?;
        {
            let mut left = self.creates_left.lock();
            if let Some(remaining) = left.get_mut(collection) {
                if *remaining == 0 {
                    return Err(ApiError::TransportUnavailable(format!(
                        "{collection}: connection reset"
                    )));
                }
                *remaining -= 1;
            }
        }
        let mut stores = self.stores.lock();
        let store = stores.entry(collection.to_string()).or_default();
        payload["id"] = json!(store.mint_id());
        store.items.push(payload.clone());
        Ok(payload)
    }

    async fn update(&self, collection: &str, id: &str, mut payload: Value) -> ApiResult<Value> {
        self.check_up(collection)?;
        let mut stores = self.stores.lock();
        let store = stores
            .get_mut(collection)
            .ok_or_else(|| ApiError::NotFound(format!("{collection}/{id}")))?;
        let pos = store
            .position(id)
            .ok_or_else(|| ApiError::NotFound(format!("{collection}/{id}")))?;

        payload["id"] = json!(id);
        // PUT replaces, but server-owned fields survive
        for key in ["startedAt", "stoppedAt"] {
            if payload.get(key).is_none() {
                if let Some(existing) = store.items[pos].get(key) {
                    payload[key] = existing.clone();
                }
            }
        }
        store.items[pos] = payload.clone();
        Ok(payload)
    }

    async fn delete(&self, collection: &str, id: &str) -> ApiResult<()> {
        self.check_up(collection)?;
        if self.deletes_down.lock().contains(collection) {
            return Err(ApiError::TransportUnavailable(format!(
                "{collection}/{id}: connection reset"
            )));
        }
        let mut stores = self.stores.lock();
        let store = stores
            .get_mut(collection)
            .ok_or_else(|| ApiError::NotFound(format!("{collection}/{id}")))?;
        let pos = store
            .position(id)
            .ok_or_else(|| ApiError::NotFound(format!("{collection}/{id}")))?;
        store.items.remove(pos);
        Ok(())
    }

    async fn action(
        &self,
        collection: &str,
        id: Option<&str>,
        name: &str,
        payload: Value,
    ) -> ApiResult<Value> {
        self.action_log.lock().push(format!("{collection}/{name}"));

        let delay = *self.action_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.check_up(collection)?;
        if self.actions_down.lock().contains(collection) {
            return Err(ApiError::TransportUnavailable(format!(
                "{collection}/{name}: connection refused"
            )));
        }
        match (collection, id, name) {
            (collections::RECORDINGS, None, "start") => self.start_recording(payload),
            (collections::RECORDINGS, Some(id), "stop") => self.stop_recording(id),
            _ => Err(ApiError::NotFound(format!("{collection}/{name}"))),
        }
    }
}
