//! Recording session manager
//!
//! Drives each recording's lifecycle against the remote service:
//! request → active → stopped/failed. Local state is a cache only; whenever
//! the server reports a status, the server wins.

use super::state::{Recording, RecordingStatus};
use crate::client::{collections, ResourceClient, ResourceTransport};
use crate::error::{ApiError, ApiResult};
use crate::template::{ChannelSpec, TemplateManager};
use parking_lot::{Mutex, RwLock};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Replacement device ids keyed by the template's original device id
pub type DeviceOverrides = HashMap<String, String>;

/// Events emitted on session transitions
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Server confirmed the recording has begun
    Started(Recording),
    /// Server confirmed cessation
    Stopped(Recording),
    /// A start or stop request failed
    Failed { recording_id: String, reason: String },
}

/// Manages recording sessions and their state machine
#[derive(Clone)]
pub struct SessionManager {
    recordings: ResourceClient<Recording>,
    templates: TemplateManager,

    /// Locally tracked sessions, corrected by server reports
    tracked: Arc<RwLock<HashMap<String, Recording>>>,

    /// Recording ids with a start/stop/delete currently outstanding
    in_flight: Arc<Mutex<HashSet<String>>>,

    /// Event broadcaster
    event_tx: broadcast::Sender<SessionEvent>,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn ResourceTransport>, templates: TemplateManager) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            recordings: ResourceClient::new(transport, collections::RECORDINGS),
            templates,
            tracked: Arc::new(RwLock::new(HashMap::new())),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            event_tx,
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Snapshot of locally tracked sessions, including pending and failed
    /// placeholders the server never saw
    pub fn tracked_recordings(&self) -> Vec<Recording> {
        self.tracked.read().values().cloned().collect()
    }

    /// Start a recording from a template.
    ///
    /// The template's channels are resolved and re-validated first, so a
    /// stale or invalid template surfaces as `ValidationRejected` locally,
    /// before any start command is sent. On success the returned recording
    /// is `active` with the server's start timestamp.
    pub async fn start(
        &self,
        template_id: &str,
        overrides: Option<&DeviceOverrides>,
    ) -> ApiResult<Recording> {
        let template = self.templates.get_template(template_id).await?;

        let mut specs: Vec<ChannelSpec> =
            template.channels.iter().map(ChannelSpec::from).collect();
        if let Some(overrides) = overrides {
            for spec in &mut specs {
                if let Some(replacement) = overrides.get(&spec.device_id) {
                    spec.device_id = replacement.clone();
                }
            }
        }
        self.templates.validate_channel_set(&specs).await?;

        // Tracked as pending from the instant the request is accepted
        let local_id = Uuid::new_v4().to_string();
        let pending = Recording::pending(
            local_id.clone(),
            template_id.to_string(),
            specs.len() as u32,
        );
        self.tracked.write().insert(local_id.clone(), pending);

        tracing::info!(
            "Starting recording from template {template_id} ({} channel(s))",
            specs.len()
        );

        let payload = json!({
            "templateId": template_id,
            "channelCount": specs.len(),
            "channels": specs,
        });
        match self.recordings.action(None, "start", payload).await {
            Ok(recording) => {
                let mut tracked = self.tracked.write();
                tracked.remove(&local_id);
                tracked.insert(recording.id.clone(), recording.clone());
                drop(tracked);

                let _ = self.event_tx.send(SessionEvent::Started(recording.clone()));
                tracing::info!("Recording {} active", recording.id);
                Ok(recording)
            }
            Err(e) => {
                let reason = e.to_string();
                if let Some(recording) = self.tracked.write().get_mut(&local_id) {
                    recording.fail(reason.clone());
                }
                let _ = self.event_tx.send(SessionEvent::Failed {
                    recording_id: local_id,
                    reason: reason.clone(),
                });
                tracing::warn!("Recording start failed: {reason}");
                Err(e)
            }
        }
    }

    /// Stop an active recording.
    ///
    /// On success the recording is `stopped` with the server's stop
    /// timestamp. On failure it remains `active`: a terminal state the
    /// server has not confirmed is never assumed.
    pub async fn stop(&self, recording_id: &str) -> ApiResult<Recording> {
        let _guard = self.begin_transition(recording_id)?;

        let current = self.fetch_and_reconcile(recording_id).await?;
        if !current.status.can_stop() {
            return Err(invalid_transition(recording_id, current.status, "stop"));
        }

        let recording = match self
            .recordings
            .action(Some(recording_id), "stop", json!({}))
            .await
        {
            Ok(recording) => recording,
            Err(e) => {
                let reason = e.to_string();
                let _ = self.event_tx.send(SessionEvent::Failed {
                    recording_id: recording_id.to_string(),
                    reason: reason.clone(),
                });
                tracing::warn!("Recording stop failed: {reason}");
                return Err(e);
            }
        };
        self.reconcile(&recording);

        let _ = self.event_tx.send(SessionEvent::Stopped(recording.clone()));
        tracing::info!("Recording {recording_id} stopped");
        Ok(recording)
    }

    /// Delete a recording; only terminal sessions can be removed.
    ///
    /// A recording the server never saw (a start that failed locally) only
    /// exists as a tracked placeholder; deleting it evicts the placeholder.
    pub async fn delete(&self, recording_id: &str) -> ApiResult<()> {
        let _guard = self.begin_transition(recording_id)?;

        let current = match self.fetch_and_reconcile(recording_id).await {
            Ok(recording) => recording,
            Err(err @ ApiError::NotFound(_)) => {
                let mut tracked = self.tracked.write();
                return match tracked.get(recording_id) {
                    Some(local) if local.status.can_delete() => {
                        tracked.remove(recording_id);
                        tracing::info!("Discarded local-only recording {recording_id}");
                        Ok(())
                    }
                    Some(local) => Err(ApiError::ConflictActiveRecording(format!(
                        "recording {recording_id} is still {}",
                        status_name(local.status)
                    ))),
                    None => Err(err),
                };
            }
            Err(e) => return Err(e),
        };
        if !current.status.can_delete() {
            return Err(ApiError::ConflictActiveRecording(format!(
                "recording {recording_id} is still {}",
                status_name(current.status)
            )));
        }

        self.recordings.delete(recording_id).await?;
        self.tracked.write().remove(recording_id);
        tracing::info!("Deleted recording {recording_id}");
        Ok(())
    }

    /// List recordings from the server, correcting local state
    pub async fn list_recordings(&self) -> ApiResult<Vec<Recording>> {
        let recordings = self.recordings.list().await?;
        for recording in &recordings {
            self.reconcile(recording);
        }
        Ok(recordings)
    }

    /// Fetch one recording from the server, correcting local state
    pub async fn get_recording(&self, recording_id: &str) -> ApiResult<Recording> {
        self.fetch_and_reconcile(recording_id).await
    }

    async fn fetch_and_reconcile(&self, recording_id: &str) -> ApiResult<Recording> {
        let recording = self.recordings.get(recording_id).await?;
        self.reconcile(&recording);
        Ok(recording)
    }

    /// Server reports are authoritative: overwrite whatever we tracked
    fn reconcile(&self, recording: &Recording) {
        let mut tracked = self.tracked.write();
        if let Some(local) = tracked.get(&recording.id) {
            if local.status != recording.status {
                tracing::debug!(
                    "Correcting recording {} from {} to {}",
                    recording.id,
                    status_name(local.status),
                    status_name(recording.status)
                );
            }
        }
        tracked.insert(recording.id.clone(), recording.clone());
    }

    /// Claim the id for a transition, rejecting concurrent claims
    fn begin_transition(&self, recording_id: &str) -> ApiResult<TransitionGuard> {
        let mut in_flight = self.in_flight.lock();
        if !in_flight.insert(recording_id.to_string()) {
            return Err(ApiError::ConflictInProgress(recording_id.to_string()));
        }
        Ok(TransitionGuard {
            in_flight: Arc::clone(&self.in_flight),
            id: recording_id.to_string(),
        })
    }
}

/// Releases the in-flight claim when the transition resolves
struct TransitionGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
    id: String,
}

impl Drop for TransitionGuard {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.id);
    }
}

fn status_name(status: RecordingStatus) -> &'static str {
    match status {
        RecordingStatus::Pending => "pending",
        RecordingStatus::Active => "active",
        RecordingStatus::Stopped => "stopped",
        RecordingStatus::Failed => "failed",
    }
}

fn invalid_transition(
    recording_id: &str,
    from: RecordingStatus,
    action: &'static str,
) -> ApiError {
    ApiError::InvalidTransition {
        recording_id: recording_id.to_string(),
        from: status_name(from).to_string(),
        action,
    }
}
