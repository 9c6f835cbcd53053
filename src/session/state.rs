//! Recording state machine and session entity
//!
//! Status transitions are pure functions here so the rules stay testable
//! without a transport.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    /// Start accepted locally, server confirmation outstanding
    Pending,
    /// Server confirmed recording has begun
    Active,
    /// Terminal: server confirmed cessation
    Stopped,
    /// Terminal: server reported an error, or the start/stop request failed
    Failed,
}

impl Default for RecordingStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl RecordingStatus {
    /// Terminal states accept no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }

    /// Stopping is only valid while the server considers us recording
    pub fn can_stop(self) -> bool {
        self == Self::Active
    }

    /// Deletion is only valid once the session can no longer produce data
    pub fn can_delete(self) -> bool {
        self.is_terminal()
    }
}

/// A single recording session instance
///
/// Holds a weak reference to the template it was started from: the template
/// may later be edited or deleted, the identifier is retained regardless.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    /// Unique recording ID
    pub id: String,

    /// Template this session was started from
    pub template_id: String,

    /// Lifecycle status; server reports are authoritative
    #[serde(default)]
    pub status: RecordingStatus,

    /// Server-assigned output filename
    #[serde(default)]
    pub filename: Option<String>,

    /// Number of channels being captured
    #[serde(default)]
    pub channel_count: Option<u32>,

    /// Server-reported start timestamp (not the client clock)
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    /// Server-reported stop timestamp, present only once stopped
    #[serde(default)]
    pub stopped_at: Option<DateTime<Utc>>,

    /// Why the session failed, preserved from the failing call
    #[serde(default)]
    pub failure_reason: Option<String>,
}

impl Recording {
    /// Local placeholder created the instant a start request is accepted,
    /// before the server has confirmed anything
    pub fn pending(id: String, template_id: String, channel_count: u32) -> Self {
        Self {
            id,
            template_id,
            status: RecordingStatus::Pending,
            filename: None,
            channel_count: Some(channel_count),
            started_at: None,
            stopped_at: None,
            failure_reason: None,
        }
    }

    /// Mark the session failed, keeping the reason
    pub fn fail(&mut self, reason: impl Into<String>) {
        self.status = RecordingStatus::Failed;
        self.failure_reason = Some(reason.into());
    }
}
