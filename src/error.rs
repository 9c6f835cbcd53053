//! Error types and handling
//!
//! Classified failures shared by the resource client and the managers.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single rejected channel, reported by template validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelViolation {
    /// Device referenced by the offending channel
    pub device_id: String,

    /// Input index of the offending channel
    pub index: u32,

    /// What is wrong with it
    pub reason: String,
}

impl ChannelViolation {
    pub fn new(device_id: impl Into<String>, index: u32, reason: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            index,
            reason: reason.into(),
        }
    }
}

/// Classified failure for every client and manager operation
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("validation rejected: {}", format_violations(.0))]
    ValidationRejected(Vec<ChannelViolation>),

    #[error("validation unavailable: {0}")]
    ValidationUnavailable(String),

    #[error("operation blocked by active recording: {0}")]
    ConflictActiveRecording(String),

    #[error("transition already in flight for recording: {0}")]
    ConflictInProgress(String),

    #[error("recording {recording_id} is {from}, cannot {action}")]
    InvalidTransition {
        recording_id: String,
        from: String,
        action: &'static str,
    },

    #[error("transport unavailable: {0}")]
    TransportUnavailable(String),

    #[error("server fault ({status}): {message}")]
    ServerFault { status: u16, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    /// Whether retrying the same call later could succeed without
    /// changing the input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::TransportUnavailable(_)
                | ApiError::ServerFault { .. }
                | ApiError::ValidationUnavailable(_)
        )
    }
}

fn format_violations(violations: &[ChannelViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}#{}: {}", v.device_id, v.index, v.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error response for presentation layers
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<ApiError> for ErrorResponse {
    fn from(error: ApiError) -> Self {
        let code = match &error {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::ValidationRejected(_) => "VALIDATION_REJECTED",
            ApiError::ValidationUnavailable(_) => "VALIDATION_UNAVAILABLE",
            ApiError::ConflictActiveRecording(_) => "CONFLICT_ACTIVE_RECORDING",
            ApiError::ConflictInProgress(_) => "CONFLICT_IN_PROGRESS",
            ApiError::InvalidTransition { .. } => "INVALID_TRANSITION",
            ApiError::TransportUnavailable(_) => "TRANSPORT_UNAVAILABLE",
            ApiError::ServerFault { .. } => "SERVER_FAULT",
            ApiError::Serialization(_) => "SERIALIZATION_ERROR",
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;
