//! Device catalog
//!
//! Read-only view of the audio devices the remote service can record from.
//! Devices are created and destroyed by the service's device layer; this
//! side only lists and resolves them.

use crate::client::{collections, ResourceClient, ResourceTransport};
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Information about an audio device
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioDevice {
    /// Unique device ID
    pub id: String,

    /// Device name
    pub name: String,

    /// Number of input channels the device exposes
    #[serde(default)]
    pub channel_count: Option<u32>,

    /// Whether this is the default device
    #[serde(default)]
    pub is_default: bool,
}

/// Read-only catalog of available audio devices
#[derive(Clone)]
pub struct DeviceCatalog {
    devices: ResourceClient<AudioDevice>,
}

impl DeviceCatalog {
    pub fn new(transport: Arc<dyn ResourceTransport>) -> Self {
        Self {
            devices: ResourceClient::new(transport, collections::AUDIO_DEVICES),
        }
    }

    /// List devices in server-reported order
    pub async fn list_devices(&self) -> ApiResult<Vec<AudioDevice>> {
        self.devices.list().await
    }

    /// Resolve a single device by identifier
    pub async fn get_device(&self, id: &str) -> ApiResult<AudioDevice> {
        self.devices.get(id).await
    }
}
