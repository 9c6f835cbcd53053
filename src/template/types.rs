//! Template and channel entities

use serde::{Deserialize, Serialize};

/// Per-channel recording settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSettings {
    /// Display label for the track, e.g. "Vocals"
    #[serde(default)]
    pub label: Option<String>,

    /// Input gain in dB
    #[serde(default)]
    pub gain_db: f32,

    /// Record this input together with the next one as a stereo pair
    #[serde(default)]
    pub stereo: bool,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            label: None,
            gain_db: 0.0,
            stereo: false,
        }
    }
}

/// One device-bound recording track within a template
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    /// Unique channel ID
    pub id: String,

    /// Owning template
    pub template_id: String,

    /// Referenced audio device (non-owning; the device lives in the catalog)
    pub device_id: String,

    /// Input index on the device
    pub index: u32,

    /// Channel-specific settings
    #[serde(default)]
    pub settings: ChannelSettings,
}

/// A named, reusable channel configuration used to start recordings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Unique template ID
    pub id: String,

    /// Template name
    pub name: String,

    /// Channels in insertion order
    #[serde(default)]
    pub channels: Vec<Channel>,
}

/// Channel description used before a server identifier exists
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSpec {
    pub device_id: String,
    pub index: u32,
    #[serde(default)]
    pub settings: ChannelSettings,
}

impl ChannelSpec {
    pub fn new(device_id: impl Into<String>, index: u32) -> Self {
        Self {
            device_id: device_id.into(),
            index,
            settings: ChannelSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: ChannelSettings) -> Self {
        self.settings = settings;
        self
    }
}

impl From<&Channel> for ChannelSpec {
    fn from(channel: &Channel) -> Self {
        Self {
            device_id: channel.device_id.clone(),
            index: channel.index,
            settings: channel.settings.clone(),
        }
    }
}

/// Input for creating a template
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDraft {
    pub name: String,
    pub channels: Vec<ChannelSpec>,
}

impl TemplateDraft {
    pub fn new(name: impl Into<String>, channels: Vec<ChannelSpec>) -> Self {
        Self {
            name: name.into(),
            channels,
        }
    }
}

/// Partial update for a template; `None` fields are left as-is
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplatePatch {
    #[serde(default)]
    pub name: Option<String>,

    /// Replacement channel set; validated as a whole before any write
    #[serde(default)]
    pub channels: Option<Vec<ChannelSpec>>,
}
