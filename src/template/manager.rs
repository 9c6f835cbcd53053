//! Template configuration manager
//!
//! Owns template and channel lifecycle. Channel-set invariants are enforced
//! here, before any write reaches the remote service:
//! - a template holds at least one channel
//! - (device, index) pairs are unique within a template
//! - every referenced device exists in the device catalog

use super::types::{Channel, ChannelSpec, Template, TemplateDraft, TemplatePatch};
use crate::catalog::DeviceCatalog;
use crate::client::{collections, ResourceClient, ResourceTransport};
use crate::error::{ApiError, ApiResult, ChannelViolation};
use crate::session::state::Recording;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

/// Manages templates and their channels against the remote service
#[derive(Clone)]
pub struct TemplateManager {
    templates: ResourceClient<Template>,
    channels: ResourceClient<Channel>,
    recordings: ResourceClient<Recording>,
    catalog: DeviceCatalog,
}

impl TemplateManager {
    pub fn new(transport: Arc<dyn ResourceTransport>, catalog: DeviceCatalog) -> Self {
        Self {
            templates: ResourceClient::new(Arc::clone(&transport), collections::TEMPLATES),
            channels: ResourceClient::new(Arc::clone(&transport), collections::TEMPLATE_CHANNELS),
            recordings: ResourceClient::new(transport, collections::RECORDINGS),
            catalog,
        }
    }

    /// List all templates with their channels, in server order
    pub async fn list_templates(&self) -> ApiResult<Vec<Template>> {
        let mut templates = self.templates.list().await?;
        let channels = self.channels.list().await?;

        for template in &mut templates {
            template.channels = channels
                .iter()
                .filter(|c| c.template_id == template.id)
                .cloned()
                .collect();
        }
        Ok(templates)
    }

    /// Fetch a single template with its channels
    pub async fn get_template(&self, id: &str) -> ApiResult<Template> {
        let mut template = self.templates.get(id).await?;
        template.channels = self.list_channels(id).await?;
        Ok(template)
    }

    /// List a template's channels in insertion order (server-filtered)
    pub async fn list_channels(&self, template_id: &str) -> ApiResult<Vec<Channel>> {
        self.channels
            .list_filtered(&[("template", template_id.to_string())])
            .await
    }

    /// Validate and create a template together with its channels.
    ///
    /// A channel-row failure partway through removes the rows written so
    /// far, so a half-created template is never left observable.
    pub async fn create_template(&self, draft: TemplateDraft) -> ApiResult<Template> {
        self.validate_channel_set(&draft.channels).await?;

        let mut template = self
            .templates
            .create(&json!({ "name": draft.name }))
            .await?;

        for spec in &draft.channels {
            match self.create_channel_row(&template.id, spec).await {
                Ok(channel) => template.channels.push(channel),
                Err(e) => {
                    self.discard_rows(&template.channels).await;
                    if let Err(cleanup) = self.templates.delete(&template.id).await {
                        tracing::warn!(
                            "Could not remove half-created template {}: {cleanup}",
                            template.id
                        );
                    }
                    return Err(e);
                }
            }
        }

        tracing::info!(
            "Created template '{}' ({}) with {} channel(s)",
            template.name,
            template.id,
            template.channels.len()
        );
        Ok(template)
    }

    /// Apply a partial update; the merged result is validated before any
    /// write is issued.
    ///
    /// The rename goes first because a later failure can undo it with a
    /// single write; channel replacements are created before the old rows
    /// are touched, so the previously valid set survives a failure.
    pub async fn update_template(&self, id: &str, patch: TemplatePatch) -> ApiResult<Template> {
        let current = self.get_template(id).await?;

        let merged_name = patch.name.clone().unwrap_or_else(|| current.name.clone());
        let merged_channels: Vec<ChannelSpec> = match &patch.channels {
            Some(specs) => specs.clone(),
            None => current.channels.iter().map(ChannelSpec::from).collect(),
        };
        self.validate_channel_set(&merged_channels).await?;

        let renamed = merged_name != current.name;
        if renamed {
            self.templates
                .update(id, &json!({ "name": merged_name }))
                .await?;
        }

        let channels = if patch.channels.is_some() {
            match self
                .replace_channel_rows(id, &current.channels, &merged_channels)
                .await
            {
                Ok(rows) => rows,
                Err(e) => {
                    if renamed {
                        if let Err(cleanup) = self
                            .templates
                            .update(id, &json!({ "name": current.name }))
                            .await
                        {
                            tracing::warn!(
                                "Could not revert rename of template {id}: {cleanup}"
                            );
                        }
                    }
                    return Err(e);
                }
            }
        } else {
            current.channels
        };

        Ok(Template {
            id: current.id,
            name: merged_name,
            channels,
        })
    }

    /// Delete a template, unless a recording that references it is still
    /// pending or active
    pub async fn delete_template(&self, id: &str) -> ApiResult<()> {
        let recordings = self.recordings.list().await?;
        let blocking = recordings
            .iter()
            .any(|r| r.template_id == id && !r.status.is_terminal());
        if blocking {
            return Err(ApiError::ConflictActiveRecording(format!(
                "template {id} is referenced by an active recording"
            )));
        }

        let channels = self.list_channels(id).await?;
        let mut removed: Vec<ChannelSpec> = Vec::new();
        for channel in &channels {
            if let Err(e) = self.channels.delete(&channel.id).await {
                self.restore_rows(id, &removed).await;
                return Err(e);
            }
            removed.push(ChannelSpec::from(channel));
        }

        if let Err(e) = self.templates.delete(id).await {
            // The template still exists; put its channels back
            self.restore_rows(id, &removed).await;
            return Err(e);
        }

        tracing::info!("Deleted template {id}");
        Ok(())
    }

    /// Add a channel; the template's full channel set is re-validated since
    /// uniqueness is a template-wide invariant
    pub async fn add_channel(&self, template_id: &str, spec: ChannelSpec) -> ApiResult<Channel> {
        let mut merged: Vec<ChannelSpec> = self
            .list_channels(template_id)
            .await?
            .iter()
            .map(ChannelSpec::from)
            .collect();
        merged.push(spec.clone());
        self.validate_channel_set(&merged).await?;

        self.create_channel_row(template_id, &spec).await
    }

    /// Replace a channel's device, index, or settings
    pub async fn update_channel(&self, channel_id: &str, spec: ChannelSpec) -> ApiResult<Channel> {
        let existing = self.channels.get(channel_id).await?;

        let merged: Vec<ChannelSpec> = self
            .list_channels(&existing.template_id)
            .await?
            .iter()
            .map(|c| {
                if c.id == channel_id {
                    spec.clone()
                } else {
                    ChannelSpec::from(c)
                }
            })
            .collect();
        self.validate_channel_set(&merged).await?;

        self.channels
            .update(
                channel_id,
                &json!({
                    "templateId": existing.template_id,
                    "deviceId": spec.device_id,
                    "index": spec.index,
                    "settings": spec.settings,
                }),
            )
            .await
    }

    /// Remove a channel; the template must keep at least one
    pub async fn delete_channel(&self, channel_id: &str) -> ApiResult<()> {
        let existing = self.channels.get(channel_id).await?;

        let remaining: Vec<ChannelSpec> = self
            .list_channels(&existing.template_id)
            .await?
            .iter()
            .filter(|c| c.id != channel_id)
            .map(ChannelSpec::from)
            .collect();
        self.validate_channel_set(&remaining).await?;

        self.channels.delete(channel_id).await
    }

    /// Check the template-wide channel invariants, cross-checking device
    /// references against the catalog.
    ///
    /// Fails closed with `ValidationUnavailable` when the catalog cannot be
    /// reached: an unverifiable device reference is not accepted.
    pub(crate) async fn validate_channel_set(&self, specs: &[ChannelSpec]) -> ApiResult<()> {
        let mut violations = Vec::new();

        if specs.is_empty() {
            violations.push(ChannelViolation::new(
                "-",
                0,
                "template must contain at least one channel",
            ));
            return Err(ApiError::ValidationRejected(violations));
        }

        let mut seen = HashSet::new();
        for spec in specs {
            if !seen.insert((spec.device_id.clone(), spec.index)) {
                violations.push(ChannelViolation::new(
                    &spec.device_id,
                    spec.index,
                    "duplicate (device, index) pair",
                ));
            }
        }

        let devices = self.catalog.list_devices().await.map_err(|e| {
            tracing::warn!("Device catalog unreachable during validation: {e}");
            ApiError::ValidationUnavailable(e.to_string())
        })?;
        let known: HashSet<&str> = devices.iter().map(|d| d.id.as_str()).collect();

        for spec in specs {
            if !known.contains(spec.device_id.as_str()) {
                violations.push(ChannelViolation::new(
                    &spec.device_id,
                    spec.index,
                    "device not present in catalog",
                ));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ValidationRejected(violations))
        }
    }

    /// Swap a template's channel rows for a new set, replacements first,
    /// the destructive step last. On failure the original rows are put
    /// back before the error is returned.
    async fn replace_channel_rows(
        &self,
        template_id: &str,
        old: &[Channel],
        specs: &[ChannelSpec],
    ) -> ApiResult<Vec<Channel>> {
        let mut created = Vec::new();
        for spec in specs {
            match self.create_channel_row(template_id, spec).await {
                Ok(channel) => created.push(channel),
                Err(e) => {
                    self.discard_rows(&created).await;
                    return Err(e);
                }
            }
        }

        let mut removed: Vec<ChannelSpec> = Vec::new();
        for channel in old {
            if let Err(e) = self.channels.delete(&channel.id).await {
                self.restore_rows(template_id, &removed).await;
                self.discard_rows(&created).await;
                return Err(e);
            }
            removed.push(ChannelSpec::from(channel));
        }
        Ok(created)
    }

    /// Best-effort removal of channel rows left behind by a failed write
    /// sequence; the original error stays the caller's
    async fn discard_rows(&self, channels: &[Channel]) {
        for channel in channels {
            if let Err(e) = self.channels.delete(&channel.id).await {
                tracing::warn!("Could not discard channel {}: {e}", channel.id);
            }
        }
    }

    /// Best-effort re-creation of channel rows removed by a failed write
    /// sequence
    async fn restore_rows(&self, template_id: &str, specs: &[ChannelSpec]) {
        for spec in specs {
            if let Err(e) = self.create_channel_row(template_id, spec).await {
                tracing::warn!(
                    "Could not restore channel {}#{} on template {template_id}: {e}",
                    spec.device_id,
                    spec.index
                );
            }
        }
    }

    async fn create_channel_row(&self, template_id: &str, spec: &ChannelSpec) -> ApiResult<Channel> {
        self.channels
            .create(&json!({
                "templateId": template_id,
                "deviceId": spec.device_id,
                "index": spec.index,
                "settings": spec.settings,
            }))
            .await
    }
}
