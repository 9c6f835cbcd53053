//! Template configuration
//!
//! Templates are named, reusable channel configurations used to start
//! recordings. This module owns their lifecycle and invariants.

pub mod manager;
pub mod types;

pub use manager::TemplateManager;
pub use types::{Channel, ChannelSettings, ChannelSpec, Template, TemplateDraft, TemplatePatch};
