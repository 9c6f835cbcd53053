//! Recording sessions
//!
//! The per-recording state machine and the manager that drives it:
//! - [`RecordingStatus`] transitions in `state`
//! - [`SessionManager`] start/stop/delete orchestration in `manager`

pub mod manager;
pub mod state;

pub use manager::{DeviceOverrides, SessionEvent, SessionManager};
pub use state::{Recording, RecordingStatus};
