//! Remote service client
//!
//! Generic CRUD-over-network capability used by all higher-level managers:
//! - [`ClientConfig`] for the base endpoint and per-request deadline
//! - [`ResourceTransport`] trait for the wire seam
//! - [`HttpTransport`] reqwest implementation
//! - [`ResourceClient`] typed wrapper per collection

pub mod config;
pub mod http;
pub mod resource;
pub mod transport;

pub use config::ClientConfig;
pub use http::HttpTransport;
pub use resource::ResourceClient;
pub use transport::{collections, ResourceTransport};
