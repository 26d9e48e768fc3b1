//! Inventory module.
//!
//! A capacity-bounded, code-ordered item store mirrored to a flat text file,
//! with strict CSV import, export, price statistics and a REST API.
//!
//! ## Layout
//!
//! - `domain`: items, text codec, the store, statistics and the insight port
//! - `infra`: backing-file implementations and the chat-completion HTTP client
//! - `api::rest`: DTOs, handlers, routes and problem mapping

pub mod api;
pub mod config;
pub mod domain;
pub mod infra;
pub mod module;

pub use config::{InsightConfig, InventoryConfig};
pub use domain::error::DomainError;
pub use domain::model::{AnalyticsSnapshot, Item, ItemUpdate, NewItem};
pub use domain::store::InventoryStore;
pub use module::InventoryModule;
