//! Domain error types for the inventory module.

use thiserror::Error;

use super::codec::ParseError;

/// Errors produced by [`super::store::InventoryStore`].
#[derive(Error, Debug)]
pub enum DomainError {
    /// No item with the given normalized code.
    #[error("Item not found: {code}")]
    NotFound { code: String },

    /// An item with the same normalized code is already stored.
    #[error("Item already exists: {code}")]
    AlreadyExists { code: String },

    /// The collection holds `capacity` items already.
    #[error("Inventory is full (capacity {capacity})")]
    Full { capacity: usize },

    /// Strict import rejected the uploaded text.
    #[error("Import rejected at {0}")]
    ImportRejected(#[from] ParseError),

    /// The backing file could not be read or written. A failed write leaves
    /// the in-memory collection as it was before the operation.
    #[error("Inventory file I/O failed: {0}")]
    Persistence(#[source] std::io::Error),
}

impl DomainError {
    pub fn not_found(code: impl Into<String>) -> Self {
        Self::NotFound { code: code.into() }
    }

    pub fn already_exists(code: impl Into<String>) -> Self {
        Self::AlreadyExists { code: code.into() }
    }
}
