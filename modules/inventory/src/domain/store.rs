use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

use super::analytics;
use super::codec;
use super::error::DomainError;
use super::model::{AnalyticsSnapshot, Item, ItemUpdate, NewItem, normalize_code, round_price};
use super::repo::InventoryFile;

/// Default upper bound on the number of stored items.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Authoritative, code-ordered item collection mirrored to a backing file.
///
/// Every operation runs under one lock. Mutations persist the full collection
/// before the lock is released and undo themselves if the write fails.
pub struct InventoryStore {
    items: Mutex<Vec<Item>>,
    file: Arc<dyn InventoryFile>,
    capacity: usize,
}

fn position(items: &[Item], code: &str) -> Result<usize, usize> {
    items.binary_search_by(|item| item.code.as_str().cmp(code))
}

fn sort_by_code(items: &mut [Item]) {
    items.sort_by(|a, b| a.code.cmp(&b.code));
}

impl InventoryStore {
    /// Build the store from whatever `file` currently holds.
    ///
    /// Unreadable rows, duplicate codes and rows beyond `capacity` are dropped
    /// with a warning. A file that does not exist yet yields an empty store.
    ///
    /// # Errors
    /// Returns [`DomainError::Persistence`] if the file exists but cannot be read.
    pub fn load(file: Arc<dyn InventoryFile>, capacity: usize) -> Result<Self, DomainError> {
        let location = file.describe();
        let mut items = match file.read().map_err(DomainError::Persistence)? {
            Some(text) => {
                let outcome = codec::load(&text);
                for skipped in &outcome.skipped {
                    warn!(
                        file = %location,
                        line = skipped.line,
                        reason = %skipped.reason,
                        "Skipping unreadable inventory row"
                    );
                }
                if outcome.ignored_lines > 0 {
                    warn!(
                        file = %location,
                        count = outcome.ignored_lines,
                        "Ignoring rows past the declared record count"
                    );
                }
                outcome.items
            }
            None => {
                info!(file = %location, "No inventory file yet, starting empty");
                Vec::new()
            }
        };

        sort_by_code(&mut items);
        if items.len() > capacity {
            warn!(
                file = %location,
                capacity,
                dropped = items.len() - capacity,
                "Inventory file exceeds capacity, dropping trailing items"
            );
            items.truncate(capacity);
        }

        info!(file = %location, count = items.len(), capacity, "Inventory loaded");
        Ok(Self {
            items: Mutex::new(items),
            file,
            capacity,
        })
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    fn persist(&self, items: &[Item]) -> Result<(), DomainError> {
        self.file.write(&codec::serialize(items)).map_err(|e| {
            error!(file = %self.file.describe(), error = %e, "Failed to write inventory file");
            DomainError::Persistence(e)
        })
    }

    /// Snapshot of all items in code order.
    #[must_use]
    pub fn get_all(&self) -> Vec<Item> {
        self.items.lock().clone()
    }

    /// # Errors
    /// Returns [`DomainError::NotFound`] if no item has the normalized `code`.
    pub fn find_by_code(&self, code: &str) -> Result<Item, DomainError> {
        let code = normalize_code(code);
        let items = self.items.lock();
        match position(&items, &code) {
            Ok(idx) => Ok(items[idx].clone()),
            Err(_) => Err(DomainError::not_found(code)),
        }
    }

    /// Insert a new item at its sorted position.
    ///
    /// # Errors
    /// [`DomainError::AlreadyExists`] for a duplicate code,
    /// [`DomainError::Full`] at capacity, [`DomainError::Persistence`] if the
    /// file write fails.
    #[instrument(skip_all, fields(code = %new_item.code))]
    pub fn add(&self, new_item: NewItem) -> Result<Item, DomainError> {
        let item = new_item.into_item();
        let mut items = self.items.lock();

        let idx = match position(&items, &item.code) {
            Ok(_) => return Err(DomainError::already_exists(item.code)),
            Err(idx) => idx,
        };
        if items.len() >= self.capacity {
            return Err(DomainError::Full {
                capacity: self.capacity,
            });
        }

        items.insert(idx, item.clone());
        if let Err(e) = self.persist(&items) {
            items.remove(idx);
            return Err(e);
        }

        info!(code = %item.code, count = items.len(), "Item added");
        Ok(item)
    }

    /// Overwrite description, price and quantity of an existing item.
    ///
    /// # Errors
    /// [`DomainError::NotFound`] for an unknown code, [`DomainError::Persistence`]
    /// if the file write fails.
    #[instrument(skip_all, fields(code = %update.code))]
    pub fn update(&self, update: ItemUpdate) -> Result<Item, DomainError> {
        let code = normalize_code(&update.code);
        let mut items = self.items.lock();

        let idx = position(&items, &code).map_err(|_| DomainError::not_found(&code))?;
        let replacement = Item {
            code,
            description: update.description.trim().to_owned(),
            price: round_price(update.price),
            quantity: update.quantity,
        };
        let previous = std::mem::replace(&mut items[idx], replacement.clone());
        if let Err(e) = self.persist(&items) {
            items[idx] = previous;
            return Err(e);
        }

        info!(code = %replacement.code, "Item updated");
        Ok(replacement)
    }

    /// Remove an item, keeping the rest in order.
    ///
    /// # Errors
    /// [`DomainError::NotFound`] for an unknown code, [`DomainError::Persistence`]
    /// if the file write fails.
    #[instrument(skip(self))]
    pub fn delete(&self, code: &str) -> Result<Item, DomainError> {
        let code = normalize_code(code);
        let mut items = self.items.lock();

        let idx = position(&items, &code).map_err(|_| DomainError::not_found(&code))?;
        let removed = items.remove(idx);
        if let Err(e) = self.persist(&items) {
            items.insert(idx, removed);
            return Err(e);
        }

        info!(code = %removed.code, count = items.len(), "Item deleted");
        Ok(removed)
    }

    /// Replace the whole collection with the strictly parsed contents of `text`.
    ///
    /// Nothing changes unless parsing and persisting both succeed.
    ///
    /// # Errors
    /// [`DomainError::ImportRejected`] with the offending line,
    /// [`DomainError::Full`] if the file holds more items than the capacity,
    /// [`DomainError::Persistence`] if the file write fails.
    #[instrument(skip_all, fields(bytes = text.len()))]
    pub fn import_replace(&self, text: &str) -> Result<Vec<Item>, DomainError> {
        let mut parsed = codec::parse(text).map_err(|e| {
            debug!(line = e.line, reason = %e.reason, "Import rejected");
            DomainError::ImportRejected(e)
        })?;
        if parsed.len() > self.capacity {
            return Err(DomainError::Full {
                capacity: self.capacity,
            });
        }
        sort_by_code(&mut parsed);

        let mut items = self.items.lock();
        self.persist(&parsed)?;
        let replaced = std::mem::replace(&mut *items, parsed);

        info!(
            previous = replaced.len(),
            count = items.len(),
            "Inventory replaced by import"
        );
        Ok(items.clone())
    }

    /// Current collection in the persisted text format.
    #[must_use]
    pub fn export_text(&self) -> String {
        codec::serialize(&self.items.lock())
    }

    #[must_use]
    pub fn statistics(&self) -> AnalyticsSnapshot {
        analytics::compute(&self.items.lock())
    }
}
