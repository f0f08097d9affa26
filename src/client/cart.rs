//! Cart Store
//!
//! The selected menu items, keyed by `"{menuItemId}-{half|full|single}"`. Every
//! mutation is written to client storage under [`CART_KEY`] before it becomes visible,
//! so a cart loaded from the same storage is always identical to the last one written.

use crate::client::storage::{ClientStorage, StorageError};
use crate::models::{Category, MenuItem, Size};
use crate::services::NewOrderItem;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

pub const CART_KEY: &str = "cart";

#[derive(Debug, Error)]
pub enum CartError {
    #[error("{name} is not sold as {size}")]
    InvalidSize { name: String, size: String },

    #[error("{name} is currently unavailable")]
    Unavailable { name: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to encode cart: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub menu_item_id: String,
    pub name: String,
    pub category: Category,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_size: Option<Size>,
    /// Unit price at the moment the item was first added
    pub selected_price: Decimal,
}

/// Composite identity of a cart line
pub fn entry_key(menu_item_id: &str, size: Option<Size>) -> String {
    format!(
        "{}-{}",
        menu_item_id,
        size.map(|s| s.as_str()).unwrap_or("single")
    )
}

impl CartEntry {
    pub fn key(&self) -> String {
        entry_key(&self.menu_item_id, self.selected_size)
    }

    pub fn line_total(&self) -> Decimal {
        self.selected_price * Decimal::from(self.quantity)
    }

    pub fn to_order_item(&self) -> NewOrderItem {
        NewOrderItem {
            menu_item_id: self.menu_item_id.clone(),
            name: self.name.clone(),
            quantity: i64::from(self.quantity),
            price: self.selected_price,
            size: self.selected_size,
        }
    }
}

pub struct Cart {
    storage: Arc<dyn ClientStorage>,
    entries: Vec<CartEntry>,
}

impl Cart {
    /// Rebuild the cart from storage. An unreadable stored cart is discarded.
    pub fn load(storage: Arc<dyn ClientStorage>) -> Result<Self, CartError> {
        let entries = match storage.get(CART_KEY)? {
            Some(raw) => match serde_json::from_str::<Vec<CartEntry>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(error = %e, "discarding unreadable stored cart");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        Ok(Self { storage, entries })
    }

    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&CartEntry> {
        self.entries.iter().find(|e| e.key() == key)
    }

    /// Sum of unit price times quantity over every line
    pub fn total(&self) -> Decimal {
        self.entries.iter().map(CartEntry::line_total).sum()
    }

    pub fn order_items(&self) -> Vec<NewOrderItem> {
        self.entries.iter().map(CartEntry::to_order_item).collect()
    }

    /// Add one unit. An existing line keeps its snapshotted price.
    pub fn add(&mut self, item: &MenuItem, size: Option<Size>) -> Result<&CartEntry, CartError> {
        let key = entry_key(&item.id, size);
        let mut next = self.entries.clone();
        let index = match next.iter().position(|e| e.key() == key) {
            Some(index) => {
                next[index].quantity += 1;
                index
            }
            None => {
                if !item.available {
                    return Err(CartError::Unavailable {
                        name: item.name.clone(),
                    });
                }
                let price = item.price_for(size).ok_or_else(|| CartError::InvalidSize {
                    name: item.name.clone(),
                    size: size.map(|s| s.as_str()).unwrap_or("single").to_string(),
                })?;
                next.push(CartEntry {
                    menu_item_id: item.id.clone(),
                    name: item.name.clone(),
                    category: item.category,
                    quantity: 1,
                    selected_size: size,
                    selected_price: price,
                });
                next.len() - 1
            }
        };
        self.commit(next)?;
        debug!(key = %key, quantity = self.entries[index].quantity, "cart line added");
        Ok(&self.entries[index])
    }

    /// Drop a line; unknown keys are ignored
    pub fn remove(&mut self, key: &str) -> Result<(), CartError> {
        let next: Vec<CartEntry> = self
            .entries
            .iter()
            .filter(|e| e.key() != key)
            .cloned()
            .collect();
        if next.len() == self.entries.len() {
            return Ok(());
        }
        self.commit(next)
    }

    /// Replace a line's quantity; zero or less removes it
    pub fn set_quantity(&mut self, key: &str, quantity: i64) -> Result<(), CartError> {
        if quantity <= 0 {
            return self.remove(key);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        let mut next = self.entries.clone();
        match next.iter_mut().find(|e| e.key() == key) {
            Some(entry) => entry.quantity = quantity,
            None => return Ok(()),
        }
        self.commit(next)
    }

    /// Empty the cart and forget the stored copy
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.storage.remove(CART_KEY)?;
        self.entries.clear();
        Ok(())
    }

    fn commit(&mut self, next: Vec<CartEntry>) -> Result<(), CartError> {
        let encoded = serde_json::to_string(&next)?;
        self.storage.set(CART_KEY, &encoded)?;
        self.entries = next;
        Ok(())
    }
}
