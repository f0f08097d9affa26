//! Menu catalogue: public reads and admin mutations

use crate::database::error::DatabaseError;
use crate::database::repository::Repository;
use crate::database::MenuRepository;
use crate::error::{AppError, AppResult};
use crate::models::{next_time_id, Category, MenuItem};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use tracing::info;

/// Admin payload for a new menu item
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMenuItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub price_half: Option<Decimal>,
    #[serde(default)]
    pub price_full: Option<Decimal>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Partial update. Price fields distinguish "absent" from an explicit `null`, which
/// clears the field so an item can switch pricing mode.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemPatch {
    pub name: Option<String>,
    pub category: Option<Category>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub price_half: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub price_full: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub image: Option<Option<String>>,
    pub available: Option<bool>,
}

fn explicit_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl MenuItemPatch {
    fn apply(self, item: &mut MenuItem) {
        if let Some(name) = self.name {
            item.name = name.trim().to_string();
        }
        if let Some(category) = self.category {
            item.category = category;
        }
        if let Some(price) = self.price {
            item.price = price;
        }
        if let Some(half) = self.price_half {
            item.price_half = half;
        }
        if let Some(full) = self.price_full {
            item.price_full = full;
        }
        if let Some(image) = self.image {
            item.image = image;
        }
        if let Some(available) = self.available {
            item.available = available;
        }
    }
}

fn validate_item(item: &MenuItem) -> AppResult<()> {
    if item.name.trim().is_empty() {
        return Err(AppError::missing_field("name"));
    }
    item.pricing()
        .map(|_| ())
        .map_err(|reason| AppError::invalid_field("price", reason))
}

pub struct MenuService {
    repo: Arc<MenuRepository>,
}

impl MenuService {
    pub fn new(repo: Arc<MenuRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> AppResult<Vec<MenuItem>> {
        Ok(self.repo.find_all().await?)
    }

    /// Case-insensitive substring match on the name; a blank query returns everything
    pub async fn search(&self, query: &str) -> AppResult<Vec<MenuItem>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.list().await;
        }
        Ok(self
            .repo
            .find_where(|item| item.name.to_lowercase().contains(&needle))
            .await)
    }

    /// Exact slug match; unknown slugs yield an empty list
    pub async fn by_category(&self, slug: &str) -> AppResult<Vec<MenuItem>> {
        match Category::from_slug(slug) {
            Some(category) => Ok(self.repo.find_where(|item| item.category == category).await),
            None => Ok(Vec::new()),
        }
    }

    pub async fn add_item(&self, payload: NewMenuItem) -> AppResult<MenuItem> {
        let id = payload
            .id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(next_time_id);

        let item = MenuItem {
            id,
            name: payload.name.trim().to_string(),
            category: payload.category,
            price: payload.price,
            price_half: payload.price_half,
            price_full: payload.price_full,
            image: payload.image.filter(|i| !i.trim().is_empty()),
            available: true,
        };
        validate_item(&item)?;

        let stored = self.repo.insert(&item).await?;
        info!(item_id = %stored.id, category = stored.category.as_str(), "menu item added");
        Ok(stored)
    }

    pub async fn update_item(&self, id: &str, patch: MenuItemPatch) -> AppResult<MenuItem> {
        let item = self
            .repo
            .mutate(|items| -> AppResult<MenuItem> {
                let item = items
                    .iter_mut()
                    .find(|item| item.id == id)
                    .ok_or_else(|| DatabaseError::not_found("menu item", id))?;
                let mut candidate = item.clone();
                patch.apply(&mut candidate);
                validate_item(&candidate)?;
                *item = candidate.clone();
                Ok(candidate)
            })
            .await?;
        info!(item_id = %item.id, "menu item updated");
        Ok(item)
    }

    pub async fn toggle_availability(&self, id: &str) -> AppResult<MenuItem> {
        let item = self
            .repo
            .update_with(id, |item| item.available = !item.available)
            .await?;
        info!(item_id = %item.id, available = item.available, "menu item availability toggled");
        Ok(item)
    }
}
