use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::database::repository::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    FriedRice,
    Noodles,
    Momos,
    Starters,
    Rolls,
    Others,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::FriedRice,
        Category::Noodles,
        Category::Momos,
        Category::Starters,
        Category::Rolls,
        Category::Others,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::FriedRice => "fried-rice",
            Category::Noodles => "noodles",
            Category::Momos => "momos",
            Category::Starters => "starters",
            Category::Rolls => "rolls",
            Category::Others => "others",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == slug)
    }
}

/// Portion size for items priced per half/full plate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Half,
    Full,
}

impl Size {
    pub fn as_str(&self) -> &'static str {
        match self {
            Size::Half => "half",
            Size::Full => "full",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_half: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_full: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

/// The one pricing mode a menu item is allowed to have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pricing {
    Single(Decimal),
    Sized { half: Decimal, full: Decimal },
}

impl MenuItem {
    /// Validated pricing; `Err` names what is wrong with the price fields
    pub fn pricing(&self) -> Result<Pricing, String> {
        let non_negative = |p: Decimal| p >= Decimal::ZERO;
        match (self.price, self.price_half, self.price_full) {
            (Some(price), None, None) if non_negative(price) => Ok(Pricing::Single(price)),
            (None, Some(half), Some(full)) if non_negative(half) && non_negative(full) => {
                Ok(Pricing::Sized { half, full })
            }
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                Err("price cannot be combined with priceHalf/priceFull".to_string())
            }
            (None, Some(_), None) | (None, None, Some(_)) => {
                Err("priceHalf and priceFull must be set together".to_string())
            }
            (None, None, None) => Err("either price or priceHalf/priceFull is required".to_string()),
            _ => Err("prices cannot be negative".to_string()),
        }
    }

    /// Unit price for the requested size, `None` when the item isn't sold that way
    pub fn price_for(&self, size: Option<Size>) -> Option<Decimal> {
        match (self.pricing().ok()?, size) {
            (Pricing::Single(price), None) => Some(price),
            (Pricing::Sized { half, .. }, Some(Size::Half)) => Some(half),
            (Pricing::Sized { full, .. }, Some(Size::Full)) => Some(full),
            _ => None,
        }
    }
}

impl Document for MenuItem {
    const COLLECTION: &'static str = "menu";
    const ENTITY: &'static str = "menu item";

    fn id(&self) -> &str {
        &self.id
    }
}
