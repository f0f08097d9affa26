use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::menu::Size;
use crate::database::repository::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Delivery,
    Pickup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Stub gateway
    Online,
    Cod,
    Paytm,
    /// Manual UPI transfer confirmed by a customer-entered reference
    Upi,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Online => "online",
            PaymentMethod::Cod => "cod",
            PaymentMethod::Paytm => "paytm",
            PaymentMethod::Upi => "upi",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// Fulfilment status, independent of [`PaymentStatus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

/// Line item snapshot, decoupled from the live menu
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub menu_item_id: String,
    pub name: String,
    pub quantity: u32,
    /// Unit price
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

impl OrderItem {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub items: Vec<OrderItem>,
    /// Computed by the client, stored as sent
    pub total: Decimal,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    pub order_type: OrderType,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paytm_transaction_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paytm_order_id: Option<String>,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl Document for Order {
    const COLLECTION: &'static str = "orders";
    const ENTITY: &'static str = "order";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_wire_format_is_camel_case() {
        let order = Order {
            id: "1700000000000".to_string(),
            items: vec![OrderItem {
                menu_item_id: "3".to_string(),
                name: "Chicken Momos".to_string(),
                quantity: 2,
                price: Decimal::from(250),
                size: Some(Size::Full),
            }],
            total: Decimal::from(500),
            customer_name: "Asha".to_string(),
            customer_email: "asha@example.com".to_string(),
            customer_phone: "9876543210".to_string(),
            delivery_address: None,
            order_type: OrderType::Pickup,
            payment_method: PaymentMethod::Cod,
            payment_status: PaymentStatus::Pending,
            transaction_id: None,
            paytm_transaction_id: None,
            paytm_order_id: None,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["customerPhone"], "9876543210");
        assert_eq!(value["items"][0]["menuItemId"], "3");
        assert_eq!(value["items"][0]["size"], "full");
        assert_eq!(value["paymentMethod"], "cod");
        assert!(value.get("deliveryAddress").is_none());
        assert_eq!(order.items[0].line_total(), Decimal::from(500));
    }
}
