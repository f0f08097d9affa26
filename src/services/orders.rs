//! Order Service
//!
//! Owns the order collection. Orders are created by the storefront (cash, manual UPI
//! or after a successful gateway return), their fulfilment status is moved only by
//! admins, and a verified gateway callback may settle the payment of a stored order.

use crate::database::error::DatabaseError;
use crate::database::repository::Repository;
use crate::database::OrderRepository;
use crate::error::{AppError, AppResult};
use crate::logging::mask_email;
use crate::models::{
    next_time_id, non_blank, Order, OrderItem, OrderStatus, OrderType, PaymentMethod,
    PaymentStatus, Size,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub menu_item_id: String,
    pub name: String,
    /// Signed so that zero and negative quantities reach validation instead of serde
    pub quantity: i64,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

/// Order as submitted by the storefront. Any `status` the caller sends is ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    #[serde(default)]
    pub items: Vec<NewOrderItem>,
    pub total: Decimal,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
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
}

impl NewOrder {
    fn into_order(self) -> AppResult<Order> {
        if self.items.is_empty() {
            return Err(AppError::invalid_field("items", "order must contain at least one item"));
        }
        let mut items = Vec::with_capacity(self.items.len());
        for (index, item) in self.items.into_iter().enumerate() {
            let quantity = u32::try_from(item.quantity)
                .ok()
                .filter(|q| *q >= 1)
                .ok_or_else(|| {
                    AppError::invalid_field(
                        format!("items[{}].quantity", index),
                        "quantity must be at least 1",
                    )
                })?;
            if item.price < Decimal::ZERO {
                return Err(AppError::invalid_field(
                    format!("items[{}].price", index),
                    "price cannot be negative",
                ));
            }
            items.push(OrderItem {
                menu_item_id: item.menu_item_id,
                name: item.name,
                quantity,
                price: item.price,
                size: item.size,
            });
        }

        let customer_name = required(&self.customer_name, "customerName")?;
        let customer_email = required(&self.customer_email, "customerEmail")?;
        let customer_phone = required(&self.customer_phone, "customerPhone")?;
        let delivery_address = non_blank(&self.delivery_address).map(str::to_string);
        if self.order_type == OrderType::Delivery && delivery_address.is_none() {
            return Err(AppError::missing_field("deliveryAddress"));
        }

        Ok(Order {
            id: next_time_id(),
            items,
            total: self.total,
            customer_name,
            customer_email,
            customer_phone,
            delivery_address,
            order_type: self.order_type,
            payment_method: self.payment_method,
            payment_status: self.payment_status,
            transaction_id: non_blank(&self.transaction_id).map(str::to_string),
            paytm_transaction_id: non_blank(&self.paytm_transaction_id).map(str::to_string),
            paytm_order_id: non_blank(&self.paytm_order_id).map(str::to_string),
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        })
    }
}

fn required(value: &Option<String>, field: &str) -> AppResult<String> {
    non_blank(value)
        .map(str::to_string)
        .ok_or_else(|| AppError::missing_field(field))
}

/// Gateway verdict applied to a stored order
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    pub success: bool,
    pub transaction_id: Option<String>,
}

pub struct OrderService {
    repo: Arc<OrderRepository>,
}

impl OrderService {
    pub fn new(repo: Arc<OrderRepository>) -> Self {
        Self { repo }
    }

    pub async fn create_order(&self, payload: NewOrder) -> AppResult<Order> {
        let order = payload.into_order()?;
        if let Some(gateway_id) = order.paytm_order_id.clone() {
            return self.create_gateway_order(order, &gateway_id).await;
        }
        let stored = self.repo.insert(&order).await?;
        info!(
            order_id = %stored.id,
            customer = %mask_email(&stored.customer_email),
            payment_method = stored.payment_method.as_str(),
            total = %stored.total,
            "order created"
        );
        Ok(stored)
    }

    /// A gateway order is created at most once per gateway order id; a replayed
    /// submission gets the order that already exists.
    async fn create_gateway_order(&self, order: Order, gateway_id: &str) -> AppResult<Order> {
        let (stored, created) = self
            .repo
            .mutate(|orders| -> Result<(Order, bool), DatabaseError> {
                let existing = orders
                    .iter()
                    .find(|o| o.paytm_order_id.as_deref() == Some(gateway_id));
                if let Some(existing) = existing {
                    return Ok((existing.clone(), false));
                }
                orders.push(order.clone());
                Ok((order, true))
            })
            .await?;
        if created {
            info!(
                order_id = %stored.id,
                paytm_order_id = %gateway_id,
                customer = %mask_email(&stored.customer_email),
                total = %stored.total,
                "gateway order created"
            );
        } else {
            warn!(order_id = %stored.id, paytm_order_id = %gateway_id, "gateway order already submitted");
        }
        Ok(stored)
    }

    /// Every order, in storage order
    pub async fn list_orders(&self) -> AppResult<Vec<Order>> {
        Ok(self.repo.find_all().await?)
    }

    /// Orders placed with `email`, newest first
    pub async fn list_for_customer(&self, email: &str) -> AppResult<Vec<Order>> {
        let email = email.trim().to_lowercase();
        let mut orders = self
            .repo
            .find_where(|order| order.customer_email.trim().to_lowercase() == email)
            .await;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Unconditional overwrite of the fulfilment status
    pub async fn update_status(&self, id: &str, status: OrderStatus) -> AppResult<Order> {
        let order = self.repo.update_with(id, |order| order.status = status).await?;
        info!(order_id = %order.id, status = status.as_str(), "order status updated");
        Ok(order)
    }

    /// Settle the payment of the order carrying `paytm_order_id`, if one is stored.
    ///
    /// A completed payment is never downgraded, so replaying a callback is harmless.
    pub async fn record_payment(
        &self,
        paytm_order_id: &str,
        outcome: &PaymentOutcome,
    ) -> AppResult<Option<Order>> {
        let matches = self
            .repo
            .find_where(|order| order.paytm_order_id.as_deref() == Some(paytm_order_id))
            .await;
        let Some(order) = matches.into_iter().next() else {
            debug!(paytm_order_id = %paytm_order_id, "no stored order for gateway callback");
            return Ok(None);
        };
        if order.payment_status == PaymentStatus::Completed {
            return Ok(Some(order));
        }

        let transaction_id = outcome.transaction_id.clone();
        let success = outcome.success;
        let updated = self
            .repo
            .update_with(&order.id, move |order| {
                if order.payment_status == PaymentStatus::Completed {
                    return;
                }
                if success {
                    order.payment_status = PaymentStatus::Completed;
                    if transaction_id.is_some() {
                        order.paytm_transaction_id = transaction_id;
                    }
                } else {
                    order.payment_status = PaymentStatus::Failed;
                }
            })
            .await?;
        info!(
            order_id = %updated.id,
            paytm_order_id = %paytm_order_id,
            success = success,
            "order payment reconciled from gateway callback"
        );
        Ok(Some(updated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::JsonRepository;
    use crate::database::store::{DocumentStore, MemoryStore};

    async fn service() -> (OrderService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let repo = JsonRepository::load(store.clone()).await.unwrap();
        (OrderService::new(Arc::new(repo)), store)
    }

    fn payload() -> NewOrder {
        NewOrder {
            items: vec![NewOrderItem {
                menu_item_id: "2".to_string(),
                name: "Chicken Momos".to_string(),
                quantity: 2,
                price: Decimal::from(250),
                size: None,
            }],
            total: Decimal::from(500),
            customer_name: Some("Asha".to_string()),
            customer_email: Some("asha@example.com".to_string()),
            customer_phone: Some("9876543210".to_string()),
            delivery_address: None,
            order_type: OrderType::Pickup,
            payment_method: PaymentMethod::Cod,
            payment_status: PaymentStatus::Pending,
            transaction_id: None,
            paytm_transaction_id: None,
            paytm_order_id: None,
        }
    }

    #[tokio::test]
    async fn create_forces_pending_status() {
        let (service, _) = service().await;
        let raw = serde_json::json!({
            "items": [{"menuItemId": "2", "name": "Chicken Momos", "quantity": 2, "price": 250}],
            "total": 500,
            "customerName": "Asha",
            "customerEmail": "asha@example.com",
            "customerPhone": "9876543210",
            "orderType": "pickup",
            "paymentMethod": "cod",
            "status": "delivered"
        });
        let payload: NewOrder = serde_json::from_value(raw).unwrap();
        let order = service.create_order(payload).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.total, Decimal::from(500));
        assert_eq!(service.list_orders().await.unwrap(), vec![order]);
    }

    #[tokio::test]
    async fn gateway_order_is_created_once() {
        let (service, _) = service().await;
        let mut paid = payload();
        paid.payment_method = PaymentMethod::Paytm;
        paid.payment_status = PaymentStatus::Completed;
        paid.paytm_order_id = Some("ORDER_1".to_string());

        let first = service.create_order(paid.clone()).await.unwrap();
        let replay = service.create_order(paid).await.unwrap();
        assert_eq!(first.id, replay.id);
        assert_eq!(service.list_orders().await.unwrap().len(), 1);

        // Cash orders carry no gateway id and are never merged
        service.create_order(payload()).await.unwrap();
        service.create_order(payload()).await.unwrap();
        assert_eq!(service.list_orders().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn create_validates_payload() {
        let (service, store) = service().await;

        let mut empty = payload();
        empty.items.clear();
        assert_eq!(service.create_order(empty).await.unwrap_err().status_code(), 400);

        let mut zero = payload();
        zero.items[0].quantity = 0;
        assert_eq!(service.create_order(zero).await.unwrap_err().status_code(), 400);

        let mut nameless = payload();
        nameless.customer_name = Some("  ".to_string());
        assert_eq!(service.create_order(nameless).await.unwrap_err().status_code(), 400);

        let mut delivery = payload();
        delivery.order_type = OrderType::Delivery;
        assert_eq!(service.create_order(delivery).await.unwrap_err().status_code(), 400);

        assert_eq!(store.load("orders").await.unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_id_update_leaves_collection_unchanged() {
        let (service, store) = service().await;
        service.create_order(payload()).await.unwrap();
        let before = store.load("orders").await.unwrap();

        let err = service
            .update_status("does-not-exist", OrderStatus::Delivered)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(store.load("orders").await.unwrap(), before);
    }

    #[tokio::test]
    async fn status_overwrite_is_free_form() {
        let (service, _) = service().await;
        let order = service.create_order(payload()).await.unwrap();
        let delivered = service
            .update_status(&order.id, OrderStatus::Delivered)
            .await
            .unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);
        let back = service.update_status(&order.id, OrderStatus::Pending).await.unwrap();
        assert_eq!(back.status, OrderStatus::Pending);
    }

    #[tokio::test]
    async fn customer_orders_are_newest_first() {
        let (service, _) = service().await;
        let first = service.create_order(payload()).await.unwrap();
        let mut other = payload();
        other.customer_email = Some("someone@else.com".to_string());
        service.create_order(other).await.unwrap();
        let second = service.create_order(payload()).await.unwrap();

        let mine = service.list_for_customer("ASHA@example.com").await.unwrap();
        let ids: Vec<_> = mine.iter().map(|o| o.id.clone()).collect();
        assert_eq!(ids.len(), 2);
        assert!(mine[0].created_at >= mine[1].created_at);
        assert!(ids.contains(&first.id) && ids.contains(&second.id));
    }

    #[tokio::test]
    async fn record_payment_settles_matching_order_once() {
        let (service, store) = service().await;
        let mut staged = payload();
        staged.payment_method = PaymentMethod::Paytm;
        staged.paytm_order_id = Some("ORDER_1".to_string());
        service.create_order(staged).await.unwrap();

        let outcome = PaymentOutcome {
            success: true,
            transaction_id: Some("TXN1".to_string()),
        };
        let settled = service.record_payment("ORDER_1", &outcome).await.unwrap().unwrap();
        assert_eq!(settled.payment_status, PaymentStatus::Completed);
        assert_eq!(settled.paytm_transaction_id.as_deref(), Some("TXN1"));

        let before = store.load("orders").await.unwrap();
        let failed = PaymentOutcome {
            success: false,
            transaction_id: None,
        };
        let again = service.record_payment("ORDER_1", &failed).await.unwrap().unwrap();
        assert_eq!(again.payment_status, PaymentStatus::Completed);
        assert_eq!(store.load("orders").await.unwrap(), before);
    }

    #[tokio::test]
    async fn record_payment_ignores_unknown_orders() {
        let (service, store) = service().await;
        let outcome = PaymentOutcome {
            success: true,
            transaction_id: None,
        };
        assert!(service.record_payment("ORDER_9", &outcome).await.unwrap().is_none());
        assert_eq!(store.load("orders").await.unwrap(), None);
    }
}
