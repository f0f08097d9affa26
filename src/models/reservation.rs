use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::repository::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    #[default]
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    /// As entered, e.g. `2024-03-01`
    pub date: String,
    /// As entered, e.g. `19:30`
    pub time: String,
    pub guests: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    #[serde(default)]
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

impl Document for Reservation {
    const COLLECTION: &'static str = "reservations";
    const ENTITY: &'static str = "reservation";

    fn id(&self) -> &str {
        &self.id
    }
}
