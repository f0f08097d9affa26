use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::repository::Document;

/// Message left through the contact form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Document for ContactMessage {
    const COLLECTION: &'static str = "contacts";
    const ENTITY: &'static str = "contact message";

    fn id(&self) -> &str {
        &self.id
    }
}
