use crate::database::repository::Repository;
use crate::database::ContactRepository;
use crate::error::{AppError, AppResult};
use crate::logging::mask_email;
use crate::models::{next_time_id, non_blank, ContactMessage};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct NewContactMessage {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
}

pub struct ContactService {
    repo: Arc<ContactRepository>,
}

impl ContactService {
    pub fn new(repo: Arc<ContactRepository>) -> Self {
        Self { repo }
    }

    pub async fn submit(&self, payload: NewContactMessage) -> AppResult<ContactMessage> {
        let field = |value: &Option<String>, name: &str| {
            non_blank(value)
                .map(str::to_string)
                .ok_or_else(|| AppError::missing_field(name))
        };
        let email = field(&payload.email, "email")?;
        if !email.contains('@') {
            return Err(AppError::invalid_field("email", "not an email address"));
        }

        let message = ContactMessage {
            id: next_time_id(),
            name: field(&payload.name, "name")?,
            email,
            phone: non_blank(&payload.phone).unwrap_or_default().to_string(),
            message: field(&payload.message, "message")?,
            created_at: Utc::now(),
        };
        let stored = self.repo.insert(&message).await?;
        info!(message_id = %stored.id, from = %mask_email(&stored.email), "contact message stored");
        Ok(stored)
    }
}
