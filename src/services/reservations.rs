use crate::database::repository::Repository;
use crate::database::ReservationRepository;
use crate::error::{AppError, AppResult};
use crate::logging::mask_email;
use crate::models::{next_time_id, non_blank, Reservation, ReservationStatus};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReservation {
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub guests: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
}

fn required(value: &Option<String>, field: &str) -> AppResult<String> {
    non_blank(value)
        .map(str::to_string)
        .ok_or_else(|| AppError::missing_field(field))
}

pub struct ReservationService {
    repo: Arc<ReservationRepository>,
}

impl ReservationService {
    pub fn new(repo: Arc<ReservationRepository>) -> Self {
        Self { repo }
    }

    pub async fn create(&self, payload: NewReservation) -> AppResult<Reservation> {
        let guests = payload.guests.ok_or_else(|| AppError::missing_field("guests"))?;
        let guests = u32::try_from(guests)
            .ok()
            .filter(|g| *g >= 1)
            .ok_or_else(|| AppError::invalid_field("guests", "party size must be at least 1"))?;

        let reservation = Reservation {
            id: next_time_id(),
            customer_name: required(&payload.customer_name, "customerName")?,
            customer_email: required(&payload.customer_email, "customerEmail")?,
            customer_phone: required(&payload.customer_phone, "customerPhone")?,
            date: required(&payload.date, "date")?,
            time: required(&payload.time, "time")?,
            guests,
            special_requests: non_blank(&payload.special_requests).map(str::to_string),
            status: ReservationStatus::Pending,
            created_at: Utc::now(),
        };

        let stored = self.repo.insert(&reservation).await?;
        info!(
            reservation_id = %stored.id,
            customer = %mask_email(&stored.customer_email),
            guests = stored.guests,
            date = %stored.date,
            "reservation created"
        );
        Ok(stored)
    }

    pub async fn list(&self) -> AppResult<Vec<Reservation>> {
        Ok(self.repo.find_all().await?)
    }

    pub async fn update_status(
        &self,
        id: &str,
        status: ReservationStatus,
    ) -> AppResult<Reservation> {
        let reservation = self
            .repo
            .update_with(id, |reservation| reservation.status = status)
            .await?;
        info!(reservation_id = %reservation.id, status = ?status, "reservation status updated");
        Ok(reservation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::JsonRepository;
    use crate::database::store::{DocumentStore, MemoryStore};

    async fn service() -> (ReservationService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let repo = JsonRepository::load(store.clone()).await.unwrap();
        (ReservationService::new(Arc::new(repo)), store)
    }

    fn payload() -> NewReservation {
        NewReservation {
            customer_name: Some("Ravi".to_string()),
            customer_email: Some("ravi@example.com".to_string()),
            customer_phone: Some("9000000000".to_string()),
            date: Some("2024-03-01".to_string()),
            time: Some("19:30".to_string()),
            guests: Some(4),
            special_requests: Some("  ".to_string()),
        }
    }

    #[tokio::test]
    async fn create_starts_pending() {
        let (service, _) = service().await;
        let reservation = service.create(payload()).await.unwrap();
        assert_eq!(reservation.status, ReservationStatus::Pending);
        assert_eq!(reservation.special_requests, None);
        assert_eq!(service.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn party_size_must_be_positive() {
        let (service, _) = service().await;
        let mut empty_party = payload();
        empty_party.guests = Some(0);
        assert_eq!(service.create(empty_party).await.unwrap_err().status_code(), 400);

        let mut no_date = payload();
        no_date.date = None;
        assert_eq!(service.create(no_date).await.unwrap_err().status_code(), 400);
    }

    #[tokio::test]
    async fn status_update_and_not_found() {
        let (service, store) = service().await;
        let reservation = service.create(payload()).await.unwrap();
        let confirmed = service
            .update_status(&reservation.id, ReservationStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(confirmed.status, ReservationStatus::Confirmed);

        let before = store.load("reservations").await.unwrap();
        let err = service
            .update_status("missing", ReservationStatus::Cancelled)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(store.load("reservations").await.unwrap(), before);
    }
}
