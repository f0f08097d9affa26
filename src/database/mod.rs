//! File-backed persistence
//!
//! Each collection is a pretty-printed JSON array in `{data_dir}/{collection}.json`.

pub mod error;
pub mod repository;
pub mod store;

use std::sync::Arc;
use tracing::{info, warn};

use self::error::DatabaseError;
use self::repository::JsonRepository;
use self::store::DocumentStore;
use crate::models::{ContactMessage, Customer, MenuItem, Order, Reservation};

pub type MenuRepository = JsonRepository<MenuItem>;
pub type OrderRepository = JsonRepository<Order>;
pub type ReservationRepository = JsonRepository<Reservation>;
pub type ContactRepository = JsonRepository<ContactMessage>;
pub type CustomerRepository = JsonRepository<Customer>;

/// Every collection the backend owns, loaded once at startup
#[derive(Clone)]
pub struct Repositories {
    pub store: Arc<dyn DocumentStore>,
    pub menu: Arc<MenuRepository>,
    pub orders: Arc<OrderRepository>,
    pub reservations: Arc<ReservationRepository>,
    pub contacts: Arc<ContactRepository>,
    pub customers: Arc<CustomerRepository>,
}

impl Repositories {
    pub async fn load(store: Arc<dyn DocumentStore>) -> Result<Self, DatabaseError> {
        let repos = Self {
            menu: Arc::new(JsonRepository::load(store.clone()).await?),
            orders: Arc::new(JsonRepository::load(store.clone()).await?),
            reservations: Arc::new(JsonRepository::load(store.clone()).await?),
            contacts: Arc::new(JsonRepository::load(store.clone()).await?),
            customers: Arc::new(JsonRepository::load(store.clone()).await?),
            store,
        };

        if repos.menu.is_empty().await {
            warn!("Menu collection is empty; add items through the admin API");
        }
        info!("All collections loaded");
        Ok(repos)
    }
}
