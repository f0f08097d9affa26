//! Generic repository over a [`DocumentStore`] collection
//!
//! The collection is held in memory behind a `RwLock`. Mutations take the write lock,
//! apply the change to a copy, persist the copy and only then swap it in, so writers in
//! one process are serialised and a failed write leaves the previous state in place.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info};

use super::error::{DatabaseError, DatabaseErrorKind};
use super::store::DocumentStore;

/// A record stored in one named collection
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection (file) name
    const COLLECTION: &'static str;
    /// Human-readable entity name used in errors
    const ENTITY: &'static str;

    fn id(&self) -> &str;
}

/// Basic CRUD surface shared by every collection
#[async_trait]
pub trait Repository {
    type Entity;

    async fn find_by_id(&self, id: &str) -> Result<Option<Self::Entity>, DatabaseError>;

    async fn find_all(&self) -> Result<Vec<Self::Entity>, DatabaseError>;

    async fn insert(&self, entity: &Self::Entity) -> Result<Self::Entity, DatabaseError>;
}

pub struct JsonRepository<T: Document> {
    store: Arc<dyn DocumentStore>,
    items: RwLock<Vec<T>>,
}

impl<T: Document> JsonRepository<T> {
    /// Read the collection from the store; a missing collection starts empty
    pub async fn load(store: Arc<dyn DocumentStore>) -> Result<Self, DatabaseError> {
        let items = match store.load(T::COLLECTION).await? {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str::<Vec<T>>(&raw)
                .map_err(|e| {
                    error!(collection = T::COLLECTION, error = %e, "Collection is malformed");
                    DatabaseError::serialization(T::COLLECTION, e)
                })?,
            _ => Vec::new(),
        };

        info!(
            collection = T::COLLECTION,
            count = items.len(),
            "Collection loaded"
        );

        Ok(Self {
            store,
            items: RwLock::new(items),
        })
    }

    pub async fn len(&self) -> usize {
        self.items.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.items.read().await.is_empty()
    }

    pub async fn find_where<P>(&self, predicate: P) -> Vec<T>
    where
        P: Fn(&T) -> bool + Send,
    {
        self.items
            .read()
            .await
            .iter()
            .filter(|item| predicate(item))
            .cloned()
            .collect()
    }

    pub async fn count_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&T) -> bool + Send,
    {
        self.items.read().await.iter().filter(|item| predicate(item)).count()
    }

    /// Apply `change` to a copy of the collection and persist it.
    ///
    /// If `change` returns an error or the write fails, the stored collection and the
    /// in-memory copy are both left untouched.
    pub async fn mutate<R, E, F>(&self, change: F) -> Result<R, E>
    where
        F: FnOnce(&mut Vec<T>) -> Result<R, E> + Send,
        E: From<DatabaseError>,
    {
        let mut guard = self.items.write().await;
        let mut next = guard.clone();
        let result = change(&mut next)?;

        let contents = serde_json::to_string_pretty(&next)
            .map_err(|e| DatabaseError::serialization(T::COLLECTION, e))?;
        if let Err(e) = self.store.save(T::COLLECTION, &contents).await {
            error!(collection = T::COLLECTION, error = %e, "Failed to persist collection");
            return Err(e.into());
        }

        *guard = next;
        Ok(result)
    }

    /// Modify one document in place, `NotFound` if the id is unknown
    pub async fn update_with<F>(&self, id: &str, change: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&mut T) + Send,
    {
        self.mutate(|items| -> Result<T, DatabaseError> {
            let item = items
                .iter_mut()
                .find(|item| item.id() == id)
                .ok_or_else(|| DatabaseError::not_found(T::ENTITY, id))?;
            change(item);
            Ok(item.clone())
        })
        .await
    }
}

#[async_trait]
impl<T: Document> Repository for JsonRepository<T> {
    type Entity = T;

    async fn find_by_id(&self, id: &str) -> Result<Option<T>, DatabaseError> {
        Ok(self
            .items
            .read()
            .await
            .iter()
            .find(|item| item.id() == id)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<T>, DatabaseError> {
        Ok(self.items.read().await.clone())
    }

    async fn insert(&self, entity: &T) -> Result<T, DatabaseError> {
        let entity = entity.clone();
        self.mutate(move |items| -> Result<T, DatabaseError> {
            if items.iter().any(|item| item.id() == entity.id()) {
                return Err(DatabaseError::new(DatabaseErrorKind::Duplicate {
                    entity: T::ENTITY.to_string(),
                    id: entity.id().to_string(),
                }));
            }
            items.push(entity.clone());
            Ok(entity)
        })
        .await
    }
}
