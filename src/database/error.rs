//! Storage error types

use std::fmt;

use crate::error::{AppError, AppErrorKind, DomainError};

#[derive(Debug, Clone)]
pub enum DatabaseErrorKind {
    /// Entity with the given id is not in the collection
    NotFound { entity: String, id: String },
    /// Entity with the same key already exists
    Duplicate { entity: String, id: String },
    /// Reading or writing the backing file failed
    Io { collection: String, message: String },
    /// Collection contents could not be (de)serialized
    Serialization { collection: String, message: String },
    Unknown { message: String },
}

#[derive(Debug, Clone)]
pub struct DatabaseError {
    pub kind: DatabaseErrorKind,
}

impl DatabaseError {
    pub fn new(kind: DatabaseErrorKind) -> Self {
        Self { kind }
    }

    pub fn not_found(entity: &str, id: impl Into<String>) -> Self {
        Self::new(DatabaseErrorKind::NotFound {
            entity: entity.to_string(),
            id: id.into(),
        })
    }

    pub fn io(collection: &str, err: std::io::Error) -> Self {
        Self::new(DatabaseErrorKind::Io {
            collection: collection.to_string(),
            message: err.to_string(),
        })
    }

    pub fn serialization(collection: &str, err: serde_json::Error) -> Self {
        Self::new(DatabaseErrorKind::Serialization {
            collection: collection.to_string(),
            message: err.to_string(),
        })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, DatabaseErrorKind::NotFound { .. })
    }
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DatabaseErrorKind::NotFound { entity, id } => write!(f, "{} '{}' not found", entity, id),
            DatabaseErrorKind::Duplicate { entity, id } => {
                write!(f, "{} '{}' already exists", entity, id)
            }
            DatabaseErrorKind::Io {
                collection,
                message,
            } => write!(f, "I/O error on collection '{}': {}", collection, message),
            DatabaseErrorKind::Serialization {
                collection,
                message,
            } => write!(f, "Malformed collection '{}': {}", collection, message),
            DatabaseErrorKind::Unknown { message } => write!(f, "Storage error: {}", message),
        }
    }
}

impl std::error::Error for DatabaseError {}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        match err.kind {
            DatabaseErrorKind::NotFound { entity, id } => {
                let domain = match entity.as_str() {
                    "order" => DomainError::OrderNotFound { order_id: id },
                    "reservation" => DomainError::ReservationNotFound { reservation_id: id },
                    "menu item" => DomainError::MenuItemNotFound { item_id: id },
                    "customer" => DomainError::CustomerNotFound { customer_id: id },
                    _ => return AppError::storage(format!("{} '{}' not found", entity, id)),
                };
                AppError::new(AppErrorKind::Domain(domain))
            }
            DatabaseErrorKind::Duplicate { entity, id } => match entity.as_str() {
                "menu item" => {
                    AppError::new(AppErrorKind::Domain(DomainError::DuplicateMenuItem { item_id: id }))
                }
                "customer" => AppError::new(AppErrorKind::Domain(
                    DomainError::EmailAlreadyRegistered { email: id },
                )),
                _ => AppError::storage(format!("{} '{}' already exists", entity, id)),
            },
            other => AppError::storage(DatabaseError::new(other).to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_domain_404() {
        let app: AppError = DatabaseError::not_found("order", "17").into();
        assert_eq!(app.status_code(), 404);
        assert!(app.user_message().contains("17"));
    }

    #[test]
    fn io_maps_to_500() {
        let err = DatabaseError::io(
            "orders",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let app: AppError = err.into();
        assert_eq!(app.status_code(), 500);
    }

    #[test]
    fn duplicate_customer_maps_to_conflict() {
        let err = DatabaseError::new(DatabaseErrorKind::Duplicate {
            entity: "customer".to_string(),
            id: "a@b.c".to_string(),
        });
        assert_eq!(AppError::from(err).status_code(), 409);
    }
}
