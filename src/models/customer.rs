use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::repository::Document;

/// Registered storefront customer. Only [`PublicCustomer`] ever leaves the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicCustomer {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl From<&Customer> for PublicCustomer {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id.clone(),
            name: customer.name.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
        }
    }
}

impl Document for Customer {
    const COLLECTION: &'static str = "customers";
    const ENTITY: &'static str = "customer";

    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_view_drops_hash() {
        let customer = Customer {
            id: "1".to_string(),
            name: "Ravi".to_string(),
            email: "ravi@example.com".to_string(),
            phone: "9000000000".to_string(),
            password_hash: "$argon2id$...".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(PublicCustomer::from(&customer)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["email"], "ravi@example.com");
    }
}
