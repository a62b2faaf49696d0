use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A person shared across tenants. Owns zero or more memberships.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct GlobalCustomer {
    pub customer_id: Uuid,
    pub full_name: String,
    /// Unique across the platform.
    pub phone_number: String,
    pub email: Option<String>,
    pub phone_verified: bool,
    pub email_verified: bool,
    /// Preferred language for notification payloads ("en" or "ar").
    pub language: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
