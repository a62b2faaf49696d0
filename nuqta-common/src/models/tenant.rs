use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A merchant operating an independent loyalty program.
///
/// The `business_slug` is immutable after creation; customer/staff caps are
/// enforced at membership/staff creation time, never retroactively.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Tenant {
    pub tenant_id: Uuid,
    pub business_name: String,
    pub business_slug: String,
    pub subscription_plan: String,
    pub subscription_status: String,
    pub max_customers: Option<i64>,
    pub max_staff: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Tenant {
    pub fn is_subscribed(&self) -> bool {
        self.subscription_status == "active" || self.subscription_status == "trial"
    }
}
