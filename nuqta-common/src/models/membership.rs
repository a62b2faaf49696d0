use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::tier::TierLevel;

/// A customer's point-earning relationship with one tenant, and the unit of
/// ledger state.
///
/// Core invariant the whole system protects:
/// `current_points == sum(transactions.points)` for this membership.
/// `lifetime_points` never decreases. Memberships are soft-deleted only.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct CustomerMembership {
    pub membership_id: Uuid,
    pub customer_id: Uuid,
    pub tenant_id: Uuid,
    pub current_points: i64,
    pub lifetime_points: i64,
    pub total_visits: i64,
    pub total_spent: f64,
    pub tier_level: TierLevel,
    pub tier_upgraded_at: Option<DateTime<Utc>>,
    /// Opaque unique hash scanned by staff; generated at creation, immutable.
    pub qr_code_hash: String,
    pub joined_at: DateTime<Utc>,
    pub last_visit_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl CustomerMembership {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}
