use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle: pending -> {approved, rejected};
/// approved -> {used, expired, cancelled}.
/// rejected, used, expired and cancelled are terminal.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
#[sqlx(rename_all = "lowercase")]
pub enum RedemptionStatus {
    Pending,
    Approved,
    Rejected,
    Used,
    Expired,
    Cancelled,
}

impl RedemptionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RedemptionStatus::Rejected
                | RedemptionStatus::Used
                | RedemptionStatus::Expired
                | RedemptionStatus::Cancelled
        )
    }
}

impl fmt::Display for RedemptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RedemptionStatus::Pending => "pending",
            RedemptionStatus::Approved => "approved",
            RedemptionStatus::Rejected => "rejected",
            RedemptionStatus::Used => "used",
            RedemptionStatus::Expired => "expired",
            RedemptionStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for RedemptionStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(RedemptionStatus::Pending),
            "approved" => Ok(RedemptionStatus::Approved),
            "rejected" => Ok(RedemptionStatus::Rejected),
            "used" => Ok(RedemptionStatus::Used),
            "expired" => Ok(RedemptionStatus::Expired),
            "cancelled" => Ok(RedemptionStatus::Cancelled),
            _ => Err(format!("Unknown redemption status: {}", s)),
        }
    }
}

/// A customer's claim on a catalog reward, funded by a point debit.
///
/// `points_used` is fixed at creation and equals the magnitude of the linked
/// transaction's debit. Rejection refunds via a *new* transaction, never by
/// mutating the original.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Redemption {
    pub redemption_id: Uuid,
    pub tenant_id: Uuid,
    pub membership_id: Uuid,
    pub reward_id: Uuid,
    /// The debit that funded this claim.
    pub transaction_id: Uuid,
    /// Unique human-readable code, e.g. "RDM-7KQ2ZX".
    pub redemption_code: String,
    /// Unique opaque hash for staff-side QR verification.
    pub qr_code_hash: String,
    pub points_used: i64,
    pub status: RedemptionStatus,
    pub notes: Option<String>,
    pub redeemed_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<Uuid>,
    pub used_at: Option<DateTime<Utc>>,
    pub used_by: Option<Uuid>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Redemption {
    /// Lazy expiry: a redemption past its deadline is functionally expired
    /// regardless of the stored status.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        if self.status == RedemptionStatus::Expired {
            return true;
        }
        match self.expires_at {
            Some(deadline) => now > deadline,
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RedemptionStatus::Pending
    }

    pub fn is_approved(&self) -> bool {
        self.status == RedemptionStatus::Approved
    }
}
