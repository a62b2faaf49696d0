use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
#[sqlx(rename_all = "snake_case")]
pub enum TransactionType {
    Earn,
    Redeem,
    Bonus,
    Referral,
    ManualAdd,
    ManualSubtract,
    Expire,
    Adjustment,
}

impl TransactionType {
    /// Expire and adjustment debits clamp to a zero balance instead of
    /// failing with InsufficientPoints.
    pub fn clamps_to_zero(&self) -> bool {
        matches!(self, TransactionType::Expire | TransactionType::Adjustment)
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionType::Earn => "earn",
            TransactionType::Redeem => "redeem",
            TransactionType::Bonus => "bonus",
            TransactionType::Referral => "referral",
            TransactionType::ManualAdd => "manual_add",
            TransactionType::ManualSubtract => "manual_subtract",
            TransactionType::Expire => "expire",
            TransactionType::Adjustment => "adjustment",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for TransactionType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "earn" => Ok(TransactionType::Earn),
            "redeem" => Ok(TransactionType::Redeem),
            "bonus" => Ok(TransactionType::Bonus),
            "referral" => Ok(TransactionType::Referral),
            "manual_add" => Ok(TransactionType::ManualAdd),
            "manual_subtract" => Ok(TransactionType::ManualSubtract),
            "expire" => Ok(TransactionType::Expire),
            "adjustment" => Ok(TransactionType::Adjustment),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

/// Tagged reference to the record that caused a ledger entry. Closed set,
/// resolved at write time.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq)]
pub enum TransactionRef {
    Redemption(Uuid),
    Reward(Uuid),
}

impl TransactionRef {
    pub fn kind(&self) -> &'static str {
        match self {
            TransactionRef::Redemption(_) => "redemption",
            TransactionRef::Reward(_) => "reward",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            TransactionRef::Redemption(id) | TransactionRef::Reward(id) => *id,
        }
    }

    pub fn from_columns(kind: Option<&str>, id: Option<Uuid>) -> Result<Option<Self>, String> {
        match (kind, id) {
            (None, _) | (_, None) => Ok(None),
            (Some("redemption"), Some(id)) => Ok(Some(TransactionRef::Redemption(id))),
            (Some("reward"), Some(id)) => Ok(Some(TransactionRef::Reward(id))),
            (Some(other), _) => Err(format!("Unknown transaction reference kind: {}", other)),
        }
    }
}

/// Immutable ledger entry. Once written it is never mutated or deleted; it is
/// the audit source of truth for the membership balance.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Transaction {
    pub transaction_id: Uuid,
    pub tenant_id: Uuid,
    pub membership_id: Uuid,
    pub tx_type: TransactionType,
    /// Signed points delta.
    pub points: i64,
    /// Optional currency amount the delta was derived from.
    pub amount: Option<f64>,
    pub description: String,
    pub reference: Option<TransactionRef>,
    pub staff_id: Option<Uuid>,
    /// Running-balance snapshot; equals the membership balance at insertion.
    pub balance_after: i64,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_credit(&self) -> bool {
        self.points > 0
    }

    pub fn is_debit(&self) -> bool {
        self.points < 0
    }
}
