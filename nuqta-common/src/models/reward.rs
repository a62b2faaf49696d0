use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::membership::CustomerMembership;
use crate::models::tier::TierLevel;

/// One reason a membership cannot redeem a reward right now. Callers get all
/// failing reasons, not just the first.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq)]
pub enum RedeemBlock {
    InsufficientPoints,
    TierTooLow,
    NotAvailable,
}

impl RedeemBlock {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedeemBlock::InsufficientPoints => "insufficient_points",
            RedeemBlock::TierTooLow => "tier_too_low",
            RedeemBlock::NotAvailable => "not_available",
        }
    }
}

/// Redeemable catalog item.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Reward {
    pub reward_id: Uuid,
    pub tenant_id: Uuid,
    pub title_en: String,
    pub title_ar: Option<String>,
    pub description_en: Option<String>,
    pub description_ar: Option<String>,
    pub points_required: i64,
    /// None = unlimited stock.
    pub stock: Option<i64>,
    pub min_tier_required: Option<TierLevel>,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub display_order: i32,
    pub total_redemptions: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Reward {
    /// Active, in stock, and inside the validity window.
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        if let Some(stock) = self.stock {
            if stock <= 0 {
                return false;
            }
        }
        if let Some(from) = self.valid_from {
            if now < from {
                return false;
            }
        }
        if let Some(until) = self.valid_until {
            if now > until {
                return false;
            }
        }
        true
    }

    pub fn is_tier_eligible(&self, customer_tier: TierLevel) -> bool {
        match self.min_tier_required {
            None => true,
            Some(required) => customer_tier.rank() >= required.rank(),
        }
    }

    /// Every reason the membership cannot redeem this reward; empty = can redeem.
    pub fn redeem_blocks(
        &self,
        membership: &CustomerMembership,
        now: DateTime<Utc>,
    ) -> Vec<RedeemBlock> {
        let mut blocks = Vec::new();
        if membership.current_points < self.points_required {
            blocks.push(RedeemBlock::InsufficientPoints);
        }
        if !self.is_tier_eligible(membership.tier_level) {
            blocks.push(RedeemBlock::TierTooLow);
        }
        if !self.is_available(now) {
            blocks.push(RedeemBlock::NotAvailable);
        }
        blocks
    }

    pub fn can_be_redeemed_by(&self, membership: &CustomerMembership, now: DateTime<Utc>) -> bool {
        self.redeem_blocks(membership, now).is_empty()
    }

    pub fn points_needed(&self, membership: &CustomerMembership) -> i64 {
        (self.points_required - membership.current_points).max(0)
    }
}
