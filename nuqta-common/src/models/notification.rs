use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
#[sqlx(rename_all = "snake_case")]
pub enum NotificationKind {
    WelcomeBonus,
    PointsEarned,
    TierUpgrade,
    RewardRedeemed,
    RedemptionApproved,
    RedemptionRejected,
    PointsExpired,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotificationKind::WelcomeBonus => "welcome_bonus",
            NotificationKind::PointsEarned => "points_earned",
            NotificationKind::TierUpgrade => "tier_upgrade",
            NotificationKind::RewardRedeemed => "reward_redeemed",
            NotificationKind::RedemptionApproved => "redemption_approved",
            NotificationKind::RedemptionRejected => "redemption_rejected",
            NotificationKind::PointsExpired => "points_expired",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for NotificationKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "welcome_bonus" => Ok(NotificationKind::WelcomeBonus),
            "points_earned" => Ok(NotificationKind::PointsEarned),
            "tier_upgrade" => Ok(NotificationKind::TierUpgrade),
            "reward_redeemed" => Ok(NotificationKind::RewardRedeemed),
            "redemption_approved" => Ok(NotificationKind::RedemptionApproved),
            "redemption_rejected" => Ok(NotificationKind::RedemptionRejected),
            "points_expired" => Ok(NotificationKind::PointsExpired),
            _ => Err(format!("Unknown notification kind: {}", s)),
        }
    }
}

/// Fire-and-forget side record of a state change. Purely an outbox; never
/// consulted for any later ledger decision.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Notification {
    pub notification_id: Uuid,
    pub tenant_id: Uuid,
    pub membership_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub title_en: String,
    pub title_ar: Option<String>,
    pub message_en: String,
    pub message_ar: Option<String>,
    pub is_read: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn title_for(&self, language: &str) -> &str {
        match language {
            "ar" => self.title_ar.as_deref().unwrap_or(&self.title_en),
            _ => &self.title_en,
        }
    }

    pub fn message_for(&self, language: &str) -> &str {
        match language {
            "ar" => self.message_ar.as_deref().unwrap_or(&self.message_en),
            _ => &self.message_en,
        }
    }
}
