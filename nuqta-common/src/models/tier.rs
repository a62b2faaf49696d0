use std::fmt;
use std::str::FromStr;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed ordinal ranking of tier levels: bronze < silver < gold < platinum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, sqlx::Type)]
#[sqlx(type_name = "TEXT")]
#[sqlx(rename_all = "lowercase")]
pub enum TierLevel {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl TierLevel {
    /// Ordinal rank used for eligibility comparisons.
    pub fn rank(&self) -> u8 {
        match self {
            TierLevel::Bronze => 1,
            TierLevel::Silver => 2,
            TierLevel::Gold => 3,
            TierLevel::Platinum => 4,
        }
    }
}

impl fmt::Display for TierLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierLevel::Bronze => write!(f, "bronze"),
            TierLevel::Silver => write!(f, "silver"),
            TierLevel::Gold => write!(f, "gold"),
            TierLevel::Platinum => write!(f, "platinum"),
        }
    }
}

impl FromStr for TierLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bronze" => Ok(TierLevel::Bronze),
            "silver" => Ok(TierLevel::Silver),
            "gold" => Ok(TierLevel::Gold),
            "platinum" => Ok(TierLevel::Platinum),
            _ => Err(format!("Unknown tier level: {}", s)),
        }
    }
}

/// Per-tenant tier configuration row. At most one active tier per level per
/// tenant; `min_points` is assumed monotonic across ascending levels.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Tier {
    pub tier_id: Uuid,
    pub tenant_id: Uuid,
    pub level: TierLevel,
    pub name: String,
    pub min_points: i64,
    pub points_multiplier: f64,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tier {
    /// Earned points after this tier's multiplier.
    pub fn apply_multiplier(&self, base_points: i64) -> i64 {
        (base_points as f64 * self.points_multiplier).floor() as i64
    }

    pub fn icon(&self) -> &str {
        if let Some(i) = &self.icon {
            return i;
        }
        match self.level {
            TierLevel::Bronze => "🥉",
            TierLevel::Silver => "🥈",
            TierLevel::Gold => "🥇",
            TierLevel::Platinum => "💎",
        }
    }

    pub fn color(&self) -> &str {
        if let Some(c) = &self.color {
            return c;
        }
        match self.level {
            TierLevel::Bronze => "#CD7F32",
            TierLevel::Silver => "#C0C0C0",
            TierLevel::Gold => "#FFD700",
            TierLevel::Platinum => "#E5E4E2",
        }
    }
}
