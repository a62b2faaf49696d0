use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-tenant singleton configuration consulted by the ledger.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct PointsSetting {
    pub tenant_id: Uuid,
    /// Points earned per unit of currency spent.
    pub currency_to_points_ratio: f64,
    /// None = points never expire.
    pub points_expiry_months: Option<i32>,
    pub allow_partial_redemption: bool,
    pub min_points_for_redemption: i64,
    pub welcome_bonus_points: i64,
    pub birthday_bonus_points: i64,
    pub referrer_bonus_points: i64,
    pub referee_bonus_points: i64,
    pub updated_at: DateTime<Utc>,
}

impl PointsSetting {
    pub fn defaults_for(tenant_id: Uuid) -> Self {
        Self {
            tenant_id,
            currency_to_points_ratio: 1.0,
            points_expiry_months: None,
            allow_partial_redemption: false,
            min_points_for_redemption: 0,
            welcome_bonus_points: 0,
            birthday_bonus_points: 0,
            referrer_bonus_points: 0,
            referee_bonus_points: 0,
            updated_at: Utc::now(),
        }
    }

    /// Points earned for a currency amount: floor(amount * ratio).
    pub fn calculate_points(&self, amount: f64) -> i64 {
        (amount * self.currency_to_points_ratio).floor() as i64
    }

    /// Currency value of a point balance, rounded to 2 decimals; 0 when the
    /// ratio is not positive.
    pub fn calculate_currency(&self, points: i64) -> f64 {
        if self.currency_to_points_ratio <= 0.0 {
            return 0.0;
        }
        (points as f64 / self.currency_to_points_ratio * 100.0).round() / 100.0
    }

    pub fn points_expire(&self) -> bool {
        self.points_expiry_months.is_some()
    }

    /// Expiry deadline for points earned at `from`, or None when expiry is
    /// disabled.
    pub fn expiry_date(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let months = self.points_expiry_months?;
        from.checked_add_months(Months::new(months as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(ratio: f64) -> PointsSetting {
        let mut s = PointsSetting::defaults_for(Uuid::new_v4());
        s.currency_to_points_ratio = ratio;
        s
    }

    #[test]
    fn points_floor() {
        let s = settings(2.5);
        assert_eq!(s.calculate_points(10.0), 25);
        assert_eq!(s.calculate_points(10.3), 25); // 25.75 floors
        assert_eq!(s.calculate_points(0.0), 0);
    }

    #[test]
    fn currency_rounds_to_two_decimals() {
        let s = settings(3.0);
        assert_eq!(s.calculate_currency(100), 33.33);
        assert_eq!(s.calculate_currency(0), 0.0);
    }

    #[test]
    fn currency_is_zero_for_nonpositive_ratio() {
        assert_eq!(settings(0.0).calculate_currency(500), 0.0);
        assert_eq!(settings(-1.0).calculate_currency(500), 0.0);
    }

    #[test]
    fn expiry_disabled_by_default() {
        let s = settings(1.0);
        assert!(!s.points_expire());
        assert!(s.expiry_date(Utc::now()).is_none());
    }

    #[test]
    fn expiry_adds_months() {
        let mut s = settings(1.0);
        s.points_expiry_months = Some(6);
        let from = "2026-01-15T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let expiry = s.expiry_date(from).unwrap();
        assert_eq!(expiry, "2026-07-15T00:00:00Z".parse::<DateTime<Utc>>().unwrap());
    }
}
