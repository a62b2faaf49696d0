// File: nuqta-core/src/repositories/postgres/points_settings.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use nuqta_common::error::Error;
use nuqta_common::models::points_setting::PointsSetting;
use nuqta_common::traits::repository_traits::PointsSettingRepository;

pub struct PostgresPointsSettingRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresPointsSettingRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PointsSettingRepository for PostgresPointsSettingRepository {
    async fn get_for_tenant(&self, tenant_id: Uuid) -> Result<Option<PointsSetting>, Error> {
        let row = sqlx::query_as::<_, PointsSetting>(
            r#"
            SELECT tenant_id, currency_to_points_ratio, points_expiry_months,
                   allow_partial_redemption, min_points_for_redemption,
                   welcome_bonus_points, birthday_bonus_points,
                   referrer_bonus_points, referee_bonus_points, updated_at
            FROM points_settings
            WHERE tenant_id = $1
            "#,
        )
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn upsert(&self, s: &PointsSetting) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO points_settings (
                tenant_id,
                currency_to_points_ratio,
                points_expiry_months,
                allow_partial_redemption,
                min_points_for_redemption,
                welcome_bonus_points,
                birthday_bonus_points,
                referrer_bonus_points,
                referee_bonus_points,
                updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10)
            ON CONFLICT (tenant_id) DO UPDATE SET
                currency_to_points_ratio = EXCLUDED.currency_to_points_ratio,
                points_expiry_months = EXCLUDED.points_expiry_months,
                allow_partial_redemption = EXCLUDED.allow_partial_redemption,
                min_points_for_redemption = EXCLUDED.min_points_for_redemption,
                welcome_bonus_points = EXCLUDED.welcome_bonus_points,
                birthday_bonus_points = EXCLUDED.birthday_bonus_points,
                referrer_bonus_points = EXCLUDED.referrer_bonus_points,
                referee_bonus_points = EXCLUDED.referee_bonus_points,
                updated_at = EXCLUDED.updated_at
            "#,
        )
            .bind(s.tenant_id)
            .bind(s.currency_to_points_ratio)
            .bind(s.points_expiry_months)
            .bind(s.allow_partial_redemption)
            .bind(s.min_points_for_redemption)
            .bind(s.welcome_bonus_points)
            .bind(s.birthday_bonus_points)
            .bind(s.referrer_bonus_points)
            .bind(s.referee_bonus_points)
            .bind(s.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
