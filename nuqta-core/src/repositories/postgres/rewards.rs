// File: nuqta-core/src/repositories/postgres/rewards.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use nuqta_common::error::Error;
use nuqta_common::models::reward::Reward;
use nuqta_common::traits::repository_traits::RewardRepository;

const REWARD_COLUMNS: &str = r#"
    reward_id, tenant_id, title_en, title_ar, description_en, description_ar,
    points_required, stock, min_tier_required, valid_from, valid_until,
    is_active, display_order, total_redemptions,
    created_at, updated_at, deleted_at
"#;

pub struct PostgresRewardRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresRewardRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RewardRepository for PostgresRewardRepository {
    async fn create(&self, reward: &Reward) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO rewards (
                reward_id,
                tenant_id,
                title_en,
                title_ar,
                description_en,
                description_ar,
                points_required,
                stock,
                min_tier_required,
                valid_from,
                valid_until,
                is_active,
                display_order,
                total_redemptions,
                created_at,
                updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16)
            "#,
        )
            .bind(reward.reward_id)
            .bind(reward.tenant_id)
            .bind(&reward.title_en)
            .bind(&reward.title_ar)
            .bind(&reward.description_en)
            .bind(&reward.description_ar)
            .bind(reward.points_required)
            .bind(reward.stock)
            .bind(reward.min_tier_required)
            .bind(reward.valid_from)
            .bind(reward.valid_until)
            .bind(reward.is_active)
            .bind(reward.display_order)
            .bind(reward.total_redemptions)
            .bind(reward.created_at)
            .bind(reward.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, tenant_id: Uuid, reward_id: Uuid) -> Result<Option<Reward>, Error> {
        let row = sqlx::query_as::<_, Reward>(&format!(
            r#"
            SELECT {REWARD_COLUMNS}
            FROM rewards
            WHERE tenant_id = $1 AND reward_id = $2 AND deleted_at IS NULL
            "#,
        ))
            .bind(tenant_id)
            .bind(reward_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_available(
        &self,
        tenant_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<Reward>, Error> {
        let rows = sqlx::query_as::<_, Reward>(&format!(
            r#"
            SELECT {REWARD_COLUMNS}
            FROM rewards
            WHERE tenant_id = $1
              AND deleted_at IS NULL
              AND is_active
              AND (stock IS NULL OR stock > 0)
              AND (valid_from IS NULL OR valid_from <= $2)
              AND (valid_until IS NULL OR valid_until >= $2)
            ORDER BY display_order ASC, points_required ASC
            "#,
        ))
            .bind(tenant_id)
            .bind(now)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
