// File: nuqta-core/src/repositories/postgres/tiers.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use nuqta_common::error::Error;
use nuqta_common::models::tier::Tier;
use nuqta_common::traits::repository_traits::TierRepository;

pub struct PostgresTierRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresTierRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TierRepository for PostgresTierRepository {
    async fn create(&self, tier: &Tier) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO tiers (
                tier_id,
                tenant_id,
                level,
                name,
                min_points,
                points_multiplier,
                icon,
                color,
                display_order,
                is_active,
                created_at,
                updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
            "#,
        )
            .bind(tier.tier_id)
            .bind(tier.tenant_id)
            .bind(tier.level)
            .bind(&tier.name)
            .bind(tier.min_points)
            .bind(tier.points_multiplier)
            .bind(&tier.icon)
            .bind(&tier.color)
            .bind(tier.display_order)
            .bind(tier.is_active)
            .bind(tier.created_at)
            .bind(tier.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_active(&self, tenant_id: Uuid) -> Result<Vec<Tier>, Error> {
        let rows = sqlx::query_as::<_, Tier>(
            r#"
            SELECT tier_id, tenant_id, level, name, min_points,
                   points_multiplier, icon, color, display_order,
                   is_active, created_at, updated_at
            FROM tiers
            WHERE tenant_id = $1 AND is_active
            ORDER BY min_points ASC
            "#,
        )
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
