// File: nuqta-core/src/repositories/postgres/redemptions.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use nuqta_common::error::Error;
use nuqta_common::models::redemption::{Redemption, RedemptionStatus};
use nuqta_common::traits::repository_traits::RedemptionRepository;

pub(crate) const REDEMPTION_COLUMNS: &str = r#"
    redemption_id, tenant_id, membership_id, reward_id, transaction_id,
    redemption_code, qr_code_hash, points_used, status, notes,
    redeemed_at, approved_at, approved_by, used_at, used_by, expires_at
"#;

pub struct PostgresRedemptionRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresRedemptionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RedemptionRepository for PostgresRedemptionRepository {
    async fn get(
        &self,
        tenant_id: Uuid,
        redemption_id: Uuid,
    ) -> Result<Option<Redemption>, Error> {
        let row = sqlx::query_as::<_, Redemption>(&format!(
            r#"
            SELECT {REDEMPTION_COLUMNS}
            FROM redemptions
            WHERE tenant_id = $1 AND redemption_id = $2
            "#,
        ))
            .bind(tenant_id)
            .bind(redemption_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_by_code(&self, tenant_id: Uuid, code: &str) -> Result<Option<Redemption>, Error> {
        let row = sqlx::query_as::<_, Redemption>(&format!(
            r#"
            SELECT {REDEMPTION_COLUMNS}
            FROM redemptions
            WHERE tenant_id = $1 AND redemption_code = $2
            "#,
        ))
            .bind(tenant_id)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_by_qr_hash(&self, qr_hash: &str) -> Result<Option<Redemption>, Error> {
        let row = sqlx::query_as::<_, Redemption>(&format!(
            r#"
            SELECT {REDEMPTION_COLUMNS}
            FROM redemptions
            WHERE qr_code_hash = $1
            "#,
        ))
            .bind(qr_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_for_membership(
        &self,
        tenant_id: Uuid,
        membership_id: Uuid,
    ) -> Result<Vec<Redemption>, Error> {
        let rows = sqlx::query_as::<_, Redemption>(&format!(
            r#"
            SELECT {REDEMPTION_COLUMNS}
            FROM redemptions
            WHERE tenant_id = $1 AND membership_id = $2
            ORDER BY redeemed_at DESC
            "#,
        ))
            .bind(tenant_id)
            .bind(membership_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_by_status(
        &self,
        tenant_id: Uuid,
        status: RedemptionStatus,
    ) -> Result<Vec<Redemption>, Error> {
        let rows = sqlx::query_as::<_, Redemption>(&format!(
            r#"
            SELECT {REDEMPTION_COLUMNS}
            FROM redemptions
            WHERE tenant_id = $1 AND status = $2
            ORDER BY redeemed_at DESC
            "#,
        ))
            .bind(tenant_id)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
