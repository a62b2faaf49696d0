// File: nuqta-core/src/repositories/postgres/memberships.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use nuqta_common::error::Error;
use nuqta_common::models::membership::CustomerMembership;
use nuqta_common::traits::repository_traits::MembershipRepository;

const MEMBERSHIP_COLUMNS: &str = r#"
    membership_id, customer_id, tenant_id,
    current_points, lifetime_points, total_visits, total_spent,
    tier_level, tier_upgraded_at, qr_code_hash,
    joined_at, last_visit_at, deleted_at
"#;

pub struct PostgresMembershipRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresMembershipRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipRepository for PostgresMembershipRepository {
    async fn create(&self, m: &CustomerMembership) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO customer_memberships (
                membership_id,
                customer_id,
                tenant_id,
                current_points,
                lifetime_points,
                total_visits,
                total_spent,
                tier_level,
                qr_code_hash,
                joined_at,
                last_visit_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
            "#,
        )
            .bind(m.membership_id)
            .bind(m.customer_id)
            .bind(m.tenant_id)
            .bind(m.current_points)
            .bind(m.lifetime_points)
            .bind(m.total_visits)
            .bind(m.total_spent)
            .bind(m.tier_level)
            .bind(&m.qr_code_hash)
            .bind(m.joined_at)
            .bind(m.last_visit_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(
        &self,
        tenant_id: Uuid,
        membership_id: Uuid,
    ) -> Result<Option<CustomerMembership>, Error> {
        let row = sqlx::query_as::<_, CustomerMembership>(&format!(
            r#"
            SELECT {MEMBERSHIP_COLUMNS}
            FROM customer_memberships
            WHERE tenant_id = $1 AND membership_id = $2 AND deleted_at IS NULL
            "#,
        ))
            .bind(tenant_id)
            .bind(membership_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_for_customer(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<CustomerMembership>, Error> {
        let row = sqlx::query_as::<_, CustomerMembership>(&format!(
            r#"
            SELECT {MEMBERSHIP_COLUMNS}
            FROM customer_memberships
            WHERE tenant_id = $1 AND customer_id = $2 AND deleted_at IS NULL
            "#,
        ))
            .bind(tenant_id)
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_by_qr_hash(&self, qr_hash: &str) -> Result<Option<CustomerMembership>, Error> {
        let row = sqlx::query_as::<_, CustomerMembership>(&format!(
            r#"
            SELECT {MEMBERSHIP_COLUMNS}
            FROM customer_memberships
            WHERE qr_code_hash = $1 AND deleted_at IS NULL
            "#,
        ))
            .bind(qr_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<CustomerMembership>, Error> {
        let rows = sqlx::query_as::<_, CustomerMembership>(&format!(
            r#"
            SELECT {MEMBERSHIP_COLUMNS}
            FROM customer_memberships
            WHERE customer_id = $1 AND deleted_at IS NULL
            ORDER BY joined_at ASC
            "#,
        ))
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count_for_tenant(&self, tenant_id: Uuid) -> Result<i64, Error> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS cnt
            FROM customer_memberships
            WHERE tenant_id = $1 AND deleted_at IS NULL
            "#,
        )
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("cnt")?)
    }

    async fn touch_last_visit(
        &self,
        membership_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE customer_memberships
            SET last_visit_at = $1
            WHERE membership_id = $2
            "#,
        )
            .bind(at)
            .bind(membership_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn soft_delete(&self, tenant_id: Uuid, membership_id: Uuid) -> Result<(), Error> {
        // Financial record retention: memberships are never hard-deleted.
        sqlx::query(
            r#"
            UPDATE customer_memberships
            SET deleted_at = now()
            WHERE tenant_id = $1 AND membership_id = $2 AND deleted_at IS NULL
            "#,
        )
            .bind(tenant_id)
            .bind(membership_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
