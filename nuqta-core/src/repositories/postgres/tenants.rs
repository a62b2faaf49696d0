// File: nuqta-core/src/repositories/postgres/tenants.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use nuqta_common::error::Error;
use nuqta_common::models::tenant::Tenant;
use nuqta_common::traits::repository_traits::TenantRepository;

pub struct PostgresTenantRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresTenantRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for PostgresTenantRepository {
    async fn create(&self, tenant: &Tenant) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO tenants (
                tenant_id,
                business_name,
                business_slug,
                subscription_plan,
                subscription_status,
                max_customers,
                max_staff,
                created_at,
                updated_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
            "#,
        )
            .bind(tenant.tenant_id)
            .bind(&tenant.business_name)
            .bind(&tenant.business_slug)
            .bind(&tenant.subscription_plan)
            .bind(&tenant.subscription_status)
            .bind(tenant.max_customers)
            .bind(tenant.max_staff)
            .bind(tenant.created_at)
            .bind(tenant.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, tenant_id: Uuid) -> Result<Option<Tenant>, Error> {
        let row = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT tenant_id, business_name, business_slug,
                   subscription_plan, subscription_status,
                   max_customers, max_staff,
                   created_at, updated_at, deleted_at
            FROM tenants
            WHERE tenant_id = $1 AND deleted_at IS NULL
            "#,
        )
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tenant>, Error> {
        let row = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT tenant_id, business_name, business_slug,
                   subscription_plan, subscription_status,
                   max_customers, max_staff,
                   created_at, updated_at, deleted_at
            FROM tenants
            WHERE business_slug = $1 AND deleted_at IS NULL
            "#,
        )
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}
