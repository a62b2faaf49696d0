// File: nuqta-core/src/repositories/postgres/staff.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use nuqta_common::error::Error;
use nuqta_common::models::staff::{PermissionSet, Staff};
use nuqta_common::traits::repository_traits::StaffRepository;

pub struct PostgresStaffRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresStaffRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StaffRepository for PostgresStaffRepository {
    async fn create(&self, staff: &Staff) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO staff (
                staff_id,
                tenant_id,
                full_name,
                email,
                role,
                permissions,
                is_active,
                last_login_at,
                created_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
            "#,
        )
            .bind(staff.staff_id)
            .bind(staff.tenant_id)
            .bind(&staff.full_name)
            .bind(&staff.email)
            .bind(staff.role)
            .bind(serde_json::to_value(&staff.permissions)?)
            .bind(staff.is_active)
            .bind(staff.last_login_at)
            .bind(staff.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get(&self, tenant_id: Uuid, staff_id: Uuid) -> Result<Option<Staff>, Error> {
        let row_opt = sqlx::query(
            r#"
            SELECT staff_id, tenant_id, full_name, email, role, permissions,
                   is_active, last_login_at, created_at, deleted_at
            FROM staff
            WHERE tenant_id = $1 AND staff_id = $2 AND deleted_at IS NULL
            "#,
        )
            .bind(tenant_id)
            .bind(staff_id)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(r) = row_opt {
            let permissions: PermissionSet =
                serde_json::from_value(r.try_get::<serde_json::Value, _>("permissions")?)?;
            Ok(Some(Staff {
                staff_id: r.try_get("staff_id")?,
                tenant_id: r.try_get("tenant_id")?,
                full_name: r.try_get("full_name")?,
                email: r.try_get("email")?,
                role: r.try_get("role")?,
                permissions,
                is_active: r.try_get("is_active")?,
                last_login_at: r.try_get("last_login_at")?,
                created_at: r.try_get("created_at")?,
                deleted_at: r.try_get("deleted_at")?,
            }))
        } else {
            Ok(None)
        }
    }

    async fn count_for_tenant(&self, tenant_id: Uuid) -> Result<i64, Error> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS cnt
            FROM staff
            WHERE tenant_id = $1 AND deleted_at IS NULL
            "#,
        )
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("cnt")?)
    }
}
