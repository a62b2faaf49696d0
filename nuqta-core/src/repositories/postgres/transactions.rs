// File: nuqta-core/src/repositories/postgres/transactions.rs

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use nuqta_common::error::Error;
use nuqta_common::models::transaction::{Transaction, TransactionRef};
use nuqta_common::traits::repository_traits::{Page, TransactionFilter, TransactionRepository};

pub(crate) fn row_to_transaction(r: &PgRow) -> Result<Transaction, Error> {
    let kind: Option<String> = r.try_get("reference_kind")?;
    let ref_id: Option<Uuid> = r.try_get("reference_id")?;
    let reference = TransactionRef::from_columns(kind.as_deref(), ref_id).map_err(Error::Parse)?;

    Ok(Transaction {
        transaction_id: r.try_get("transaction_id")?,
        tenant_id: r.try_get("tenant_id")?,
        membership_id: r.try_get("membership_id")?,
        tx_type: r.try_get("tx_type")?,
        points: r.try_get("points")?,
        amount: r.try_get("amount")?,
        description: r.try_get("description")?,
        reference,
        staff_id: r.try_get("staff_id")?,
        balance_after: r.try_get("balance_after")?,
        created_at: r.try_get("created_at")?,
    })
}

pub struct PostgresTransactionRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresTransactionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionRepository for PostgresTransactionRepository {
    async fn get(
        &self,
        tenant_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<Option<Transaction>, Error> {
        let row_opt = sqlx::query(
            r#"
            SELECT transaction_id, tenant_id, membership_id, tx_type, points,
                   amount, description, reference_kind, reference_id,
                   staff_id, balance_after, created_at
            FROM transactions
            WHERE tenant_id = $1 AND transaction_id = $2
            "#,
        )
            .bind(tenant_id)
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await?;

        match row_opt {
            Some(r) => Ok(Some(row_to_transaction(&r)?)),
            None => Ok(None),
        }
    }

    async fn history(
        &self,
        tenant_id: Uuid,
        membership_id: Uuid,
        filter: &TransactionFilter,
        page: i64,
        per_page: i64,
    ) -> Result<Page<Transaction>, Error> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);
        let offset = (page - 1) * per_page;

        let tx_type = filter.tx_type.map(|t| t.to_string());

        let total_row = sqlx::query(
            r#"
            SELECT COUNT(*) AS cnt
            FROM transactions
            WHERE tenant_id = $1
              AND membership_id = $2
              AND ($3::TEXT IS NULL OR tx_type = $3)
              AND ($4::TIMESTAMPTZ IS NULL OR created_at >= $4)
              AND ($5::TIMESTAMPTZ IS NULL OR created_at <= $5)
            "#,
        )
            .bind(tenant_id)
            .bind(membership_id)
            .bind(&tx_type)
            .bind(filter.from_date)
            .bind(filter.to_date)
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = total_row.try_get("cnt")?;

        let rows = sqlx::query(
            r#"
            SELECT transaction_id, tenant_id, membership_id, tx_type, points,
                   amount, description, reference_kind, reference_id,
                   staff_id, balance_after, created_at
            FROM transactions
            WHERE tenant_id = $1
              AND membership_id = $2
              AND ($3::TEXT IS NULL OR tx_type = $3)
              AND ($4::TIMESTAMPTZ IS NULL OR created_at >= $4)
              AND ($5::TIMESTAMPTZ IS NULL OR created_at <= $5)
            ORDER BY created_at DESC
            LIMIT $6 OFFSET $7
            "#,
        )
            .bind(tenant_id)
            .bind(membership_id)
            .bind(&tx_type)
            .bind(filter.from_date)
            .bind(filter.to_date)
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        for r in rows {
            items.push(row_to_transaction(&r)?);
        }

        Ok(Page { items, page, per_page, total })
    }

    async fn sum_points(&self, membership_id: Uuid) -> Result<i64, Error> {
        let row = sqlx::query(
            r#"
            SELECT COALESCE(SUM(points), 0)::BIGINT AS total
            FROM transactions
            WHERE membership_id = $1
            "#,
        )
            .bind(membership_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("total")?)
    }
}
