// src/tasks/points_expiry.rs

use chrono::{Months, Utc};
use sqlx::{PgPool, Row};
use tracing::{error, info};
use uuid::Uuid;

use nuqta_common::models::transaction::TransactionType;

use crate::Error;
use crate::services::ledger_service::{LedgerService, PointsDelta};
use crate::services::notification_service::NotificationService;

/// Expire points for every tenant that has an expiry window configured.
///
/// For each membership the expirable amount is the credits earned before the
/// cutoff, less every debit already taken. Expiry goes through the ledger as
/// a regular `expire` transaction, so the balance invariant, tier
/// recomputation and audit trail all hold. Failures on one membership are
/// logged and do not stop the sweep.
///
/// Returns the number of memberships that had points expired.
pub async fn run_points_expiry(
    pool: &PgPool,
    ledger: &LedgerService,
    notifier: &NotificationService,
) -> Result<u64, Error> {
    let tenants = sqlx::query(
        r#"
        SELECT tenant_id, points_expiry_months
        FROM points_settings
        WHERE points_expiry_months IS NOT NULL
        "#,
    )
        .fetch_all(pool)
        .await?;

    let mut expired_memberships = 0u64;
    for row in tenants {
        let tenant_id: Uuid = row.try_get("tenant_id")?;
        let months: i32 = row.try_get("points_expiry_months")?;
        expired_memberships +=
            expire_for_tenant(pool, ledger, notifier, tenant_id, months).await?;
    }
    Ok(expired_memberships)
}

async fn expire_for_tenant(
    pool: &PgPool,
    ledger: &LedgerService,
    notifier: &NotificationService,
    tenant_id: Uuid,
    months: i32,
) -> Result<u64, Error> {
    let Some(cutoff) = Utc::now().checked_sub_months(Months::new(months as u32)) else {
        return Ok(0);
    };

    // Credits older than the cutoff, net of every debit ever taken. Debits
    // consume the oldest credits first, so anything left is stale.
    let rows = sqlx::query(
        r#"
        SELECT membership_id,
               (SUM(CASE WHEN points > 0 AND created_at < $2 THEN points ELSE 0 END)
              + SUM(CASE WHEN points < 0 THEN points ELSE 0 END))::BIGINT AS expirable
        FROM transactions
        WHERE tenant_id = $1
        GROUP BY membership_id
        HAVING SUM(CASE WHEN points > 0 AND created_at < $2 THEN points ELSE 0 END)
             + SUM(CASE WHEN points < 0 THEN points ELSE 0 END) > 0
        "#,
    )
        .bind(tenant_id)
        .bind(cutoff)
        .fetch_all(pool)
        .await?;

    let mut expired = 0u64;
    for row in rows {
        let membership_id: Uuid = row.try_get("membership_id")?;
        let expirable: i64 = row.try_get("expirable")?;

        let delta = PointsDelta::new(
            TransactionType::Expire,
            -expirable,
            format!("Points expired after {} months", months),
        );
        match ledger.apply_delta(tenant_id, membership_id, delta).await {
            Ok(applied) => {
                let lost = -applied.transaction.points;
                if lost > 0 {
                    notifier.points_expired(tenant_id, membership_id, lost).await;
                    expired += 1;
                }
            }
            Err(e) => {
                error!(
                    "points expiry failed for membership {} (tenant {}): {}",
                    membership_id, tenant_id, e
                );
            }
        }
    }

    if expired > 0 {
        info!(
            "points expiry: {} membership(s) in tenant {} lost stale points",
            expired, tenant_id
        );
    }
    Ok(expired)
}
