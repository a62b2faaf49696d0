// src/tasks/redemption_expiry.rs

use sqlx::PgPool;
use tracing::info;

use crate::Error;

/// Periodic sweep that flips pending and approved redemptions past their
/// `expires_at` deadline to 'expired'.
///
/// Readers never depend on this sweep: the state machine also expires lazily
/// whenever a stale redemption is touched. The sweep only keeps staff-facing
/// listings honest for rows nobody touched. Expiry does not refund; the
/// member had the full validity window to use the claim.
///
/// Returns the number of rows expired.
pub async fn run_redemption_expiry_sweep(pool: &PgPool) -> Result<u64, Error> {
    let result = sqlx::query(
        r#"
        UPDATE redemptions
        SET status = 'expired'
        WHERE status IN ('pending', 'approved')
          AND expires_at IS NOT NULL
          AND expires_at < now()
        "#,
    )
        .execute(pool)
        .await?;

    let expired = result.rows_affected();
    if expired > 0 {
        info!("redemption expiry sweep: {} redemption(s) expired", expired);
    }
    Ok(expired)
}
