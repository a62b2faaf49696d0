//! The redemption state machine.
//!
//! Creation debits the member's points, decrements reward stock and inserts
//! the redemption row in one database transaction; either everything commits
//! or nothing does. Staff resolution (approve/reject/use/cancel) locks the
//! redemption row so two staff devices cannot resolve the same claim twice.
//! Rejection refunds by appending a new adjustment transaction, never by
//! editing the original debit.

use std::sync::Arc;
use chrono::{Duration, Utc};
use sqlx::{Acquire, Pool, Postgres};
use tracing::info;
use uuid::Uuid;

use nuqta_common::error::Error;
use nuqta_common::models::redemption::{Redemption, RedemptionStatus};
use nuqta_common::models::reward::{RedeemBlock, Reward};
use nuqta_common::models::transaction::{TransactionRef, TransactionType};
use nuqta_common::traits::repository_traits::RedemptionRepository;

use crate::repositories::postgres::PostgresRedemptionRepository;
use crate::repositories::postgres::redemptions::REDEMPTION_COLUMNS;
use crate::services::codes::random_code;
use crate::services::ledger_service::{LedgerService, PointsDelta, lock_membership};
use crate::services::notification_service::NotificationService;

/// Redemptions stay claimable for this long after creation.
const REDEMPTION_VALIDITY_DAYS: i64 = 30;

/// Attempts at generating a unique code/hash pair before giving up.
const MAX_CODE_ATTEMPTS: u32 = 5;

/// A state change plus the balance it left behind.
#[derive(Debug, Clone)]
pub struct RedemptionOutcome {
    pub redemption: Redemption,
    pub new_balance: i64,
}

pub struct RedemptionService {
    pool: Pool<Postgres>,
    notifier: Arc<NotificationService>,
}

impl RedemptionService {
    pub fn new(pool: Pool<Postgres>, notifier: Arc<NotificationService>) -> Self {
        Self { pool, notifier }
    }

    /// Redeem a reward: validate eligibility, debit points, take stock and
    /// create the pending redemption, all atomically.
    ///
    /// The reward row is locked and its stock decremented conditionally, so
    /// when N members race for the last unit exactly one create succeeds and
    /// the rest fail with `NotEligible([NotAvailable])` and no debit.
    pub async fn create(
        &self,
        tenant_id: Uuid,
        membership_id: Uuid,
        reward_id: Uuid,
    ) -> Result<RedemptionOutcome, Error> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Lock ordering: membership first, then reward. Every writer that
        // touches both follows the same order.
        let membership = lock_membership(&mut tx, tenant_id, membership_id).await?;
        let reward = lock_reward(&mut tx, tenant_id, reward_id).await?;

        let blocks = reward.redeem_blocks(&membership, now);
        if !blocks.is_empty() {
            return Err(Error::NotEligible(blocks));
        }

        take_stock(&mut tx, &reward).await?;

        let redemption_id = Uuid::new_v4();
        let mut delta = PointsDelta::new(
            TransactionType::Redeem,
            -reward.points_required,
            format!("Redeemed: {}", reward.title_en),
        );
        delta.reference = Some(TransactionRef::Redemption(redemption_id));
        let applied = LedgerService::apply_delta_in(&mut tx, tenant_id, membership_id, delta).await?;

        let mut redemption = Redemption {
            redemption_id,
            tenant_id,
            membership_id,
            reward_id,
            transaction_id: applied.transaction.transaction_id,
            redemption_code: random_code("RDM-", 6),
            qr_code_hash: random_code("QR-RED-", 20),
            points_used: reward.points_required,
            status: RedemptionStatus::Pending,
            notes: None,
            redeemed_at: now,
            approved_at: None,
            approved_by: None,
            used_at: None,
            used_by: None,
            expires_at: Some(now + Duration::days(REDEMPTION_VALIDITY_DAYS)),
        };
        insert_with_retry(&mut tx, &mut redemption).await?;

        tx.commit().await?;

        info!(
            "redemption {} created for membership {} ({} points)",
            redemption.redemption_code, membership_id, redemption.points_used
        );
        self.notifier
            .redemption_created(&redemption, &reward.title_en)
            .await;
        if let Some((previous, current)) = &applied.tier_change {
            self.notifier
                .tier_changed(tenant_id, membership_id, previous, current)
                .await;
        }

        Ok(RedemptionOutcome {
            redemption,
            new_balance: applied.transaction.balance_after,
        })
    }

    /// pending -> approved.
    pub async fn approve(
        &self,
        tenant_id: Uuid,
        redemption_id: Uuid,
        staff_id: Uuid,
    ) -> Result<Redemption, Error> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let redemption = lock_redemption(&mut tx, tenant_id, redemption_id).await?;
        if expire_if_due(&mut tx, &redemption).await? {
            tx.commit().await?;
            return Err(Error::InvalidStateTransition {
                status: RedemptionStatus::Expired,
                action: "approve",
            });
        }
        if redemption.status != RedemptionStatus::Pending {
            return Err(Error::InvalidStateTransition {
                status: redemption.status,
                action: "approve",
            });
        }

        let updated = sqlx::query_as::<_, Redemption>(&format!(
            r#"
            UPDATE redemptions
            SET status = 'approved', approved_at = $1, approved_by = $2
            WHERE redemption_id = $3
            RETURNING {REDEMPTION_COLUMNS}
            "#,
        ))
            .bind(now)
            .bind(staff_id)
            .bind(redemption_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        self.notifier.redemption_approved(&updated).await;
        Ok(updated)
    }

    /// pending -> rejected, refunding the debited points through a fresh
    /// adjustment transaction in the same database transaction.
    pub async fn reject(
        &self,
        tenant_id: Uuid,
        redemption_id: Uuid,
        staff_id: Uuid,
        reason: Option<&str>,
    ) -> Result<RedemptionOutcome, Error> {
        let mut tx = self.pool.begin().await?;

        let pending = lock_redemption(&mut tx, tenant_id, redemption_id).await?;
        if expire_if_due(&mut tx, &pending).await? {
            tx.commit().await?;
            return Err(Error::InvalidStateTransition {
                status: RedemptionStatus::Expired,
                action: "reject",
            });
        }
        if pending.status != RedemptionStatus::Pending {
            return Err(Error::InvalidStateTransition {
                status: pending.status,
                action: "reject",
            });
        }
        lock_membership(&mut tx, tenant_id, pending.membership_id).await?;

        let mut delta = PointsDelta::new(
            TransactionType::Adjustment,
            pending.points_used,
            format!("Refund for rejected redemption {}", pending.redemption_code),
        );
        delta.staff_id = Some(staff_id);
        delta.reference = Some(TransactionRef::Redemption(redemption_id));
        let applied =
            LedgerService::apply_delta_in(&mut tx, tenant_id, pending.membership_id, delta).await?;

        restore_stock(&mut tx, tenant_id, pending.reward_id).await?;

        let updated = sqlx::query_as::<_, Redemption>(&format!(
            r#"
            UPDATE redemptions
            SET status = 'rejected', notes = $1
            WHERE redemption_id = $2
            RETURNING {REDEMPTION_COLUMNS}
            "#,
        ))
            .bind(reason)
            .bind(redemption_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        self.notifier.redemption_rejected(&updated, reason).await;
        if let Some((previous, current)) = &applied.tier_change {
            self.notifier
                .tier_changed(tenant_id, updated.membership_id, previous, current)
                .await;
        }

        Ok(RedemptionOutcome {
            redemption: updated,
            new_balance: applied.transaction.balance_after,
        })
    }

    /// approved -> used. The staff-side "hand over the reward" step.
    pub async fn mark_used(
        &self,
        tenant_id: Uuid,
        redemption_id: Uuid,
        staff_id: Uuid,
    ) -> Result<Redemption, Error> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let redemption = lock_redemption(&mut tx, tenant_id, redemption_id).await?;
        if expire_if_due(&mut tx, &redemption).await? {
            tx.commit().await?;
            return Err(Error::InvalidStateTransition {
                status: RedemptionStatus::Expired,
                action: "use",
            });
        }
        if redemption.status != RedemptionStatus::Approved {
            return Err(Error::InvalidStateTransition {
                status: redemption.status,
                action: "use",
            });
        }

        let updated = sqlx::query_as::<_, Redemption>(&format!(
            r#"
            UPDATE redemptions
            SET status = 'used', used_at = $1, used_by = $2
            WHERE redemption_id = $3
            RETURNING {REDEMPTION_COLUMNS}
            "#,
        ))
            .bind(now)
            .bind(staff_id)
            .bind(redemption_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(updated)
    }

    /// approved -> cancelled. No refund; the member chose to forfeit after
    /// approval.
    pub async fn cancel(&self, tenant_id: Uuid, redemption_id: Uuid) -> Result<Redemption, Error> {
        let mut tx = self.pool.begin().await?;

        let redemption = lock_redemption(&mut tx, tenant_id, redemption_id).await?;
        if expire_if_due(&mut tx, &redemption).await? {
            tx.commit().await?;
            return Err(Error::InvalidStateTransition {
                status: RedemptionStatus::Expired,
                action: "cancel",
            });
        }
        if redemption.status != RedemptionStatus::Approved {
            return Err(Error::InvalidStateTransition {
                status: redemption.status,
                action: "cancel",
            });
        }

        let updated = sqlx::query_as::<_, Redemption>(&format!(
            r#"
            UPDATE redemptions
            SET status = 'cancelled'
            WHERE redemption_id = $1
            RETURNING {REDEMPTION_COLUMNS}
            "#,
        ))
            .bind(redemption_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(updated)
    }

    pub async fn get(&self, tenant_id: Uuid, redemption_id: Uuid) -> Result<Redemption, Error> {
        self.repo()
            .get(tenant_id, redemption_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("redemption {redemption_id}")))
    }

    /// Staff lookup by the human-readable code printed on the member's screen.
    pub async fn get_by_code(&self, tenant_id: Uuid, code: &str) -> Result<Redemption, Error> {
        self.repo()
            .get_by_code(tenant_id, code)
            .await?
            .ok_or_else(|| Error::NotFound(format!("redemption code {code}")))
    }

    /// Staff lookup by scanned redemption QR.
    pub async fn get_by_qr(&self, qr_hash: &str) -> Result<Redemption, Error> {
        self.repo()
            .get_by_qr_hash(qr_hash)
            .await?
            .ok_or_else(|| Error::NotFound("redemption qr".to_string()))
    }

    pub async fn list_for_membership(
        &self,
        tenant_id: Uuid,
        membership_id: Uuid,
    ) -> Result<Vec<Redemption>, Error> {
        self.repo().list_for_membership(tenant_id, membership_id).await
    }

    pub async fn list_by_status(
        &self,
        tenant_id: Uuid,
        status: RedemptionStatus,
    ) -> Result<Vec<Redemption>, Error> {
        self.repo().list_by_status(tenant_id, status).await
    }

    fn repo(&self) -> PostgresRedemptionRepository {
        PostgresRedemptionRepository::new(self.pool.clone())
    }
}

async fn lock_reward(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    tenant_id: Uuid,
    reward_id: Uuid,
) -> Result<Reward, Error> {
    let row = sqlx::query_as::<_, Reward>(
        r#"
        SELECT reward_id, tenant_id, title_en, title_ar, description_en,
               description_ar, points_required, stock, min_tier_required,
               valid_from, valid_until, is_active, display_order,
               total_redemptions, created_at, updated_at, deleted_at
        FROM rewards
        WHERE tenant_id = $1 AND reward_id = $2 AND deleted_at IS NULL
        FOR UPDATE
        "#,
    )
        .bind(tenant_id)
        .bind(reward_id)
        .fetch_optional(&mut **tx)
        .await?;
    row.ok_or_else(|| Error::NotFound(format!("reward {reward_id}")))
}

/// Conditionally consume one unit of stock. The `stock > 0` guard is the
/// arbiter when concurrent redemptions race for the last unit.
async fn take_stock(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    reward: &Reward,
) -> Result<(), Error> {
    let result = if reward.stock.is_some() {
        sqlx::query(
            r#"
            UPDATE rewards
            SET stock = stock - 1, total_redemptions = total_redemptions + 1
            WHERE reward_id = $1 AND stock > 0
            "#,
        )
            .bind(reward.reward_id)
            .execute(&mut **tx)
            .await?
    } else {
        sqlx::query(
            r#"
            UPDATE rewards
            SET total_redemptions = total_redemptions + 1
            WHERE reward_id = $1
            "#,
        )
            .bind(reward.reward_id)
            .execute(&mut **tx)
            .await?
    };
    if result.rows_affected() == 0 {
        return Err(Error::NotEligible(vec![RedeemBlock::NotAvailable]));
    }
    Ok(())
}

async fn restore_stock(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    tenant_id: Uuid,
    reward_id: Uuid,
) -> Result<(), Error> {
    sqlx::query(
        r#"
        UPDATE rewards
        SET stock = stock + 1, total_redemptions = total_redemptions - 1
        WHERE tenant_id = $1 AND reward_id = $2 AND stock IS NOT NULL
        "#,
    )
        .bind(tenant_id)
        .bind(reward_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query(
        r#"
        UPDATE rewards
        SET total_redemptions = total_redemptions - 1
        WHERE tenant_id = $1 AND reward_id = $2 AND stock IS NULL
        "#,
    )
        .bind(tenant_id)
        .bind(reward_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn lock_redemption(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    tenant_id: Uuid,
    redemption_id: Uuid,
) -> Result<Redemption, Error> {
    let row = sqlx::query_as::<_, Redemption>(&format!(
        r#"
        SELECT {REDEMPTION_COLUMNS}
        FROM redemptions
        WHERE tenant_id = $1 AND redemption_id = $2
        FOR UPDATE
        "#,
    ))
        .bind(tenant_id)
        .bind(redemption_id)
        .fetch_optional(&mut **tx)
        .await?;
    row.ok_or_else(|| Error::NotFound(format!("redemption {redemption_id}")))
}

/// Lazy expiry: a non-terminal redemption past its deadline gets its stored
/// status flipped to expired. Returns true when the flip was written; the
/// caller commits it before refusing the transition, so the expired status
/// survives the refusal.
async fn expire_if_due(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    redemption: &Redemption,
) -> Result<bool, Error> {
    if redemption.status.is_terminal() || !redemption.is_expired(Utc::now()) {
        return Ok(false);
    }
    sqlx::query("UPDATE redemptions SET status = 'expired' WHERE redemption_id = $1")
        .bind(redemption.redemption_id)
        .execute(&mut **tx)
        .await?;
    Ok(true)
}

/// Insert under a savepoint, regenerating the code and hash on a unique
/// collision. Exhausting the attempts is a concurrency conflict, not a
/// silent failure.
async fn insert_with_retry(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    redemption: &mut Redemption,
) -> Result<(), Error> {
    for _ in 0..MAX_CODE_ATTEMPTS {
        let mut sp = tx.begin().await?;
        match insert_redemption(&mut sp, redemption).await {
            Ok(()) => {
                sp.commit().await?;
                return Ok(());
            }
            Err(e) if e.is_unique_violation() => {
                sp.rollback().await?;
                redemption.redemption_code = random_code("RDM-", 6);
                redemption.qr_code_hash = random_code("QR-RED-", 20);
            }
            Err(e) => return Err(e),
        }
    }
    Err(Error::ConcurrencyConflict(
        "could not generate a unique redemption code".to_string(),
    ))
}

async fn insert_redemption(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    r: &Redemption,
) -> Result<(), Error> {
    sqlx::query(
        r#"
        INSERT INTO redemptions (
            redemption_id, tenant_id, membership_id, reward_id, transaction_id,
            redemption_code, qr_code_hash, points_used, status, notes,
            redeemed_at, approved_at, approved_by, used_at, used_by, expires_at
        )
        VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16)
        "#,
    )
        .bind(r.redemption_id)
        .bind(r.tenant_id)
        .bind(r.membership_id)
        .bind(r.reward_id)
        .bind(r.transaction_id)
        .bind(&r.redemption_code)
        .bind(&r.qr_code_hash)
        .bind(r.points_used)
        .bind(r.status)
        .bind(&r.notes)
        .bind(r.redeemed_at)
        .bind(r.approved_at)
        .bind(r.approved_by)
        .bind(r.used_at)
        .bind(r.used_by)
        .bind(r.expires_at)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
