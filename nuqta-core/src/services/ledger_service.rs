//! The Ledger Store: the only path by which a membership's `current_points`
//! and `lifetime_points` may change.
//!
//! Every delta runs as one atomic unit: lock the membership row, validate the
//! resulting balance, append the transaction row with its `balance_after`
//! snapshot, update the balance, and recompute the tier, all before commit.
//! Concurrent deltas against the same membership serialize on the row lock;
//! cross-membership deltas run fully in parallel.

use std::sync::Arc;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use tracing::debug;
use uuid::Uuid;

use nuqta_common::error::Error;
use nuqta_common::models::membership::CustomerMembership;
use nuqta_common::models::points_setting::PointsSetting;
use nuqta_common::models::tier::Tier;
use nuqta_common::models::transaction::{Transaction, TransactionRef, TransactionType};
use nuqta_common::traits::repository_traits::{
    Page, PointsSettingRepository, TierRepository, TransactionFilter, TransactionRepository,
};

use crate::services::notification_service::NotificationService;
use crate::services::tier_engine;
use crate::repositories::postgres::{
    PostgresPointsSettingRepository, PostgresTierRepository, PostgresTransactionRepository,
};

/// A requested balance change.
#[derive(Debug, Clone)]
pub struct PointsDelta {
    pub points: i64,
    pub kind: TransactionType,
    pub description: String,
    pub amount: Option<f64>,
    pub staff_id: Option<Uuid>,
    pub reference: Option<TransactionRef>,
}

impl PointsDelta {
    pub fn new(kind: TransactionType, points: i64, description: impl Into<String>) -> Self {
        Self {
            points,
            kind,
            description: description.into(),
            amount: None,
            staff_id: None,
            reference: None,
        }
    }
}

/// Result of a committed delta.
#[derive(Debug, Clone)]
pub struct AppliedDelta {
    pub transaction: Transaction,
    pub membership: CustomerMembership,
    /// Set when the tier recomputation changed the stored level.
    pub tier_change: Option<(Tier, Tier)>,
}

pub struct LedgerService {
    pool: Pool<Postgres>,
    notifier: Arc<NotificationService>,
}

impl LedgerService {
    pub fn new(pool: Pool<Postgres>, notifier: Arc<NotificationService>) -> Self {
        Self { pool, notifier }
    }

    /// Apply a signed points delta to a membership, atomically.
    ///
    /// Fails with `InsufficientPoints` when the resulting balance would go
    /// negative, except for `expire`/`adjustment` deltas which are clamped to
    /// a zero balance instead. The tier is recomputed inside the same
    /// transaction on *every* balance change, so manual subtractions can
    /// demote as well as promote.
    pub async fn apply_delta(
        &self,
        tenant_id: Uuid,
        membership_id: Uuid,
        delta: PointsDelta,
    ) -> Result<AppliedDelta, Error> {
        let mut tx = self.pool.begin().await?;
        let applied = Self::apply_delta_in(&mut tx, tenant_id, membership_id, delta).await?;
        tx.commit().await?;

        self.dispatch(&applied).await;
        Ok(applied)
    }

    /// The in-transaction body of `apply_delta`, shared with the redemption
    /// state machine so a debit and its redemption row commit together.
    pub(crate) async fn apply_delta_in(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        tenant_id: Uuid,
        membership_id: Uuid,
        delta: PointsDelta,
    ) -> Result<AppliedDelta, Error> {
        let now = Utc::now();

        let mut membership = lock_membership(tx, tenant_id, membership_id).await?;

        let mut points = delta.points;
        let mut new_balance = membership.current_points + points;
        if new_balance < 0 {
            if delta.kind.clamps_to_zero() {
                // Expire/adjustment debits never take the balance negative;
                // the recorded delta shrinks to whatever was left.
                points = -membership.current_points;
                new_balance = 0;
            } else {
                return Err(Error::InsufficientPoints {
                    required: -delta.points,
                    available: membership.current_points,
                });
            }
        }

        membership.current_points = new_balance;
        if points > 0 {
            membership.lifetime_points += points;
        }
        if delta.kind == TransactionType::Earn {
            membership.total_visits += 1;
            if let Some(amount) = delta.amount {
                membership.total_spent += amount;
            }
        }

        // Tier recomputation happens on every balance change, inside the
        // same lock scope as the balance update.
        let tiers = load_active_tiers(tx, tenant_id).await?;
        let previous_level = membership.tier_level;
        let mut tier_change = None;
        if let Some(resolved) = tier_engine::resolve_tier(&tiers, new_balance) {
            if resolved.level != previous_level {
                let previous = tiers
                    .iter()
                    .find(|t| t.level == previous_level)
                    .cloned()
                    .unwrap_or_else(|| resolved.clone());
                membership.tier_level = resolved.level;
                membership.tier_upgraded_at = Some(now);
                tier_change = Some((previous, resolved.clone()));
            }
        }

        sqlx::query(
            r#"
            UPDATE customer_memberships
            SET current_points = $1,
                lifetime_points = $2,
                total_visits = $3,
                total_spent = $4,
                tier_level = $5,
                tier_upgraded_at = $6
            WHERE membership_id = $7
            "#,
        )
            .bind(membership.current_points)
            .bind(membership.lifetime_points)
            .bind(membership.total_visits)
            .bind(membership.total_spent)
            .bind(membership.tier_level)
            .bind(membership.tier_upgraded_at)
            .bind(membership.membership_id)
            .execute(&mut **tx)
            .await?;

        let transaction = Transaction {
            transaction_id: Uuid::new_v4(),
            tenant_id,
            membership_id,
            tx_type: delta.kind,
            points,
            amount: delta.amount,
            description: delta.description,
            reference: delta.reference,
            staff_id: delta.staff_id,
            balance_after: new_balance,
            created_at: now,
        };
        insert_transaction(tx, &transaction).await?;

        debug!(
            "ledger: {} {} points on membership {} -> balance {}",
            transaction.tx_type, transaction.points, membership_id, new_balance
        );

        Ok(AppliedDelta { transaction, membership, tier_change })
    }

    /// Post-commit notifications. Best-effort, never fails the caller.
    async fn dispatch(&self, applied: &AppliedDelta) {
        if let Some((previous, current)) = &applied.tier_change {
            self.notifier
                .tier_changed(
                    applied.membership.tenant_id,
                    applied.membership.membership_id,
                    previous,
                    current,
                )
                .await;
        }
        if applied.transaction.tx_type == TransactionType::Earn && applied.transaction.points > 0 {
            self.notifier
                .points_earned(
                    applied.membership.tenant_id,
                    applied.membership.membership_id,
                    applied.transaction.points,
                    applied.transaction.balance_after,
                )
                .await;
        }
    }

    /// Earn flow for a purchase: currency amount -> points through the
    /// tenant's ratio, then the member's tier multiplier.
    pub async fn record_purchase(
        &self,
        tenant_id: Uuid,
        membership_id: Uuid,
        amount: f64,
        staff_id: Option<Uuid>,
    ) -> Result<AppliedDelta, Error> {
        let settings = self.settings_for(tenant_id).await?;
        let base_points = settings.calculate_points(amount);

        let tiers = PostgresTierRepository::new(self.pool.clone())
            .list_active(tenant_id)
            .await?;
        let membership = self
            .balance_row(tenant_id, membership_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("membership {membership_id}")))?;
        let points = tiers
            .iter()
            .find(|t| t.level == membership.tier_level)
            .map(|t| t.apply_multiplier(base_points))
            .unwrap_or(base_points);

        let mut delta = PointsDelta::new(
            TransactionType::Earn,
            points,
            format!("Purchase of {:.2}", amount),
        );
        delta.amount = Some(amount);
        delta.staff_id = staff_id;
        self.apply_delta(tenant_id, membership_id, delta).await
    }

    /// Staff-initiated manual correction.
    pub async fn manual_adjust(
        &self,
        tenant_id: Uuid,
        membership_id: Uuid,
        points: i64,
        staff_id: Uuid,
        description: impl Into<String>,
    ) -> Result<AppliedDelta, Error> {
        let kind = if points >= 0 {
            TransactionType::ManualAdd
        } else {
            TransactionType::ManualSubtract
        };
        let mut delta = PointsDelta::new(kind, points, description);
        delta.staff_id = Some(staff_id);
        self.apply_delta(tenant_id, membership_id, delta).await
    }

    pub async fn balance(
        &self,
        tenant_id: Uuid,
        membership_id: Uuid,
    ) -> Result<(i64, i64), Error> {
        let membership = self
            .balance_row(tenant_id, membership_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("membership {membership_id}")))?;
        Ok((membership.current_points, membership.lifetime_points))
    }

    pub async fn history(
        &self,
        tenant_id: Uuid,
        membership_id: Uuid,
        filter: &TransactionFilter,
        page: i64,
        per_page: i64,
    ) -> Result<Page<Transaction>, Error> {
        PostgresTransactionRepository::new(self.pool.clone())
            .history(tenant_id, membership_id, filter, page, per_page)
            .await
    }

    /// Audit check: does the stored balance equal the ledger sum?
    pub async fn verify(&self, tenant_id: Uuid, membership_id: Uuid) -> Result<bool, Error> {
        let (current, _) = self.balance(tenant_id, membership_id).await?;
        let sum = PostgresTransactionRepository::new(self.pool.clone())
            .sum_points(membership_id)
            .await?;
        Ok(current == sum)
    }

    pub async fn settings_for(&self, tenant_id: Uuid) -> Result<PointsSetting, Error> {
        let found = PostgresPointsSettingRepository::new(self.pool.clone())
            .get_for_tenant(tenant_id)
            .await?;
        Ok(found.unwrap_or_else(|| PointsSetting::defaults_for(tenant_id)))
    }

    async fn balance_row(
        &self,
        tenant_id: Uuid,
        membership_id: Uuid,
    ) -> Result<Option<CustomerMembership>, Error> {
        let row = sqlx::query_as::<_, CustomerMembership>(
            r#"
            SELECT membership_id, customer_id, tenant_id,
                   current_points, lifetime_points, total_visits, total_spent,
                   tier_level, tier_upgraded_at, qr_code_hash,
                   joined_at, last_visit_at, deleted_at
            FROM customer_memberships
            WHERE tenant_id = $1 AND membership_id = $2 AND deleted_at IS NULL
            "#,
        )
            .bind(tenant_id)
            .bind(membership_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

/// Row-lock the membership inside the caller's transaction.
pub(crate) async fn lock_membership(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    tenant_id: Uuid,
    membership_id: Uuid,
) -> Result<CustomerMembership, Error> {
    let row = sqlx::query_as::<_, CustomerMembership>(
        r#"
        SELECT membership_id, customer_id, tenant_id,
               current_points, lifetime_points, total_visits, total_spent,
               tier_level, tier_upgraded_at, qr_code_hash,
               joined_at, last_visit_at, deleted_at
        FROM customer_memberships
        WHERE tenant_id = $1 AND membership_id = $2 AND deleted_at IS NULL
        FOR UPDATE
        "#,
    )
        .bind(tenant_id)
        .bind(membership_id)
        .fetch_optional(&mut **tx)
        .await?;
    row.ok_or_else(|| Error::NotFound(format!("membership {membership_id}")))
}

async fn load_active_tiers(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    tenant_id: Uuid,
) -> Result<Vec<Tier>, Error> {
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
        .fetch_all(&mut **tx)
        .await?;
    Ok(rows)
}

async fn insert_transaction(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    t: &Transaction,
) -> Result<(), Error> {
    sqlx::query(
        r#"
        INSERT INTO transactions (
            transaction_id, tenant_id, membership_id, tx_type, points,
            amount, description, reference_kind, reference_id,
            staff_id, balance_after, created_at
        )
        VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
        "#,
    )
        .bind(t.transaction_id)
        .bind(t.tenant_id)
        .bind(t.membership_id)
        .bind(t.tx_type)
        .bind(t.points)
        .bind(t.amount)
        .bind(&t.description)
        .bind(t.reference.map(|r| r.kind()))
        .bind(t.reference.map(|r| r.id()))
        .bind(t.staff_id)
        .bind(t.balance_after)
        .bind(t.created_at)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
