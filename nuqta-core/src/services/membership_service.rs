//! Membership lifecycle: joining a tenant's program, the member-facing
//! points summary, and soft deletion.

use std::sync::Arc;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use tracing::info;
use uuid::Uuid;

use nuqta_common::error::Error;
use nuqta_common::models::membership::CustomerMembership;
use nuqta_common::models::tier::{Tier, TierLevel};
use nuqta_common::models::transaction::TransactionType;
use nuqta_common::traits::repository_traits::{
    MembershipRepository, TenantRepository, TierRepository,
};

use crate::repositories::postgres::{
    PostgresMembershipRepository, PostgresTenantRepository, PostgresTierRepository,
};
use crate::services::codes::random_code;
use crate::services::ledger_service::{LedgerService, PointsDelta};
use crate::services::notification_service::NotificationService;
use crate::services::tier_engine;

const MAX_QR_ATTEMPTS: u32 = 5;

/// Everything the member-facing points screen needs in one struct.
#[derive(Debug, Clone)]
pub struct PointsSummary {
    pub membership: CustomerMembership,
    pub tier: Option<Tier>,
    pub next_tier: Option<Tier>,
    pub points_to_next_tier: i64,
    pub progress_percent: f64,
    /// Currency value of the current balance under the tenant's ratio.
    pub points_value: f64,
}

pub struct MembershipService {
    pool: Pool<Postgres>,
    ledger: Arc<LedgerService>,
    notifier: Arc<NotificationService>,
}

impl MembershipService {
    pub fn new(
        pool: Pool<Postgres>,
        ledger: Arc<LedgerService>,
        notifier: Arc<NotificationService>,
    ) -> Self {
        Self { pool, ledger, notifier }
    }

    /// Enroll a customer in a tenant's program.
    ///
    /// One membership per (customer, tenant) pair; the database unique
    /// constraint is the final arbiter when two joins race. The welcome
    /// bonus, when configured, lands as the membership's first ledger entry.
    pub async fn join(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<CustomerMembership, Error> {
        let tenant = PostgresTenantRepository::new(self.pool.clone())
            .get(tenant_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("tenant {tenant_id}")))?;

        let memberships = self.repo();
        if memberships
            .get_for_customer(tenant_id, customer_id)
            .await?
            .is_some()
        {
            return Err(Error::DuplicateMembership);
        }

        if let Some(max) = tenant.max_customers {
            let count = memberships.count_for_tenant(tenant_id).await?;
            if count >= max {
                return Err(Error::CapacityExceeded(format!(
                    "tenant {} is at its {} customer limit",
                    tenant.business_slug, max
                )));
            }
        }

        let tiers = PostgresTierRepository::new(self.pool.clone())
            .list_active(tenant_id)
            .await?;
        let base_tier = tier_engine::resolve_tier(&tiers, 0)
            .map(|t| t.level)
            .unwrap_or(TierLevel::Bronze);

        let now = Utc::now();
        let mut membership = CustomerMembership {
            membership_id: Uuid::new_v4(),
            customer_id,
            tenant_id,
            current_points: 0,
            lifetime_points: 0,
            total_visits: 0,
            total_spent: 0.0,
            tier_level: base_tier,
            tier_upgraded_at: None,
            qr_code_hash: random_code("QR-", 20),
            joined_at: now,
            last_visit_at: None,
            deleted_at: None,
        };
        self.create_with_retry(&mut membership).await?;

        info!(
            "customer {} joined tenant {} as membership {}",
            customer_id, tenant.business_slug, membership.membership_id
        );

        let settings = self.ledger.settings_for(tenant_id).await?;
        if settings.welcome_bonus_points > 0 {
            let applied = self
                .ledger
                .apply_delta(
                    tenant_id,
                    membership.membership_id,
                    PointsDelta::new(
                        TransactionType::Bonus,
                        settings.welcome_bonus_points,
                        "Welcome bonus",
                    ),
                )
                .await?;
            membership = applied.membership;
            self.notifier
                .welcome_bonus(
                    tenant_id,
                    membership.membership_id,
                    customer_id,
                    settings.welcome_bonus_points,
                )
                .await;
        }

        Ok(membership)
    }

    /// Member-facing summary: balance, tier position and progress.
    pub async fn points_summary(
        &self,
        tenant_id: Uuid,
        membership_id: Uuid,
    ) -> Result<PointsSummary, Error> {
        let membership = self
            .repo()
            .get(tenant_id, membership_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("membership {membership_id}")))?;

        let tiers = PostgresTierRepository::new(self.pool.clone())
            .list_active(tenant_id)
            .await?;
        let points = membership.current_points;
        let settings = self.ledger.settings_for(tenant_id).await?;

        Ok(PointsSummary {
            tier: tier_engine::resolve_tier(&tiers, points).cloned(),
            next_tier: tier_engine::next_tier(&tiers, points).cloned(),
            points_to_next_tier: tier_engine::points_to_next(&tiers, points),
            progress_percent: tier_engine::progress_percent(&tiers, points),
            points_value: settings.calculate_currency(points),
            membership,
        })
    }

    pub async fn get(
        &self,
        tenant_id: Uuid,
        membership_id: Uuid,
    ) -> Result<CustomerMembership, Error> {
        self.repo()
            .get(tenant_id, membership_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("membership {membership_id}")))
    }

    /// All programs the customer belongs to, across tenants.
    pub async fn list_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<CustomerMembership>, Error> {
        self.repo().list_for_customer(customer_id).await
    }

    /// Soft delete. The ledger history stays; the membership stops resolving.
    pub async fn leave(&self, tenant_id: Uuid, membership_id: Uuid) -> Result<(), Error> {
        self.repo().soft_delete(tenant_id, membership_id).await
    }

    /// Insert, regenerating the QR hash on collision. A duplicate on the
    /// (customer, tenant) pair is a racing join, not a QR collision.
    async fn create_with_retry(&self, membership: &mut CustomerMembership) -> Result<(), Error> {
        for _ in 0..MAX_QR_ATTEMPTS {
            match self.repo().create(membership).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_unique_violation() => {
                    let exists = self
                        .repo()
                        .get_for_customer(membership.tenant_id, membership.customer_id)
                        .await?;
                    if exists.is_some() {
                        return Err(Error::DuplicateMembership);
                    }
                    membership.qr_code_hash = random_code("QR-", 20);
                }
                Err(e) => return Err(e),
            }
        }
        Err(Error::ConcurrencyConflict(
            "could not generate a unique membership QR hash".to_string(),
        ))
    }

    fn repo(&self) -> PostgresMembershipRepository {
        PostgresMembershipRepository::new(self.pool.clone())
    }
}
