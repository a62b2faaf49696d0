use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
use crate::models::customer::GlobalCustomer;
use crate::models::membership::CustomerMembership;
use crate::models::notification::Notification;
use crate::models::points_setting::PointsSetting;
use crate::models::redemption::{Redemption, RedemptionStatus};
use crate::models::reward::Reward;
use crate::models::staff::Staff;
use crate::models::tenant::Tenant;
use crate::models::tier::Tier;
use crate::models::transaction::{Transaction, TransactionType};

/// One page of results from a paginated query.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> i64 {
        if self.per_page <= 0 {
            return 0;
        }
        (self.total + self.per_page - 1) / self.per_page
    }
}

/// Filters for ledger history queries.
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub tx_type: Option<TransactionType>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait TenantRepository: Send + Sync {
    async fn create(&self, tenant: &Tenant) -> Result<(), Error>;
    async fn get(&self, tenant_id: Uuid) -> Result<Option<Tenant>, Error>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tenant>, Error>;
}

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    async fn create(&self, customer: &GlobalCustomer) -> Result<(), Error>;
    async fn get(&self, customer_id: Uuid) -> Result<Option<GlobalCustomer>, Error>;
    async fn get_by_phone(&self, phone: &str) -> Result<Option<GlobalCustomer>, Error>;
}

#[async_trait]
pub trait MembershipRepository: Send + Sync {
    async fn create(&self, membership: &CustomerMembership) -> Result<(), Error>;
    async fn get(&self, tenant_id: Uuid, membership_id: Uuid)
        -> Result<Option<CustomerMembership>, Error>;
    async fn get_for_customer(
        &self,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Option<CustomerMembership>, Error>;
    async fn get_by_qr_hash(&self, qr_hash: &str) -> Result<Option<CustomerMembership>, Error>;
    async fn list_for_customer(&self, customer_id: Uuid)
        -> Result<Vec<CustomerMembership>, Error>;
    async fn count_for_tenant(&self, tenant_id: Uuid) -> Result<i64, Error>;
    /// Advisory telemetry; last-write-wins, not part of any ledger unit.
    async fn touch_last_visit(&self, membership_id: Uuid, at: DateTime<Utc>) -> Result<(), Error>;
    async fn soft_delete(&self, tenant_id: Uuid, membership_id: Uuid) -> Result<(), Error>;
}

#[async_trait]
pub trait TransactionRepository: Send + Sync {
    async fn get(&self, tenant_id: Uuid, transaction_id: Uuid)
        -> Result<Option<Transaction>, Error>;
    async fn history(
        &self,
        tenant_id: Uuid,
        membership_id: Uuid,
        filter: &TransactionFilter,
        page: i64,
        per_page: i64,
    ) -> Result<Page<Transaction>, Error>;
    /// Audit helper: running sum of all ledger deltas for a membership.
    /// Must always equal the membership's `current_points`.
    async fn sum_points(&self, membership_id: Uuid) -> Result<i64, Error>;
}

#[async_trait]
pub trait TierRepository: Send + Sync {
    async fn create(&self, tier: &Tier) -> Result<(), Error>;
    async fn list_active(&self, tenant_id: Uuid) -> Result<Vec<Tier>, Error>;
}

#[async_trait]
pub trait RewardRepository: Send + Sync {
    async fn create(&self, reward: &Reward) -> Result<(), Error>;
    async fn get(&self, tenant_id: Uuid, reward_id: Uuid) -> Result<Option<Reward>, Error>;
    async fn list_available(&self, tenant_id: Uuid, now: DateTime<Utc>)
        -> Result<Vec<Reward>, Error>;
}

#[async_trait]
pub trait RedemptionRepository: Send + Sync {
    async fn get(&self, tenant_id: Uuid, redemption_id: Uuid)
        -> Result<Option<Redemption>, Error>;
    async fn get_by_code(&self, tenant_id: Uuid, code: &str)
        -> Result<Option<Redemption>, Error>;
    async fn get_by_qr_hash(&self, qr_hash: &str) -> Result<Option<Redemption>, Error>;
    async fn list_for_membership(
        &self,
        tenant_id: Uuid,
        membership_id: Uuid,
    ) -> Result<Vec<Redemption>, Error>;
    async fn list_by_status(
        &self,
        tenant_id: Uuid,
        status: RedemptionStatus,
    ) -> Result<Vec<Redemption>, Error>;
}

#[async_trait]
pub trait PointsSettingRepository: Send + Sync {
    async fn get_for_tenant(&self, tenant_id: Uuid) -> Result<Option<PointsSetting>, Error>;
    async fn upsert(&self, setting: &PointsSetting) -> Result<(), Error>;
}

#[async_trait]
pub trait StaffRepository: Send + Sync {
    async fn create(&self, staff: &Staff) -> Result<(), Error>;
    async fn get(&self, tenant_id: Uuid, staff_id: Uuid) -> Result<Option<Staff>, Error>;
    async fn count_for_tenant(&self, tenant_id: Uuid) -> Result<i64, Error>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: &Notification) -> Result<(), Error>;
    async fn list_unread_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<Notification>, Error>;
    async fn mark_read(&self, notification_id: Uuid) -> Result<(), Error>;
}
