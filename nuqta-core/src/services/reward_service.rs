//! Reward catalog views with per-member eligibility.

use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use nuqta_common::error::Error;
use nuqta_common::models::reward::{RedeemBlock, Reward};
use nuqta_common::traits::repository_traits::{MembershipRepository, RewardRepository};

use crate::repositories::postgres::{PostgresMembershipRepository, PostgresRewardRepository};

/// A catalog entry annotated with one member's eligibility.
#[derive(Debug, Clone)]
pub struct RewardAvailability {
    pub reward: Reward,
    pub can_redeem: bool,
    /// Every reason the member cannot redeem; empty when `can_redeem`.
    pub blocks: Vec<RedeemBlock>,
    /// Points the member is short by; 0 when affordable.
    pub points_needed: i64,
}

pub struct RewardService {
    pool: Pool<Postgres>,
}

impl RewardService {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn get(&self, tenant_id: Uuid, reward_id: Uuid) -> Result<Reward, Error> {
        self.repo()
            .get(tenant_id, reward_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("reward {reward_id}")))
    }

    /// Currently-available catalog, without member context.
    pub async fn list_available(&self, tenant_id: Uuid) -> Result<Vec<Reward>, Error> {
        self.repo().list_available(tenant_id, Utc::now()).await
    }

    /// The catalog a specific member sees: every available reward, each
    /// annotated with whether and why-not this member can redeem it. The
    /// eligibility here is advisory; redemption creation re-validates under
    /// row locks.
    pub async fn list_for_membership(
        &self,
        tenant_id: Uuid,
        membership_id: Uuid,
    ) -> Result<Vec<RewardAvailability>, Error> {
        let now = Utc::now();
        let membership = PostgresMembershipRepository::new(self.pool.clone())
            .get(tenant_id, membership_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("membership {membership_id}")))?;

        let rewards = self.repo().list_available(tenant_id, now).await?;
        Ok(rewards
            .into_iter()
            .map(|reward| {
                let blocks = reward.redeem_blocks(&membership, now);
                RewardAvailability {
                    can_redeem: blocks.is_empty(),
                    points_needed: reward.points_needed(&membership),
                    blocks,
                    reward,
                }
            })
            .collect())
    }

    fn repo(&self) -> PostgresRewardRepository {
        PostgresRewardRepository::new(self.pool.clone())
    }
}
