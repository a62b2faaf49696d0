//! QR identity resolution for the staff scan flow.
//!
//! A scanned membership QR hash resolves to the membership (and from there
//! the tenant context); a scanned redemption QR resolves to the claim being
//! verified. Hashes are opaque and carry no embedded data.

use chrono::Utc;
use sqlx::{Pool, Postgres};
use tracing::debug;

use nuqta_common::error::Error;
use nuqta_common::models::membership::CustomerMembership;
use nuqta_common::models::redemption::Redemption;
use nuqta_common::traits::repository_traits::{MembershipRepository, RedemptionRepository};

use crate::repositories::postgres::{
    PostgresMembershipRepository, PostgresRedemptionRepository,
};

pub struct QrService {
    pool: Pool<Postgres>,
}

impl QrService {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Resolve a scanned membership QR to its membership. Soft-deleted
    /// memberships do not resolve. Each successful scan bumps the visit
    /// telemetry; that write is advisory and its failure never fails the
    /// scan.
    pub async fn resolve_membership(&self, qr_hash: &str) -> Result<CustomerMembership, Error> {
        let repo = PostgresMembershipRepository::new(self.pool.clone());
        let membership = repo
            .get_by_qr_hash(qr_hash)
            .await?
            .ok_or_else(|| Error::NotFound("membership qr".to_string()))?;

        if let Err(e) = repo.touch_last_visit(membership.membership_id, Utc::now()).await {
            debug!(
                "visit touch failed for membership {}: {}",
                membership.membership_id, e
            );
        }
        Ok(membership)
    }

    /// Resolve a scanned redemption QR to the claim it identifies.
    pub async fn resolve_redemption(&self, qr_hash: &str) -> Result<Redemption, Error> {
        PostgresRedemptionRepository::new(self.pool.clone())
            .get_by_qr_hash(qr_hash)
            .await?
            .ok_or_else(|| Error::NotFound("redemption qr".to_string()))
    }
}
