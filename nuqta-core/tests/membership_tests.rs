// tests/membership_tests.rs
//
// Database-backed membership, summary and QR suite. Requires a live
// Postgres; set TEST_DATABASE_URL and run with `cargo test -- --ignored`.

mod common;

use nuqta_common::models::reward::RedeemBlock;
use nuqta_common::models::tier::TierLevel;
use nuqta_common::models::transaction::TransactionType;
use nuqta_core::Error;
use nuqta_core::services::PointsDelta;

use common::*;

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn join_grants_welcome_bonus_through_the_ledger() -> Result<(), Error> {
    let env = setup().await?;
    let tenant_id = seed_tenant(&env, 1.0, 50).await?;
    let customer_id = seed_customer(&env).await?;

    let m = env.memberships.join(tenant_id, customer_id).await?;
    assert_eq!(m.current_points, 50);
    assert_eq!(m.lifetime_points, 50);
    assert_eq!(m.tier_level, TierLevel::Bronze);
    assert!(m.qr_code_hash.starts_with("QR-"));

    // The bonus is a real ledger entry, not a raw balance write.
    assert!(env.ledger.verify(tenant_id, m.membership_id).await?);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn joining_twice_is_a_duplicate() -> Result<(), Error> {
    let env = setup().await?;
    let tenant_id = seed_tenant(&env, 1.0, 0).await?;
    let customer_id = seed_customer(&env).await?;

    env.memberships.join(tenant_id, customer_id).await?;
    let err = env.memberships.join(tenant_id, customer_id).await.unwrap_err();
    assert!(matches!(err, Error::DuplicateMembership));

    Ok(())
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn capacity_cap_blocks_joins() -> Result<(), Error> {
    let env = setup().await?;
    let tenant_id = seed_tenant_with_capacity(&env, 1.0, 0, Some(2)).await?;

    for _ in 0..2 {
        let customer_id = seed_customer(&env).await?;
        env.memberships.join(tenant_id, customer_id).await?;
    }

    let customer_id = seed_customer(&env).await?;
    let err = env.memberships.join(tenant_id, customer_id).await.unwrap_err();
    assert!(matches!(err, Error::CapacityExceeded(_)));

    Ok(())
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn one_customer_many_tenants() -> Result<(), Error> {
    let env = setup().await?;
    let tenant_a = seed_tenant(&env, 1.0, 0).await?;
    let tenant_b = seed_tenant(&env, 1.0, 0).await?;
    let customer_id = seed_customer(&env).await?;

    env.memberships.join(tenant_a, customer_id).await?;
    env.memberships.join(tenant_b, customer_id).await?;

    let memberships = env.memberships.list_for_customer(customer_id).await?;
    assert_eq!(memberships.len(), 2);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn summary_reports_tier_progress() -> Result<(), Error> {
    let env = setup().await?;
    let tenant_id = seed_tenant(&env, 2.0, 0).await?;
    let customer_id = seed_customer(&env).await?;
    let m = env.memberships.join(tenant_id, customer_id).await?;

    env.ledger
        .apply_delta(
            tenant_id,
            m.membership_id,
            PointsDelta::new(TransactionType::Bonus, 1250, "seed"),
        )
        .await?;

    let summary = env.memberships.points_summary(tenant_id, m.membership_id).await?;
    assert_eq!(summary.membership.current_points, 1250);
    assert_eq!(summary.tier.as_ref().map(|t| t.level), Some(TierLevel::Silver));
    assert_eq!(summary.next_tier.as_ref().map(|t| t.level), Some(TierLevel::Gold));
    assert_eq!(summary.points_to_next_tier, 750);
    // 750 into the 500..2000 band.
    assert!((summary.progress_percent - 50.0).abs() < 0.01);
    // 1250 points at 2 points per currency unit.
    assert_eq!(summary.points_value, 625.0);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn qr_scan_resolves_and_touches_visit() -> Result<(), Error> {
    let env = setup().await?;
    let tenant_id = seed_tenant(&env, 1.0, 0).await?;
    let customer_id = seed_customer(&env).await?;
    let m = env.memberships.join(tenant_id, customer_id).await?;

    let resolved = env.qr.resolve_membership(&m.qr_code_hash).await?;
    assert_eq!(resolved.membership_id, m.membership_id);
    assert_eq!(resolved.tenant_id, tenant_id);

    // The scan only stamps the visit time; the visit itself is counted by
    // the purchase, so scan-then-buy is one visit, not two.
    let after = env.memberships.get(tenant_id, m.membership_id).await?;
    assert!(after.last_visit_at.is_some());
    assert_eq!(after.total_visits, 0);

    env.ledger
        .record_purchase(tenant_id, m.membership_id, 10.0, None)
        .await?;
    let after = env.memberships.get(tenant_id, m.membership_id).await?;
    assert_eq!(after.total_visits, 1);

    let err = env.qr.resolve_membership("QR-DOESNOTEXIST").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    Ok(())
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn soft_deleted_membership_stops_resolving() -> Result<(), Error> {
    let env = setup().await?;
    let tenant_id = seed_tenant(&env, 1.0, 0).await?;
    let customer_id = seed_customer(&env).await?;
    let m = env.memberships.join(tenant_id, customer_id).await?;

    env.memberships.leave(tenant_id, m.membership_id).await?;

    let err = env.qr.resolve_membership(&m.qr_code_hash).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
    let err = env.memberships.get(tenant_id, m.membership_id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    // The ledger history survives the soft delete.
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM customer_memberships WHERE membership_id = $1",
    )
    .bind(m.membership_id)
    .fetch_one(env.db.pool())
    .await?;
    assert_eq!(count, 1);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn catalog_annotates_eligibility_per_member() -> Result<(), Error> {
    let env = setup().await?;
    let tenant_id = seed_tenant(&env, 1.0, 0).await?;
    let customer_id = seed_customer(&env).await?;
    let m = env.memberships.join(tenant_id, customer_id).await?;

    env.ledger
        .apply_delta(
            tenant_id,
            m.membership_id,
            PointsDelta::new(TransactionType::Bonus, 600, "seed"),
        )
        .await?;

    let affordable = seed_reward(&env, tenant_id, 500, None, None).await?;
    let expensive = seed_reward(&env, tenant_id, 1000, None, None).await?;
    let gold_only = seed_reward(&env, tenant_id, 100, None, Some(TierLevel::Gold)).await?;

    let catalog = env
        .rewards
        .list_for_membership(tenant_id, m.membership_id)
        .await?;
    assert_eq!(catalog.len(), 3);

    let find = |id| catalog.iter().find(|a| a.reward.reward_id == id).unwrap();

    let a = find(affordable);
    assert!(a.can_redeem);
    assert!(a.blocks.is_empty());
    assert_eq!(a.points_needed, 0);

    let e = find(expensive);
    assert!(!e.can_redeem);
    assert_eq!(e.blocks, vec![RedeemBlock::InsufficientPoints]);
    assert_eq!(e.points_needed, 400);

    let g = find(gold_only);
    assert!(!g.can_redeem);
    assert_eq!(g.blocks, vec![RedeemBlock::TierTooLow]);

    Ok(())
}
