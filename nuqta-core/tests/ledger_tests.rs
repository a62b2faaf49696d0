// tests/ledger_tests.rs
//
// Database-backed ledger suite. Requires a live Postgres; set
// TEST_DATABASE_URL and run with `cargo test -- --ignored`.

mod common;

use uuid::Uuid;

use nuqta_common::models::tier::TierLevel;
use nuqta_common::models::transaction::TransactionType;
use nuqta_common::traits::repository_traits::TransactionFilter;
use nuqta_core::Error;
use nuqta_core::services::PointsDelta;

use common::*;

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn purchase_earns_with_ratio_and_multiplier() -> Result<(), Error> {
    let env = setup().await?;
    let tenant_id = seed_tenant(&env, 2.0, 0).await?;
    let customer_id = seed_customer(&env).await?;
    let m = env.memberships.join(tenant_id, customer_id).await?;

    // Bronze multiplier is 1.0: 50.0 * 2.0 = 100 points.
    let applied = env
        .ledger
        .record_purchase(tenant_id, m.membership_id, 50.0, None)
        .await?;
    assert_eq!(applied.transaction.points, 100);
    assert_eq!(applied.transaction.balance_after, 100);
    assert_eq!(applied.membership.current_points, 100);
    assert_eq!(applied.membership.lifetime_points, 100);
    assert_eq!(applied.membership.total_visits, 1);
    assert_eq!(applied.membership.total_spent, 50.0);

    // Push to silver, then earn again: silver multiplier 1.2 applies.
    env.ledger
        .apply_delta(
            tenant_id,
            m.membership_id,
            PointsDelta::new(TransactionType::Bonus, 400, "test bonus"),
        )
        .await?;
    let applied = env
        .ledger
        .record_purchase(tenant_id, m.membership_id, 50.0, None)
        .await?;
    assert_eq!(applied.transaction.points, 120);
    assert_eq!(applied.membership.tier_level, TierLevel::Silver);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn tier_upgrade_happens_inside_the_delta() -> Result<(), Error> {
    let env = setup().await?;
    let tenant_id = seed_tenant(&env, 1.0, 0).await?;
    let customer_id = seed_customer(&env).await?;
    let m = env.memberships.join(tenant_id, customer_id).await?;

    let applied = env
        .ledger
        .apply_delta(
            tenant_id,
            m.membership_id,
            PointsDelta::new(TransactionType::Bonus, 500, "to silver"),
        )
        .await?;
    assert_eq!(applied.membership.tier_level, TierLevel::Silver);
    let (previous, current) = applied.tier_change.expect("tier should have changed");
    assert_eq!(previous.level, TierLevel::Bronze);
    assert_eq!(current.level, TierLevel::Silver);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn manual_subtract_can_demote() -> Result<(), Error> {
    let env = setup().await?;
    let tenant_id = seed_tenant(&env, 1.0, 0).await?;
    let customer_id = seed_customer(&env).await?;
    let staff_id = seed_staff(&env, tenant_id).await?;
    let m = env.memberships.join(tenant_id, customer_id).await?;

    env.ledger
        .apply_delta(
            tenant_id,
            m.membership_id,
            PointsDelta::new(TransactionType::Bonus, 2500, "to gold"),
        )
        .await?;

    let applied = env
        .ledger
        .manual_adjust(tenant_id, m.membership_id, -2100, staff_id, "correction")
        .await?;
    assert_eq!(applied.membership.current_points, 400);
    assert_eq!(applied.membership.tier_level, TierLevel::Bronze);
    // Lifetime is earn-only; the subtraction does not touch it.
    assert_eq!(applied.membership.lifetime_points, 2500);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn overdraw_is_rejected_and_writes_nothing() -> Result<(), Error> {
    let env = setup().await?;
    let tenant_id = seed_tenant(&env, 1.0, 0).await?;
    let customer_id = seed_customer(&env).await?;
    let staff_id = seed_staff(&env, tenant_id).await?;
    let m = env.memberships.join(tenant_id, customer_id).await?;

    env.ledger
        .apply_delta(
            tenant_id,
            m.membership_id,
            PointsDelta::new(TransactionType::Bonus, 100, "seed"),
        )
        .await?;

    let err = env
        .ledger
        .manual_adjust(tenant_id, m.membership_id, -150, staff_id, "too much")
        .await
        .unwrap_err();
    match err {
        Error::InsufficientPoints { required, available } => {
            assert_eq!(required, 150);
            assert_eq!(available, 100);
        }
        other => panic!("expected InsufficientPoints, got {other}"),
    }

    let (balance, _) = env.ledger.balance(tenant_id, m.membership_id).await?;
    assert_eq!(balance, 100);
    assert!(env.ledger.verify(tenant_id, m.membership_id).await?);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn expire_clamps_to_zero() -> Result<(), Error> {
    let env = setup().await?;
    let tenant_id = seed_tenant(&env, 1.0, 0).await?;
    let customer_id = seed_customer(&env).await?;
    let m = env.memberships.join(tenant_id, customer_id).await?;

    env.ledger
        .apply_delta(
            tenant_id,
            m.membership_id,
            PointsDelta::new(TransactionType::Bonus, 80, "seed"),
        )
        .await?;

    // Asking to expire more than the balance clamps the recorded delta.
    let applied = env
        .ledger
        .apply_delta(
            tenant_id,
            m.membership_id,
            PointsDelta::new(TransactionType::Expire, -200, "expiry"),
        )
        .await?;
    assert_eq!(applied.transaction.points, -80);
    assert_eq!(applied.membership.current_points, 0);
    assert!(env.ledger.verify(tenant_id, m.membership_id).await?);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn balance_always_equals_ledger_sum() -> Result<(), Error> {
    let env = setup().await?;
    let tenant_id = seed_tenant(&env, 1.5, 25).await?;
    let customer_id = seed_customer(&env).await?;
    let staff_id = seed_staff(&env, tenant_id).await?;
    let m = env.memberships.join(tenant_id, customer_id).await?;

    env.ledger
        .record_purchase(tenant_id, m.membership_id, 33.4, Some(staff_id))
        .await?;
    env.ledger
        .manual_adjust(tenant_id, m.membership_id, -10, staff_id, "test")
        .await?;
    env.ledger
        .apply_delta(
            tenant_id,
            m.membership_id,
            PointsDelta::new(TransactionType::Referral, 40, "referral"),
        )
        .await?;

    assert!(env.ledger.verify(tenant_id, m.membership_id).await?);

    // Every ledger row carries the balance it left behind.
    let page = env
        .ledger
        .history(
            tenant_id,
            m.membership_id,
            &TransactionFilter::default(),
            1,
            50,
        )
        .await?;
    assert_eq!(page.total, 4); // welcome bonus + three deltas
    let newest = &page.items[0];
    let (balance, _) = env.ledger.balance(tenant_id, m.membership_id).await?;
    assert_eq!(newest.balance_after, balance);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn history_filters_by_type() -> Result<(), Error> {
    let env = setup().await?;
    let tenant_id = seed_tenant(&env, 1.0, 0).await?;
    let customer_id = seed_customer(&env).await?;
    let staff_id = seed_staff(&env, tenant_id).await?;
    let m = env.memberships.join(tenant_id, customer_id).await?;

    env.ledger
        .record_purchase(tenant_id, m.membership_id, 10.0, None)
        .await?;
    env.ledger
        .record_purchase(tenant_id, m.membership_id, 20.0, None)
        .await?;
    env.ledger
        .manual_adjust(tenant_id, m.membership_id, 5, staff_id, "bump")
        .await?;

    let filter = TransactionFilter {
        tx_type: Some(TransactionType::Earn),
        ..Default::default()
    };
    let page = env
        .ledger
        .history(tenant_id, m.membership_id, &filter, 1, 50)
        .await?;
    assert_eq!(page.total, 2);
    assert!(page.items.iter().all(|t| t.tx_type == TransactionType::Earn));

    Ok(())
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn deltas_are_tenant_scoped() -> Result<(), Error> {
    let env = setup().await?;
    let tenant_a = seed_tenant(&env, 1.0, 0).await?;
    let tenant_b = seed_tenant(&env, 1.0, 0).await?;
    let customer_id = seed_customer(&env).await?;
    let m = env.memberships.join(tenant_a, customer_id).await?;

    // The membership belongs to tenant A; tenant B cannot touch it.
    let err = env
        .ledger
        .apply_delta(
            tenant_b,
            m.membership_id,
            PointsDelta::new(TransactionType::Bonus, 100, "cross-tenant"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    Ok(())
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn concurrent_earns_serialize_on_the_row_lock() -> Result<(), Error> {
    let env = setup().await?;
    let tenant_id = seed_tenant(&env, 1.0, 0).await?;
    let customer_id = seed_customer(&env).await?;
    let m = env.memberships.join(tenant_id, customer_id).await?;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let ledger = env.ledger.clone();
        let membership_id = m.membership_id;
        handles.push(tokio::spawn(async move {
            ledger
                .apply_delta(
                    tenant_id,
                    membership_id,
                    PointsDelta::new(TransactionType::Bonus, 10, "parallel"),
                )
                .await
        }));
    }
    for h in handles {
        h.await.expect("task panicked")?;
    }

    let (balance, lifetime) = env.ledger.balance(tenant_id, m.membership_id).await?;
    assert_eq!(balance, 100);
    assert_eq!(lifetime, 100);
    assert!(env.ledger.verify(tenant_id, m.membership_id).await?);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn points_expiry_task_expires_stale_credits() -> Result<(), Error> {
    use chrono::{Duration, Utc};
    use nuqta_core::tasks::points_expiry::run_points_expiry;

    let env = setup().await?;
    let tenant_id = seed_tenant(&env, 1.0, 0).await?;
    sqlx::query("UPDATE points_settings SET points_expiry_months = 6 WHERE tenant_id = $1")
        .bind(tenant_id)
        .execute(env.db.pool())
        .await?;

    let customer_id = seed_customer(&env).await?;
    let m = env.memberships.join(tenant_id, customer_id).await?;

    // 300 stale points, 100 fresh, 50 already spent.
    let stale = env
        .ledger
        .apply_delta(
            tenant_id,
            m.membership_id,
            PointsDelta::new(TransactionType::Bonus, 300, "old credit"),
        )
        .await?;
    sqlx::query("UPDATE transactions SET created_at = $1 WHERE transaction_id = $2")
        .bind(Utc::now() - Duration::days(365))
        .bind(stale.transaction.transaction_id)
        .execute(env.db.pool())
        .await?;
    env.ledger
        .apply_delta(
            tenant_id,
            m.membership_id,
            PointsDelta::new(TransactionType::Bonus, 100, "fresh credit"),
        )
        .await?;
    let staff_id = seed_staff(&env, tenant_id).await?;
    env.ledger
        .manual_adjust(tenant_id, m.membership_id, -50, staff_id, "spend")
        .await?;

    let expired = run_points_expiry(env.db.pool(), &env.ledger, &env.notifier).await?;
    assert_eq!(expired, 1);

    // 300 stale minus the 50 already-consumed debit expires; 100 fresh stays.
    let (balance, _) = env.ledger.balance(tenant_id, m.membership_id).await?;
    assert_eq!(balance, 100);
    assert!(env.ledger.verify(tenant_id, m.membership_id).await?);

    // A second run finds nothing new to expire.
    let expired = run_points_expiry(env.db.pool(), &env.ledger, &env.notifier).await?;
    assert_eq!(expired, 0);

    Ok(())
}

#[tokio::test]
#[ignore = "requires a live Postgres (set TEST_DATABASE_URL)"]
async fn missing_membership_is_not_found() -> Result<(), Error> {
    let env = setup().await?;
    let tenant_id = seed_tenant(&env, 1.0, 0).await?;

    let err = env
        .ledger
        .apply_delta(
            tenant_id,
            Uuid::new_v4(),
            PointsDelta::new(TransactionType::Bonus, 10, "ghost"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    Ok(())
}
