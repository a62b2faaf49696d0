// tests/common/mod.rs
//
// Shared fixtures for the database-backed suites. Everything goes through
// the public repositories so the fixtures exercise the same write paths as
// production code.

#![allow(dead_code)]

use std::sync::Arc;
use chrono::Utc;
use uuid::Uuid;

use nuqta_common::models::customer::GlobalCustomer;
use nuqta_common::models::points_setting::PointsSetting;
use nuqta_common::models::reward::Reward;
use nuqta_common::models::staff::{PermissionSet, Staff, StaffRole};
use nuqta_common::models::tenant::Tenant;
use nuqta_common::models::tier::{Tier, TierLevel};
use nuqta_common::traits::repository_traits::{
    CustomerRepository, PointsSettingRepository, RewardRepository, StaffRepository,
    TenantRepository, TierRepository,
};

use nuqta_core::Error;
use nuqta_core::db::Database;
use nuqta_core::eventbus::EventBus;
use nuqta_core::repositories::postgres::{
    PostgresCustomerRepository, PostgresPointsSettingRepository, PostgresRewardRepository,
    PostgresStaffRepository, PostgresTenantRepository, PostgresTierRepository,
};
use nuqta_core::services::{
    LedgerService, MembershipService, NotificationService, QrService, RedemptionService,
    RewardService,
};
use nuqta_core::test_utils::helpers::setup_test_database;

pub struct TestEnv {
    pub db: Database,
    pub bus: Arc<EventBus>,
    pub ledger: Arc<LedgerService>,
    pub memberships: MembershipService,
    pub redemptions: RedemptionService,
    pub rewards: RewardService,
    pub qr: QrService,
    pub notifier: Arc<NotificationService>,
}

pub async fn setup() -> Result<TestEnv, Error> {
    let db = setup_test_database().await?;
    let pool = db.pool().clone();
    let bus = Arc::new(EventBus::new());
    let notifier = Arc::new(NotificationService::new(pool.clone(), bus.clone()));
    let ledger = Arc::new(LedgerService::new(pool.clone(), notifier.clone()));
    Ok(TestEnv {
        memberships: MembershipService::new(pool.clone(), ledger.clone(), notifier.clone()),
        redemptions: RedemptionService::new(pool.clone(), notifier.clone()),
        rewards: RewardService::new(pool.clone()),
        qr: QrService::new(pool),
        db,
        bus,
        ledger,
        notifier,
    })
}

/// Tenant with the standard four-tier ladder (0/500/2000/5000) and settings.
pub async fn seed_tenant(env: &TestEnv, ratio: f64, welcome_bonus: i64) -> Result<Uuid, Error> {
    seed_tenant_with_capacity(env, ratio, welcome_bonus, None).await
}

pub async fn seed_tenant_with_capacity(
    env: &TestEnv,
    ratio: f64,
    welcome_bonus: i64,
    max_customers: Option<i64>,
) -> Result<Uuid, Error> {
    let tenant_id = Uuid::new_v4();
    let now = Utc::now();
    let pool = env.db.pool().clone();

    PostgresTenantRepository::new(pool.clone())
        .create(&Tenant {
            tenant_id,
            business_name: "Test Cafe".into(),
            business_slug: format!("test-cafe-{}", &tenant_id.simple().to_string()[..8]),
            subscription_plan: "basic".into(),
            subscription_status: "active".into(),
            max_customers,
            max_staff: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
        .await?;

    let mut settings = PointsSetting::defaults_for(tenant_id);
    settings.currency_to_points_ratio = ratio;
    settings.welcome_bonus_points = welcome_bonus;
    PostgresPointsSettingRepository::new(pool.clone())
        .upsert(&settings)
        .await?;

    let tiers = PostgresTierRepository::new(pool);
    for (level, min_points, multiplier) in [
        (TierLevel::Bronze, 0, 1.0),
        (TierLevel::Silver, 500, 1.2),
        (TierLevel::Gold, 2000, 1.5),
        (TierLevel::Platinum, 5000, 2.0),
    ] {
        tiers
            .create(&Tier {
                tier_id: Uuid::new_v4(),
                tenant_id,
                level,
                name: level.to_string(),
                min_points,
                points_multiplier: multiplier,
                icon: None,
                color: None,
                display_order: level.rank() as i32,
                is_active: true,
                created_at: now,
                updated_at: now,
            })
            .await?;
    }

    Ok(tenant_id)
}

pub async fn seed_customer(env: &TestEnv) -> Result<Uuid, Error> {
    let customer_id = Uuid::new_v4();
    let now = Utc::now();
    PostgresCustomerRepository::new(env.db.pool().clone())
        .create(&GlobalCustomer {
            customer_id,
            full_name: "Test Customer".into(),
            phone_number: format!("+96650{}", &customer_id.simple().to_string()[..8]),
            email: None,
            phone_verified: true,
            email_verified: false,
            language: "en".into(),
            created_at: now,
            updated_at: now,
        })
        .await?;
    Ok(customer_id)
}

pub async fn seed_staff(env: &TestEnv, tenant_id: Uuid) -> Result<Uuid, Error> {
    let staff_id = Uuid::new_v4();
    PostgresStaffRepository::new(env.db.pool().clone())
        .create(&Staff {
            staff_id,
            tenant_id,
            full_name: "Test Staff".into(),
            email: format!("staff-{}@example.com", &staff_id.simple().to_string()[..8]),
            role: StaffRole::Admin,
            permissions: PermissionSet::new(),
            is_active: true,
            last_login_at: None,
            created_at: Utc::now(),
            deleted_at: None,
        })
        .await?;
    Ok(staff_id)
}

pub async fn seed_reward(
    env: &TestEnv,
    tenant_id: Uuid,
    points_required: i64,
    stock: Option<i64>,
    min_tier_required: Option<TierLevel>,
) -> Result<Uuid, Error> {
    let reward_id = Uuid::new_v4();
    let now = Utc::now();
    PostgresRewardRepository::new(env.db.pool().clone())
        .create(&Reward {
            reward_id,
            tenant_id,
            title_en: "Free Coffee".into(),
            title_ar: Some("قهوة مجانية".into()),
            description_en: None,
            description_ar: None,
            points_required,
            stock,
            min_tier_required,
            valid_from: None,
            valid_until: None,
            is_active: true,
            display_order: 0,
            total_redemptions: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        })
        .await?;
    Ok(reward_id)
}
