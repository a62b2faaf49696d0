// src/repositories/mod.rs

pub mod postgres;

pub use nuqta_common::traits::repository_traits::{
    CustomerRepository, MembershipRepository, NotificationRepository, PointsSettingRepository,
    RedemptionRepository, RewardRepository, StaffRepository, TenantRepository, TierRepository,
    TransactionRepository,
};
