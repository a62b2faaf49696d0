// src/repositories/postgres/mod.rs

pub mod customers;
pub mod memberships;
pub mod notifications;
pub mod points_settings;
pub mod redemptions;
pub mod rewards;
pub mod staff;
pub mod tenants;
pub mod tiers;
pub mod transactions;

pub use customers::PostgresCustomerRepository;
pub use memberships::PostgresMembershipRepository;
pub use notifications::PostgresNotificationRepository;
pub use points_settings::PostgresPointsSettingRepository;
pub use redemptions::PostgresRedemptionRepository;
pub use rewards::PostgresRewardRepository;
pub use staff::PostgresStaffRepository;
pub use tenants::PostgresTenantRepository;
pub use tiers::PostgresTierRepository;
pub use transactions::PostgresTransactionRepository;
