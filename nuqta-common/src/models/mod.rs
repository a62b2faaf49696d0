// File: nuqta-common/src/models/mod.rs
pub mod customer;
pub mod membership;
pub mod notification;
pub mod points_setting;
pub mod redemption;
pub mod reward;
pub mod staff;
pub mod tenant;
pub mod tier;
pub mod transaction;

pub use customer::GlobalCustomer;
pub use membership::CustomerMembership;
pub use notification::{Notification, NotificationKind};
pub use points_setting::PointsSetting;
pub use redemption::{Redemption, RedemptionStatus};
pub use reward::{RedeemBlock, Reward};
pub use staff::{Permission, PermissionSet, Staff, StaffRole};
pub use tenant::Tenant;
pub use tier::{Tier, TierLevel};
pub use transaction::{Transaction, TransactionRef, TransactionType};
