// File: src/services/mod.rs

pub(crate) mod codes;
pub mod ledger_service;
pub mod membership_service;
pub mod notification_service;
pub mod qr_service;
pub mod redemption_service;
pub mod reward_service;
pub mod tier_engine;

pub use ledger_service::{AppliedDelta, LedgerService, PointsDelta};
pub use membership_service::{MembershipService, PointsSummary};
pub use notification_service::NotificationService;
pub use qr_service::QrService;
pub use redemption_service::{RedemptionOutcome, RedemptionService};
pub use reward_service::{RewardAvailability, RewardService};
