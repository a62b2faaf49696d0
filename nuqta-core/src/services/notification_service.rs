//! Best-effort notification outbox.
//!
//! Every method here runs strictly *after* the ledger transaction has
//! committed. Failures are logged and swallowed; they never surface to the
//! caller and never roll anything back.

use std::sync::Arc;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use tracing::warn;
use uuid::Uuid;

use nuqta_common::models::notification::{Notification, NotificationKind};
use nuqta_common::models::redemption::Redemption;
use nuqta_common::models::tier::Tier;

use crate::eventbus::{EventBus, LoyaltyEvent};
use crate::repositories::NotificationRepository;
use crate::repositories::postgres::PostgresNotificationRepository;

pub struct NotificationService {
    repo: PostgresNotificationRepository,
    event_bus: Arc<EventBus>,
}

impl NotificationService {
    pub fn new(pool: Pool<Postgres>, event_bus: Arc<EventBus>) -> Self {
        Self {
            repo: PostgresNotificationRepository::new(pool),
            event_bus,
        }
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Write one outbox row; log and swallow any failure.
    async fn store(&self, notification: Notification) {
        if let Err(e) = self.repo.create(&notification).await {
            warn!("failed to store {} notification: {}", notification.kind, e);
        }
    }

    fn base(
        tenant_id: Uuid,
        membership_id: Uuid,
        customer_id: Option<Uuid>,
        kind: NotificationKind,
    ) -> Notification {
        Notification {
            notification_id: Uuid::new_v4(),
            tenant_id,
            membership_id: Some(membership_id),
            customer_id,
            kind,
            title_en: String::new(),
            title_ar: None,
            message_en: String::new(),
            message_ar: None,
            is_read: false,
            sent_at: Some(Utc::now()),
            created_at: Utc::now(),
        }
    }

    pub async fn welcome_bonus(
        &self,
        tenant_id: Uuid,
        membership_id: Uuid,
        customer_id: Uuid,
        points: i64,
    ) {
        let mut n = Self::base(
            tenant_id,
            membership_id,
            Some(customer_id),
            NotificationKind::WelcomeBonus,
        );
        n.title_en = "Welcome Bonus".into();
        n.title_ar = Some("مكافأة الترحيب".into());
        n.message_en = format!("Welcome! You've received {} bonus points.", points);
        n.message_ar = Some(format!("مرحباً! لقد حصلت على {} نقطة مكافأة.", points));
        self.store(n).await;
    }

    pub async fn tier_changed(
        &self,
        tenant_id: Uuid,
        membership_id: Uuid,
        previous: &Tier,
        current: &Tier,
    ) {
        let mut n = Self::base(tenant_id, membership_id, None, NotificationKind::TierUpgrade);
        n.title_en = "Tier Upgrade!".into();
        n.title_ar = Some("ترقية المستوى!".into());
        n.message_en = format!("Congratulations! You are now {} tier", current.name);
        n.message_ar = Some(format!("مبروك! أصبحت الآن من فئة {}", current.name));
        self.store(n).await;

        self.event_bus
            .publish(LoyaltyEvent::TierChanged {
                tenant_id,
                membership_id,
                previous: previous.level,
                current: current.level,
                timestamp: Utc::now(),
            })
            .await;
    }

    pub async fn points_earned(
        &self,
        tenant_id: Uuid,
        membership_id: Uuid,
        points: i64,
        balance_after: i64,
    ) {
        let mut n = Self::base(tenant_id, membership_id, None, NotificationKind::PointsEarned);
        n.title_en = "Points Earned".into();
        n.title_ar = Some("كسب نقاط".into());
        n.message_en = format!("You earned {} points. New balance: {}.", points, balance_after);
        n.message_ar = Some(format!("لقد كسبت {} نقطة. رصيدك الجديد: {}.", points, balance_after));
        self.store(n).await;

        self.event_bus
            .publish(LoyaltyEvent::PointsEarned {
                tenant_id,
                membership_id,
                points,
                balance_after,
                timestamp: Utc::now(),
            })
            .await;
    }

    pub async fn redemption_created(&self, redemption: &Redemption, reward_title: &str) {
        let mut n = Self::base(
            redemption.tenant_id,
            redemption.membership_id,
            None,
            NotificationKind::RewardRedeemed,
        );
        n.title_en = "Reward Redeemed".into();
        n.title_ar = Some("تم استبدال المكافأة".into());
        n.message_en = format!(
            "You've successfully redeemed: {}. Use code: {}",
            reward_title, redemption.redemption_code
        );
        n.message_ar = Some(format!(
            "لقد قمت باستبدال: {}. استخدم الكود: {}",
            reward_title, redemption.redemption_code
        ));
        self.store(n).await;

        self.event_bus
            .publish(LoyaltyEvent::RedemptionCreated {
                tenant_id: redemption.tenant_id,
                membership_id: redemption.membership_id,
                redemption_id: redemption.redemption_id,
                redemption_code: redemption.redemption_code.clone(),
                points_used: redemption.points_used,
                timestamp: Utc::now(),
            })
            .await;
    }

    pub async fn redemption_approved(&self, redemption: &Redemption) {
        let mut n = Self::base(
            redemption.tenant_id,
            redemption.membership_id,
            None,
            NotificationKind::RedemptionApproved,
        );
        n.title_en = "Redemption Approved".into();
        n.title_ar = Some("تم الموافقة على الاستبدال".into());
        n.message_en = "Your redemption request has been approved".into();
        n.message_ar = Some("تم الموافقة على طلب استبدالك".into());
        self.store(n).await;

        self.publish_resolved(redemption).await;
    }

    pub async fn redemption_rejected(&self, redemption: &Redemption, reason: Option<&str>) {
        let mut n = Self::base(
            redemption.tenant_id,
            redemption.membership_id,
            None,
            NotificationKind::RedemptionRejected,
        );
        n.title_en = "Redemption Rejected".into();
        n.title_ar = Some("تم رفض الاستبدال".into());
        n.message_en = reason
            .unwrap_or("Your redemption request has been rejected")
            .to_string();
        n.message_ar = Some("تم رفض طلب استبدالك".into());
        self.store(n).await;

        self.publish_resolved(redemption).await;
    }

    async fn publish_resolved(&self, redemption: &Redemption) {
        self.event_bus
            .publish(LoyaltyEvent::RedemptionResolved {
                tenant_id: redemption.tenant_id,
                membership_id: redemption.membership_id,
                redemption_id: redemption.redemption_id,
                status: redemption.status,
                timestamp: Utc::now(),
            })
            .await;
    }

    pub async fn points_expired(&self, tenant_id: Uuid, membership_id: Uuid, points: i64) {
        let mut n = Self::base(tenant_id, membership_id, None, NotificationKind::PointsExpired);
        n.title_en = "Points Expired".into();
        n.title_ar = Some("انتهاء صلاحية النقاط".into());
        n.message_en = format!("{} points have expired.", points);
        n.message_ar = Some(format!("انتهت صلاحية {} نقطة.", points));
        self.store(n).await;

        self.event_bus
            .publish(LoyaltyEvent::PointsExpired {
                tenant_id,
                membership_id,
                points,
                timestamp: Utc::now(),
            })
            .await;
    }
}
