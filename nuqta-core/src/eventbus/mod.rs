//! src/eventbus/mod.rs
//!
//! In-process event bus with guaranteed delivery to multiple subscribers via
//! bounded MPSC queues. The ledger and redemption services publish here after
//! their database transactions commit; delivery failures never affect the
//! committed state.

use std::sync::Arc;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, mpsc, watch};
use uuid::Uuid;

use nuqta_common::models::redemption::RedemptionStatus;
use nuqta_common::models::tier::TierLevel;

/// Events emitted by the loyalty core after state changes commit.
#[derive(Debug, Clone)]
pub enum LoyaltyEvent {
    PointsEarned {
        tenant_id: Uuid,
        membership_id: Uuid,
        points: i64,
        balance_after: i64,
        timestamp: DateTime<Utc>,
    },
    TierChanged {
        tenant_id: Uuid,
        membership_id: Uuid,
        previous: TierLevel,
        current: TierLevel,
        timestamp: DateTime<Utc>,
    },
    RedemptionCreated {
        tenant_id: Uuid,
        membership_id: Uuid,
        redemption_id: Uuid,
        redemption_code: String,
        points_used: i64,
        timestamp: DateTime<Utc>,
    },
    RedemptionResolved {
        tenant_id: Uuid,
        membership_id: Uuid,
        redemption_id: Uuid,
        status: RedemptionStatus,
        timestamp: DateTime<Utc>,
    },
    PointsExpired {
        tenant_id: Uuid,
        membership_id: Uuid,
        points: i64,
        timestamp: DateTime<Utc>,
    },
}

impl LoyaltyEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            LoyaltyEvent::PointsEarned { .. } => "points_earned",
            LoyaltyEvent::TierChanged { .. } => "tier_changed",
            LoyaltyEvent::RedemptionCreated { .. } => "redemption_created",
            LoyaltyEvent::RedemptionResolved { .. } => "redemption_resolved",
            LoyaltyEvent::PointsExpired { .. } => "points_expired",
        }
    }
}

/// Each subscriber gets its own `mpsc::Sender<LoyaltyEvent>`.
///
/// - If a subscriber's buffer fills, `publish` awaits until there is space
///   (backpressure).
/// - If a subscriber has dropped its `Receiver`, the send is skipped.
#[derive(Clone)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<mpsc::Sender<LoyaltyEvent>>>>,
    shutdown_tx: watch::Sender<bool>,
    pub shutdown_rx: watch::Receiver<bool>,
}

const DEFAULT_BUFFER_SIZE: usize = 10000;

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            subscribers: Arc::new(Mutex::new(vec![])),
            shutdown_tx: tx,
            shutdown_rx: rx,
        }
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Returns a receiver on which events will be delivered.
    pub async fn subscribe(&self, buffer_size: Option<usize>) -> mpsc::Receiver<LoyaltyEvent> {
        let size = buffer_size.unwrap_or(DEFAULT_BUFFER_SIZE);
        let (tx, rx) = mpsc::channel(size);
        let mut subs = self.subscribers.lock().await;
        subs.push(tx);
        rx
    }

    /// Publish an event to all subscribers.
    pub async fn publish(&self, event: LoyaltyEvent) {
        let senders = {
            let subs = self.subscribers.lock().await;
            subs.clone()
        };
        for s in senders {
            let _ = s.send(event.clone()).await;
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
