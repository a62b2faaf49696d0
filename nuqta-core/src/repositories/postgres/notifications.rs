// File: nuqta-core/src/repositories/postgres/notifications.rs

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use nuqta_common::error::Error;
use nuqta_common::models::notification::Notification;
use nuqta_common::traits::repository_traits::NotificationRepository;

pub struct PostgresNotificationRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresNotificationRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn create(&self, n: &Notification) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                notification_id,
                tenant_id,
                membership_id,
                customer_id,
                kind,
                title_en,
                title_ar,
                message_en,
                message_ar,
                is_read,
                sent_at,
                created_at
            )
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12)
            "#,
        )
            .bind(n.notification_id)
            .bind(n.tenant_id)
            .bind(n.membership_id)
            .bind(n.customer_id)
            .bind(n.kind)
            .bind(&n.title_en)
            .bind(&n.title_ar)
            .bind(&n.message_en)
            .bind(&n.message_ar)
            .bind(n.is_read)
            .bind(n.sent_at)
            .bind(n.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_unread_for_customer(
        &self,
        customer_id: Uuid,
    ) -> Result<Vec<Notification>, Error> {
        let rows = sqlx::query_as::<_, Notification>(
            r#"
            SELECT notification_id, tenant_id, membership_id, customer_id,
                   kind, title_en, title_ar, message_en, message_ar,
                   is_read, sent_at, created_at
            FROM notifications
            WHERE customer_id = $1 AND NOT is_read
            ORDER BY created_at DESC
            "#,
        )
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn mark_read(&self, notification_id: Uuid) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE notification_id = $1
            "#,
        )
            .bind(notification_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
