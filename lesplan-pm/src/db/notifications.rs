//! Notification batch rows
//!
//! One row per dispatched batch. The push transport is an external concern;
//! writing the batch row with its delivery flags is the dispatch call.

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// A batched notification-creation call for one channel bucket
#[derive(Debug, Clone)]
pub struct NotificationBatch {
    pub category: String,
    pub title: String,
    pub message: String,
    pub deep_link: String,
    /// Deliver to the in-app inbox
    pub in_app: bool,
    /// Also deliver via push
    pub push: bool,
    pub recipients: Vec<Uuid>,
}

/// Insert one batch row
pub async fn insert_batch(pool: &SqlitePool, batch: &NotificationBatch) -> Result<()> {
    let recipients = serde_json::to_string(
        &batch
            .recipients
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>(),
    )?;

    sqlx::query(
        r#"
        INSERT INTO notifications
            (id, category, title, message, deep_link, in_app, push, recipients)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&batch.category)
    .bind(&batch.title)
    .bind(&batch.message)
    .bind(&batch.deep_link)
    .bind(batch.in_app)
    .bind(batch.push)
    .bind(recipients)
    .execute(pool)
    .await?;

    Ok(())
}

/// Load all batch rows for a category (newest first); test/inspection helper
pub async fn batches_for_category(
    pool: &SqlitePool,
    category: &str,
) -> Result<Vec<NotificationBatch>> {
    let rows = sqlx::query(
        r#"
        SELECT category, title, message, deep_link, in_app, push, recipients
        FROM notifications
        WHERE category = ?
        ORDER BY created_at DESC, id
        "#,
    )
    .bind(category)
    .fetch_all(pool)
    .await?;

    let mut batches = Vec::with_capacity(rows.len());
    for row in rows {
        let recipients_json: String = row.get("recipients");
        let recipient_strings: Vec<String> = serde_json::from_str(&recipients_json)?;
        let recipients = recipient_strings
            .iter()
            .map(|s| Uuid::parse_str(s))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        batches.push(NotificationBatch {
            category: row.get("category"),
            title: row.get("title"),
            message: row.get("message"),
            deep_link: row.get("deep_link"),
            in_app: row.get::<i64, _>("in_app") != 0,
            push: row.get::<i64, _>("push") != 0,
            recipients,
        });
    }

    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesplan_common::db::init::create_notifications_table;

    #[tokio::test]
    async fn batch_roundtrip_preserves_recipients_and_flags() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_notifications_table(&pool).await.unwrap();

        let recipients = vec![Uuid::new_v4(), Uuid::new_v4()];
        let batch = NotificationBatch {
            category: "new_program".to_string(),
            title: "Judo beginners".to_string(),
            message: "A new program is open for registration".to_string(),
            deep_link: "/programs/abc".to_string(),
            in_app: true,
            push: false,
            recipients: recipients.clone(),
        };
        insert_batch(&pool, &batch).await.unwrap();

        let loaded = batches_for_category(&pool, "new_program").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].recipients, recipients);
        assert!(loaded[0].in_app);
        assert!(!loaded[0].push);
    }
}
