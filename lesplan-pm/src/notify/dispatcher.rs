//! Channel-bucketed dispatch
//!
//! Partitions an audience by each member's effective channel and writes at
//! most two batch rows: one for in-app-only recipients, one for recipients
//! who also get push. The two writes are independent; one failing never
//! blocks the other.

use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::notifications::{insert_batch, NotificationBatch};
use crate::db::preferences::{self, Channel};
use crate::notify::NotificationCategory;

/// Fan a notification out to an audience, honoring per-user channels.
///
/// Users whose effective channel is `none` are dropped. Errors are logged;
/// dispatch never fails the caller.
pub async fn dispatch(
    pool: &SqlitePool,
    audience: &[Uuid],
    category: NotificationCategory,
    title: &str,
    message: &str,
    deep_link: &str,
) {
    let mut in_app_only = Vec::new();
    let mut in_app_and_push = Vec::new();

    for user_id in audience {
        let pref = match preferences::load_preference(pool, *user_id, category.as_str()).await {
            Ok(pref) => pref,
            Err(e) => {
                warn!(%user_id, "preference load failed, skipping recipient: {:#}", e);
                continue;
            }
        };
        match pref.effective_channel() {
            Channel::None => {}
            Channel::InApp => in_app_only.push(*user_id),
            Channel::InAppAndPush => in_app_and_push.push(*user_id),
        }
    }

    if !in_app_only.is_empty() {
        let batch = NotificationBatch {
            category: category.as_str().to_string(),
            title: title.to_string(),
            message: message.to_string(),
            deep_link: deep_link.to_string(),
            in_app: true,
            push: false,
            recipients: in_app_only,
        };
        if let Err(e) = insert_batch(pool, &batch).await {
            warn!(category = category.as_str(), "in-app batch write failed: {:#}", e);
        }
    }

    if !in_app_and_push.is_empty() {
        let batch = NotificationBatch {
            category: category.as_str().to_string(),
            title: title.to_string(),
            message: message.to_string(),
            deep_link: deep_link.to_string(),
            in_app: true,
            push: true,
            recipients: in_app_and_push,
        };
        if let Err(e) = insert_batch(pool, &batch).await {
            warn!(category = category.as_str(), "push batch write failed: {:#}", e);
        }
    }

    info!(
        category = category.as_str(),
        audience = audience.len(),
        "notification dispatched"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::notifications::batches_for_category;
    use crate::db::preferences::{save_preference, Preference};
    use lesplan_common::db::init::{
        create_notification_preferences_table, create_notifications_table,
    };

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_notification_preferences_table(&pool).await.unwrap();
        create_notifications_table(&pool).await.unwrap();
        pool
    }

    async fn set_channel(pool: &SqlitePool, user: Uuid, channel: Channel) {
        save_preference(
            pool,
            user,
            NotificationCategory::NewProgram.as_str(),
            &Preference {
                disable_all: false,
                channel,
                scope: crate::notify::SCOPE_ALL.to_string(),
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn audience_partitions_into_two_buckets() {
        let pool = setup_test_db().await;
        let in_app_user = Uuid::new_v4();
        let push_user = Uuid::new_v4();
        let silent_user = Uuid::new_v4();
        let default_user = Uuid::new_v4();
        set_channel(&pool, in_app_user, Channel::InApp).await;
        set_channel(&pool, push_user, Channel::InAppAndPush).await;
        set_channel(&pool, silent_user, Channel::None).await;

        dispatch(
            &pool,
            &[in_app_user, push_user, silent_user, default_user],
            NotificationCategory::NewProgram,
            "Judo beginners",
            "A new program is open",
            "/programs/x",
        )
        .await;

        let batches = batches_for_category(&pool, "new_program").await.unwrap();
        assert_eq!(batches.len(), 2);

        let in_app_batch = batches.iter().find(|b| !b.push).unwrap();
        assert_eq!(in_app_batch.recipients, vec![in_app_user]);
        assert!(in_app_batch.in_app);

        // Absent preference defaults to in_app_and_push
        let push_batch = batches.iter().find(|b| b.push).unwrap();
        assert_eq!(push_batch.recipients, vec![push_user, default_user]);
        assert!(push_batch.in_app);
    }

    #[tokio::test]
    async fn fully_silenced_audience_writes_nothing() {
        let pool = setup_test_db().await;
        let user = Uuid::new_v4();
        save_preference(
            &pool,
            user,
            NotificationCategory::NewProgram.as_str(),
            &Preference {
                disable_all: true,
                channel: Channel::InAppAndPush,
                scope: crate::notify::SCOPE_ALL.to_string(),
            },
        )
        .await
        .unwrap();

        dispatch(
            &pool,
            &[user],
            NotificationCategory::NewProgram,
            "t",
            "m",
            "/programs/x",
        )
        .await;

        assert!(batches_for_category(&pool, "new_program").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_audience_writes_nothing() {
        let pool = setup_test_db().await;
        dispatch(
            &pool,
            &[],
            NotificationCategory::ProgramUpdated,
            "t",
            "m",
            "/programs/x",
        )
        .await;
        assert!(batches_for_category(&pool, "program_updated").await.unwrap().is_empty());
    }
}
