//! Notification preference records

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::notify::SCOPE_ALL;

/// Delivery channel for a notification category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    None,
    InApp,
    InAppAndPush,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::None => "none",
            Channel::InApp => "in_app",
            Channel::InAppAndPush => "in_app_and_push",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Channel::None),
            "in_app" => Some(Channel::InApp),
            "in_app_and_push" => Some(Channel::InAppAndPush),
            _ => None,
        }
    }
}

/// Per-(user, category) preference record
#[derive(Debug, Clone)]
pub struct Preference {
    pub disable_all: bool,
    pub channel: Channel,
    pub scope: String,
}

impl Default for Preference {
    /// Applied when no record exists for the (user, category) pair
    fn default() -> Self {
        Self {
            disable_all: false,
            channel: Channel::InAppAndPush,
            scope: SCOPE_ALL.to_string(),
        }
    }
}

impl Preference {
    /// The channel to actually deliver on: `disable_all` silences every
    /// category unconditionally.
    pub fn effective_channel(&self) -> Channel {
        if self.disable_all {
            Channel::None
        } else {
            self.channel
        }
    }
}

/// Load the preference for a (user, category) pair, defaulting when absent
pub async fn load_preference(
    pool: &SqlitePool,
    user_id: Uuid,
    category: &str,
) -> Result<Preference> {
    let row = sqlx::query(
        r#"
        SELECT disable_all, channel, scope
        FROM notification_preferences
        WHERE user_id = ? AND category = ?
        "#,
    )
    .bind(user_id.to_string())
    .bind(category)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => {
            let channel: String = row.get("channel");
            Ok(Preference {
                disable_all: row.get::<i64, _>("disable_all") != 0,
                channel: Channel::parse(&channel)
                    .ok_or_else(|| anyhow::anyhow!("unknown channel '{}'", channel))?,
                scope: row.get("scope"),
            })
        }
        None => Ok(Preference::default()),
    }
}

/// Store a preference record (upsert)
pub async fn save_preference(
    pool: &SqlitePool,
    user_id: Uuid,
    category: &str,
    preference: &Preference,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO notification_preferences (user_id, category, disable_all, channel, scope)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(user_id, category) DO UPDATE SET
            disable_all = excluded.disable_all,
            channel = excluded.channel,
            scope = excluded.scope
        "#,
    )
    .bind(user_id.to_string())
    .bind(category)
    .bind(preference.disable_all)
    .bind(preference.channel.as_str())
    .bind(&preference.scope)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesplan_common::db::init::create_notification_preferences_table;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_notification_preferences_table(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn missing_record_defaults_to_in_app_and_push() {
        let pool = setup_test_db().await;
        let pref = load_preference(&pool, Uuid::new_v4(), "new_program")
            .await
            .unwrap();
        assert!(!pref.disable_all);
        assert_eq!(pref.channel, Channel::InAppAndPush);
        assert_eq!(pref.scope, "all");
        assert_eq!(pref.effective_channel(), Channel::InAppAndPush);
    }

    #[tokio::test]
    async fn disable_all_silences_unconditionally() {
        let pool = setup_test_db().await;
        let user = Uuid::new_v4();
        save_preference(
            &pool,
            user,
            "new_program",
            &Preference {
                disable_all: true,
                channel: Channel::InAppAndPush,
                scope: SCOPE_ALL.to_string(),
            },
        )
        .await
        .unwrap();

        let pref = load_preference(&pool, user, "new_program").await.unwrap();
        assert_eq!(pref.effective_channel(), Channel::None);
    }

    #[tokio::test]
    async fn stored_channel_roundtrips() {
        let pool = setup_test_db().await;
        let user = Uuid::new_v4();
        save_preference(
            &pool,
            user,
            "program_updated",
            &Preference {
                disable_all: false,
                channel: Channel::InApp,
                scope: "workshops_only".to_string(),
            },
        )
        .await
        .unwrap();

        let pref = load_preference(&pool, user, "program_updated").await.unwrap();
        assert_eq!(pref.channel, Channel::InApp);
        assert_eq!(pref.scope, "workshops_only");
        assert_eq!(pref.effective_channel(), Channel::InApp);
    }

    #[tokio::test]
    async fn preferences_are_per_category() {
        let pool = setup_test_db().await;
        let user = Uuid::new_v4();
        save_preference(
            &pool,
            user,
            "new_program",
            &Preference {
                disable_all: false,
                channel: Channel::None,
                scope: SCOPE_ALL.to_string(),
            },
        )
        .await
        .unwrap();

        // Other category still defaults
        let pref = load_preference(&pool, user, "program_updated").await.unwrap();
        assert_eq!(pref.channel, Channel::InAppAndPush);
    }
}
