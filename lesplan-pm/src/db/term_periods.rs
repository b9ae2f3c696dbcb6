//! Term period resolution

use anyhow::Result;
use lesplan_common::db::models::OrgSettings;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Resolve the term period a program should be scoped to.
///
/// An explicit id wins if it belongs to the organization; otherwise the
/// organization's active term period is used. When term-period scoping is
/// disabled for the organization, or nothing matches, the program is left
/// unscoped rather than failing.
pub async fn resolve_term_period(
    pool: &SqlitePool,
    organization_id: Uuid,
    explicit: Option<Uuid>,
    settings: &OrgSettings,
) -> Result<Option<Uuid>> {
    if !settings.term_periods_enabled {
        return Ok(None);
    }

    if let Some(id) = explicit {
        let owned: Option<String> = sqlx::query_scalar(
            "SELECT id FROM term_periods WHERE id = ? AND organization_id = ?",
        )
        .bind(id.to_string())
        .bind(organization_id.to_string())
        .fetch_optional(pool)
        .await?;

        if let Some(owned) = owned {
            return Ok(Some(Uuid::parse_str(&owned)?));
        }
    }

    active_term_period(pool, organization_id).await
}

/// The organization's active term period, if any
pub async fn active_term_period(
    pool: &SqlitePool,
    organization_id: Uuid,
) -> Result<Option<Uuid>> {
    let id: Option<String> = sqlx::query_scalar(
        r#"
        SELECT id FROM term_periods
        WHERE organization_id = ? AND active = 1
        ORDER BY starts_on DESC
        LIMIT 1
        "#,
    )
    .bind(organization_id.to_string())
    .fetch_optional(pool)
    .await?;

    id.map(|s| Ok(Uuid::parse_str(&s)?)).transpose()
}

/// Insert a term period
pub async fn insert_term_period(
    pool: &SqlitePool,
    id: Uuid,
    organization_id: Uuid,
    name: &str,
    starts_on: &str,
    ends_on: &str,
    active: bool,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO term_periods (id, organization_id, name, starts_on, ends_on, active)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(organization_id.to_string())
    .bind(name)
    .bind(starts_on)
    .bind(ends_on)
    .bind(active)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesplan_common::db::init::create_term_periods_table;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        create_term_periods_table(&pool).await.unwrap();
        pool
    }

    fn enabled() -> OrgSettings {
        OrgSettings {
            term_periods_enabled: true,
        }
    }

    #[tokio::test]
    async fn explicit_owned_id_wins() {
        let pool = setup_test_db().await;
        let org = Uuid::new_v4();
        let explicit = Uuid::new_v4();
        let active = Uuid::new_v4();
        insert_term_period(&pool, explicit, org, "2024/2025", "2024-09-01", "2025-06-30", false)
            .await
            .unwrap();
        insert_term_period(&pool, active, org, "2025/2026", "2025-09-01", "2026-06-30", true)
            .await
            .unwrap();

        let resolved = resolve_term_period(&pool, org, Some(explicit), &enabled())
            .await
            .unwrap();
        assert_eq!(resolved, Some(explicit));
    }

    #[tokio::test]
    async fn foreign_explicit_id_falls_back_to_active() {
        let pool = setup_test_db().await;
        let org = Uuid::new_v4();
        let other_org_period = Uuid::new_v4();
        let active = Uuid::new_v4();
        insert_term_period(
            &pool, other_org_period, Uuid::new_v4(), "foreign", "2024-09-01", "2025-06-30", true,
        )
        .await
        .unwrap();
        insert_term_period(&pool, active, org, "2025/2026", "2025-09-01", "2026-06-30", true)
            .await
            .unwrap();

        let resolved = resolve_term_period(&pool, org, Some(other_org_period), &enabled())
            .await
            .unwrap();
        assert_eq!(resolved, Some(active));
    }

    #[tokio::test]
    async fn disabled_scoping_resolves_to_none() {
        let pool = setup_test_db().await;
        let org = Uuid::new_v4();
        let period = Uuid::new_v4();
        insert_term_period(&pool, period, org, "2025/2026", "2025-09-01", "2026-06-30", true)
            .await
            .unwrap();

        let resolved = resolve_term_period(
            &pool,
            org,
            Some(period),
            &OrgSettings {
                term_periods_enabled: false,
            },
        )
        .await
        .unwrap();
        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn nothing_matching_degrades_to_none() {
        let pool = setup_test_db().await;
        let resolved = resolve_term_period(&pool, Uuid::new_v4(), None, &enabled())
            .await
            .unwrap();
        assert_eq!(resolved, None);
    }
}
