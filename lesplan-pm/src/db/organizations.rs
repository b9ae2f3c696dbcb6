//! Organization row queries

use anyhow::Result;
use lesplan_common::db::models::OrgSettings;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Load the ambient settings of an organization.
///
/// Read once per request and passed into the lifecycle operation as a
/// value. A missing organization degrades to defaults; the access policy
/// rejects the request separately.
pub async fn org_settings(pool: &SqlitePool, organization_id: Uuid) -> Result<OrgSettings> {
    let row = sqlx::query("SELECT term_periods_enabled FROM organizations WHERE id = ?")
        .bind(organization_id.to_string())
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(OrgSettings {
            term_periods_enabled: row.get::<i64, _>("term_periods_enabled") != 0,
        }),
        None => Ok(OrgSettings::default()),
    }
}

/// Insert an organization (owner + settings)
pub async fn insert_organization(
    pool: &SqlitePool,
    organization_id: Uuid,
    name: &str,
    owner_id: Uuid,
    term_periods_enabled: bool,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO organizations (id, name, owner_id, term_periods_enabled) VALUES (?, ?, ?, ?)",
    )
    .bind(organization_id.to_string())
    .bind(name)
    .bind(owner_id.to_string())
    .bind(term_periods_enabled)
    .execute(pool)
    .await?;

    Ok(())
}
