//! Enrollment and follower queries (notification audience sources)

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Users with an active enrollment in a program
pub async fn active_enrollee_ids(pool: &SqlitePool, program_id: Uuid) -> Result<Vec<Uuid>> {
    let rows = sqlx::query(
        "SELECT user_id FROM enrollments WHERE program_id = ? AND status = 'active' ORDER BY user_id",
    )
    .bind(program_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| Ok(Uuid::parse_str(row.get::<String, _>("user_id").as_str())?))
        .collect()
}

/// Users following an organization
pub async fn follower_ids(pool: &SqlitePool, organization_id: Uuid) -> Result<Vec<Uuid>> {
    let rows = sqlx::query(
        "SELECT user_id FROM organization_followers WHERE organization_id = ? ORDER BY user_id",
    )
    .bind(organization_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| Ok(Uuid::parse_str(row.get::<String, _>("user_id").as_str())?))
        .collect()
}

/// Enroll a user into a program
pub async fn add_enrollment(
    pool: &SqlitePool,
    program_id: Uuid,
    user_id: Uuid,
    status: &str,
) -> Result<()> {
    sqlx::query("INSERT INTO enrollments (program_id, user_id, status) VALUES (?, ?, ?)")
        .bind(program_id.to_string())
        .bind(user_id.to_string())
        .bind(status)
        .execute(pool)
        .await?;

    Ok(())
}

/// Register a follower of an organization
pub async fn add_follower(pool: &SqlitePool, organization_id: Uuid, user_id: Uuid) -> Result<()> {
    sqlx::query("INSERT INTO organization_followers (organization_id, user_id) VALUES (?, ?)")
        .bind(organization_id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}
