//! Location and teacher link operations
//!
//! Links are replaced wholesale: delete-all-then-insert. The single-location
//! invariant is enforced by the lifecycle layer before any write.

use anyhow::Result;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Replace a program's location links
pub async fn replace_locations(
    pool: &SqlitePool,
    program_id: Uuid,
    location_ids: &[Uuid],
) -> Result<()> {
    sqlx::query("DELETE FROM program_locations WHERE program_id = ?")
        .bind(program_id.to_string())
        .execute(pool)
        .await?;

    for location_id in location_ids {
        sqlx::query("INSERT INTO program_locations (program_id, location_id) VALUES (?, ?)")
            .bind(program_id.to_string())
            .bind(location_id.to_string())
            .execute(pool)
            .await?;
    }

    Ok(())
}

/// Replace a program's teacher links
pub async fn replace_teachers(
    pool: &SqlitePool,
    program_id: Uuid,
    teacher_ids: &[Uuid],
) -> Result<()> {
    sqlx::query("DELETE FROM program_teachers WHERE program_id = ?")
        .bind(program_id.to_string())
        .execute(pool)
        .await?;

    for teacher_id in teacher_ids {
        sqlx::query("INSERT INTO program_teachers (program_id, teacher_id) VALUES (?, ?)")
            .bind(program_id.to_string())
            .bind(teacher_id.to_string())
            .execute(pool)
            .await?;
    }

    Ok(())
}

/// Sorted location ids linked to a program
pub async fn location_ids(pool: &SqlitePool, program_id: Uuid) -> Result<Vec<Uuid>> {
    let rows = sqlx::query(
        "SELECT location_id FROM program_locations WHERE program_id = ? ORDER BY location_id",
    )
    .bind(program_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| Ok(Uuid::parse_str(row.get::<String, _>("location_id").as_str())?))
        .collect()
}

/// Sorted teacher ids linked to a program
pub async fn teacher_ids(pool: &SqlitePool, program_id: Uuid) -> Result<Vec<Uuid>> {
    let rows = sqlx::query(
        "SELECT teacher_id FROM program_teachers WHERE program_id = ? ORDER BY teacher_id",
    )
    .bind(program_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| Ok(Uuid::parse_str(row.get::<String, _>("teacher_id").as_str())?))
        .collect()
}
