//! Lesson row operations
//!
//! Lessons are a derived projection of the schedule definition: bulk-created
//! at program creation, bulk-deleted and regenerated for recurring programs
//! on update, mutated in place for one-off programs.

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use lesplan_common::db::models::{Lesson, NewLesson};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Bulk-insert a materialized lesson set; returns the number inserted
pub async fn insert_lessons(pool: &SqlitePool, lessons: &[NewLesson]) -> Result<usize> {
    for lesson in lessons {
        sqlx::query(
            r#"
            INSERT INTO lessons
                (id, program_id, location_id, teacher_id, term_period_id,
                 title, occurs_on, starts_at, duration_minutes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(lesson.program_id.to_string())
        .bind(lesson.location_id.map(|id| id.to_string()))
        .bind(lesson.teacher_id.map(|id| id.to_string()))
        .bind(lesson.term_period_id.map(|id| id.to_string()))
        .bind(&lesson.title)
        .bind(lesson.occurs_on.format("%Y-%m-%d").to_string())
        .bind(lesson.starts_at.format("%H:%M").to_string())
        .bind(lesson.duration_minutes)
        .execute(pool)
        .await?;
    }

    Ok(lessons.len())
}

/// Delete every lesson of a program
pub async fn delete_for_program(pool: &SqlitePool, program_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM lessons WHERE program_id = ?")
        .bind(program_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// Update the single lesson of a one-off program in place.
///
/// A one-off program owns exactly one lesson after creation; the WHERE
/// clause relies on that.
pub async fn update_single_lesson(pool: &SqlitePool, lesson: &NewLesson) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE lessons
        SET title = ?, occurs_on = ?, starts_at = ?, duration_minutes = ?,
            teacher_id = ?, location_id = ?, term_period_id = ?
        WHERE program_id = ?
        "#,
    )
    .bind(&lesson.title)
    .bind(lesson.occurs_on.format("%Y-%m-%d").to_string())
    .bind(lesson.starts_at.format("%H:%M").to_string())
    .bind(lesson.duration_minutes)
    .bind(lesson.teacher_id.map(|id| id.to_string()))
    .bind(lesson.location_id.map(|id| id.to_string()))
    .bind(lesson.term_period_id.map(|id| id.to_string()))
    .bind(lesson.program_id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load a program's lessons ordered by date
pub async fn lessons_for_program(pool: &SqlitePool, program_id: Uuid) -> Result<Vec<Lesson>> {
    let rows = sqlx::query(
        r#"
        SELECT id, program_id, location_id, teacher_id, term_period_id,
               title, occurs_on, starts_at, duration_minutes
        FROM lessons
        WHERE program_id = ?
        ORDER BY occurs_on, starts_at
        "#,
    )
    .bind(program_id.to_string())
    .fetch_all(pool)
    .await?;

    let mut lessons = Vec::with_capacity(rows.len());
    for row in rows {
        let id: String = row.get("id");
        let program_id: String = row.get("program_id");
        let location_id: Option<String> = row.get("location_id");
        let teacher_id: Option<String> = row.get("teacher_id");
        let term_period_id: Option<String> = row.get("term_period_id");
        let occurs_on: String = row.get("occurs_on");
        let starts_at: String = row.get("starts_at");

        lessons.push(Lesson {
            id: Uuid::parse_str(&id)?,
            program_id: Uuid::parse_str(&program_id)?,
            location_id: location_id.map(|s| Uuid::parse_str(&s)).transpose()?,
            teacher_id: teacher_id.map(|s| Uuid::parse_str(&s)).transpose()?,
            term_period_id: term_period_id.map(|s| Uuid::parse_str(&s)).transpose()?,
            title: row.get("title"),
            occurs_on: NaiveDate::parse_from_str(&occurs_on, "%Y-%m-%d")?,
            starts_at: NaiveTime::parse_from_str(&starts_at, "%H:%M")?,
            duration_minutes: row.get("duration_minutes"),
        });
    }

    Ok(lessons)
}
