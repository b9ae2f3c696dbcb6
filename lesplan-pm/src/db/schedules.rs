//! Schedule detail row operations
//!
//! A program owns exactly one detail row in the table matching its kind:
//! `recurring_schedules` or `single_schedules`.

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use lesplan_common::db::models::ScheduleDefinition;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M";

fn date_str(date: &NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

fn time_str(time: &NaiveTime) -> String {
    time.format(TIME_FMT).to_string()
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(s, DATE_FMT)?)
}

fn parse_time(s: &str) -> Result<NaiveTime> {
    Ok(NaiveTime::parse_from_str(s, TIME_FMT)?)
}

/// Insert the type-specific detail row for a program
pub async fn insert_schedule(
    pool: &SqlitePool,
    program_id: Uuid,
    def: &ScheduleDefinition,
) -> Result<()> {
    match def {
        ScheduleDefinition::RecurringWeekly {
            weekday,
            start_time,
            end_time,
            season_starts_on,
            season_ends_on,
        } => {
            sqlx::query(
                r#"
                INSERT INTO recurring_schedules
                    (program_id, weekday, start_time, end_time, season_starts_on, season_ends_on)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(program_id.to_string())
            .bind(*weekday as i64)
            .bind(time_str(start_time))
            .bind(time_str(end_time))
            .bind(season_starts_on.as_ref().map(date_str))
            .bind(season_ends_on.as_ref().map(date_str))
            .execute(pool)
            .await?;
        }
        ScheduleDefinition::SingleOccurrence {
            occurs_on,
            start_time,
            end_time,
        } => {
            sqlx::query(
                r#"
                INSERT INTO single_schedules (program_id, occurs_on, start_time, end_time)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(program_id.to_string())
            .bind(date_str(occurs_on))
            .bind(time_str(start_time))
            .bind(time_str(end_time))
            .execute(pool)
            .await?;
        }
    }

    Ok(())
}

/// Delete the detail row(s) for a program.
///
/// Removes from both detail tables so a kind switch cannot leave a stale row.
pub async fn delete_schedule(pool: &SqlitePool, program_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM recurring_schedules WHERE program_id = ?")
        .bind(program_id.to_string())
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM single_schedules WHERE program_id = ?")
        .bind(program_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

/// Load the schedule definition for a program, if any
pub async fn load_schedule(
    pool: &SqlitePool,
    program_id: Uuid,
) -> Result<Option<ScheduleDefinition>> {
    let row = sqlx::query(
        r#"
        SELECT weekday, start_time, end_time, season_starts_on, season_ends_on
        FROM recurring_schedules
        WHERE program_id = ?
        "#,
    )
    .bind(program_id.to_string())
    .fetch_optional(pool)
    .await?;

    if let Some(row) = row {
        let season_starts_on: Option<String> = row.get("season_starts_on");
        let season_ends_on: Option<String> = row.get("season_ends_on");
        return Ok(Some(ScheduleDefinition::RecurringWeekly {
            weekday: row.get::<i64, _>("weekday") as u8,
            start_time: parse_time(row.get::<String, _>("start_time").as_str())?,
            end_time: parse_time(row.get::<String, _>("end_time").as_str())?,
            season_starts_on: season_starts_on.as_deref().map(parse_date).transpose()?,
            season_ends_on: season_ends_on.as_deref().map(parse_date).transpose()?,
        }));
    }

    let row = sqlx::query(
        r#"
        SELECT occurs_on, start_time, end_time
        FROM single_schedules
        WHERE program_id = ?
        "#,
    )
    .bind(program_id.to_string())
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(Some(ScheduleDefinition::SingleOccurrence {
            occurs_on: parse_date(row.get::<String, _>("occurs_on").as_str())?,
            start_time: parse_time(row.get::<String, _>("start_time").as_str())?,
            end_time: parse_time(row.get::<String, _>("end_time").as_str())?,
        })),
        None => Ok(None),
    }
}
