//! Lesson materialization
//!
//! Pure computation turning a schedule definition into a finite, ordered
//! sequence of lessons. No side effects; restartable.

use chrono::{Datelike, Duration, NaiveDate};
use lesplan_common::db::models::{NewLesson, ScheduleDefinition};
use uuid::Uuid;

/// Owner context passed through to every materialized lesson
#[derive(Debug, Clone)]
pub struct MaterializeContext {
    pub program_id: Uuid,
    pub program_title: String,
    /// The single linked location, if any
    pub location_id: Option<Uuid>,
    pub teacher_id: Option<Uuid>,
    pub term_period_id: Option<Uuid>,
}

/// Expand a schedule definition into concrete lessons.
///
/// Recurring weekly: the first occurrence is the first date on or after the
/// season start whose weekday matches; one lesson is emitted every 7 days
/// while the date is on or before the season end (inclusive). A definition
/// missing either season bound materializes to an empty sequence - a defined
/// no-op, not an error. Lesson titles carry a 1-based sequence number.
///
/// Single occurrence: exactly one lesson, program title verbatim.
///
/// Preconditions (validated upstream, not enforced here): start time before
/// end time, weekday already normalized to 0=Sunday..6=Saturday.
pub fn materialize(def: &ScheduleDefinition, ctx: &MaterializeContext) -> Vec<NewLesson> {
    match def {
        ScheduleDefinition::RecurringWeekly {
            weekday,
            start_time,
            end_time,
            season_starts_on,
            season_ends_on,
        } => {
            let (Some(season_start), Some(season_end)) = (season_starts_on, season_ends_on)
            else {
                return Vec::new();
            };

            let duration_minutes = (*end_time - *start_time).num_minutes();

            let Some(first) = first_matching_date(*season_start, *weekday) else {
                return Vec::new();
            };

            let mut lessons = Vec::new();
            let mut date = first;
            let mut sequence = 1u32;
            while date <= *season_end {
                lessons.push(NewLesson {
                    program_id: ctx.program_id,
                    location_id: ctx.location_id,
                    teacher_id: ctx.teacher_id,
                    term_period_id: ctx.term_period_id,
                    title: format!("{} - Les {}", ctx.program_title, sequence),
                    occurs_on: date,
                    starts_at: *start_time,
                    duration_minutes,
                });
                sequence += 1;
                date += Duration::days(7);
            }
            lessons
        }
        ScheduleDefinition::SingleOccurrence {
            occurs_on,
            start_time,
            end_time,
        } => {
            vec![NewLesson {
                program_id: ctx.program_id,
                location_id: ctx.location_id,
                teacher_id: ctx.teacher_id,
                term_period_id: ctx.term_period_id,
                title: ctx.program_title.clone(),
                occurs_on: *occurs_on,
                starts_at: *start_time,
                duration_minutes: (*end_time - *start_time).num_minutes(),
            }]
        }
    }
}

/// Bounded forward scan (at most 7 steps) for the first date on or after
/// `from` whose weekday equals `weekday` (0=Sunday..6=Saturday). Returns
/// None for an out-of-range weekday.
fn first_matching_date(from: NaiveDate, weekday: u8) -> Option<NaiveDate> {
    let mut date = from;
    for _ in 0..7 {
        if date.weekday().num_days_from_sunday() as u8 == weekday {
            return Some(date);
        }
        date += Duration::days(1);
    }
    None
}
