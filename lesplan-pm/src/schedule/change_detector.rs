//! Schedule/location change classification
//!
//! Compares the pre-update snapshot against the incoming definition and
//! decides whether enrolled users must be notified. Fields are compared
//! string-normalized with absent values mapping to the empty string, so an
//! unset-to-set transition counts as a change.

use lesplan_common::db::models::ScheduleDefinition;
use uuid::Uuid;

/// Outcome of change classification; gates notification dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeSet {
    pub schedule_changed: bool,
    pub location_changed: bool,
}

impl ChangeSet {
    /// True when anything notification-worthy changed
    pub fn any(&self) -> bool {
        self.schedule_changed || self.location_changed
    }
}

/// Classify a program mutation.
///
/// `prev_schedule` is None when the program had no detail row (treated as
/// every field unset, so any incoming definition counts as a change).
/// Location comparison is over the sorted id sets.
pub fn detect(
    prev_schedule: Option<&ScheduleDefinition>,
    next_schedule: &ScheduleDefinition,
    prev_locations: &[Uuid],
    next_locations: &[Uuid],
) -> ChangeSet {
    let schedule_changed = match prev_schedule {
        Some(prev) => normalized_fields(prev) != normalized_fields(next_schedule),
        None => true,
    };

    let mut prev_sorted: Vec<Uuid> = prev_locations.to_vec();
    let mut next_sorted: Vec<Uuid> = next_locations.to_vec();
    prev_sorted.sort();
    next_sorted.sort();
    let location_changed = prev_sorted != next_sorted;

    ChangeSet {
        schedule_changed,
        location_changed,
    }
}

/// Watched fields as normalized strings; absent = empty string.
///
/// Recurring: weekday, start, end, season start, season end.
/// One-off: date, start, end.
fn normalized_fields(def: &ScheduleDefinition) -> Vec<String> {
    match def {
        ScheduleDefinition::RecurringWeekly {
            weekday,
            start_time,
            end_time,
            season_starts_on,
            season_ends_on,
        } => vec![
            weekday.to_string(),
            start_time.format("%H:%M").to_string(),
            end_time.format("%H:%M").to_string(),
            season_starts_on.map_or(String::new(), |d| d.format("%Y-%m-%d").to_string()),
            season_ends_on.map_or(String::new(), |d| d.format("%Y-%m-%d").to_string()),
        ],
        ScheduleDefinition::SingleOccurrence {
            occurs_on,
            start_time,
            end_time,
        } => vec![
            occurs_on.format("%Y-%m-%d").to_string(),
            start_time.format("%H:%M").to_string(),
            end_time.format("%H:%M").to_string(),
        ],
    }
}
