//! Database models and core domain types

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Program kind: recurring weekly course or one-off event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramKind {
    Recurring,
    OneOff,
}

impl ProgramKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgramKind::Recurring => "recurring",
            ProgramKind::OneOff => "one_off",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "recurring" => Some(ProgramKind::Recurring),
            "one_off" => Some(ProgramKind::OneOff),
            _ => None,
        }
    }
}

/// A schedulable offering owned by an organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub kind: ProgramKind,
    pub title: String,
    pub description: Option<String>,
    pub term_period_id: Option<Uuid>,
    pub capacity: Option<i64>,
    pub waitlist_enabled: bool,
    pub visible: bool,
    pub paid: bool,
    /// Optional column: may be absent from older deployments
    pub price_cents: Option<i64>,
    /// Optional column: may be absent from older deployments
    pub registration_form_id: Option<Uuid>,
    pub created_by: Uuid,
}

/// The abstract rule from which lessons are derived.
///
/// Weekday is canonical 0=Sunday..6=Saturday. Callers using the 1..7
/// Monday-first convention must convert via [`normalize_weekday`] before
/// constructing a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScheduleDefinition {
    RecurringWeekly {
        weekday: u8,
        start_time: NaiveTime,
        end_time: NaiveTime,
        season_starts_on: Option<NaiveDate>,
        /// Inclusive
        season_ends_on: Option<NaiveDate>,
    },
    SingleOccurrence {
        occurs_on: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
    },
}

impl ScheduleDefinition {
    pub fn kind(&self) -> ProgramKind {
        match self {
            ScheduleDefinition::RecurringWeekly { .. } => ProgramKind::Recurring,
            ScheduleDefinition::SingleOccurrence { .. } => ProgramKind::OneOff,
        }
    }

    /// Validate the schedule invariants: end time after start time, and
    /// season end on or after season start when both are present.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let (start, end) = match self {
            ScheduleDefinition::RecurringWeekly {
                weekday,
                start_time,
                end_time,
                season_starts_on,
                season_ends_on,
            } => {
                if *weekday > 6 {
                    return Err(format!("weekday {} out of range 0..6", weekday));
                }
                if let (Some(s), Some(e)) = (season_starts_on, season_ends_on) {
                    if e < s {
                        return Err("season end before season start".to_string());
                    }
                }
                (start_time, end_time)
            }
            ScheduleDefinition::SingleOccurrence {
                start_time,
                end_time,
                ..
            } => (start_time, end_time),
        };

        if end <= start {
            return Err("end time must be after start time".to_string());
        }
        Ok(())
    }
}

/// Convert a 1..7 Monday-first weekday (UI convention) to canonical
/// 0=Sunday..6=Saturday. 7 (Sunday) wraps to 0; 1..6 map to themselves.
pub fn normalize_weekday(ui_value: u8) -> u8 {
    ui_value % 7
}

/// One concrete, dated, timed occurrence materialized from a schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub program_id: Uuid,
    pub location_id: Option<Uuid>,
    pub teacher_id: Option<Uuid>,
    pub term_period_id: Option<Uuid>,
    pub title: String,
    pub occurs_on: NaiveDate,
    pub starts_at: NaiveTime,
    pub duration_minutes: i64,
}

/// A lesson about to be inserted (id assigned at write time)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLesson {
    pub program_id: Uuid,
    pub location_id: Option<Uuid>,
    pub teacher_id: Option<Uuid>,
    pub term_period_id: Option<Uuid>,
    pub title: String,
    pub occurs_on: NaiveDate,
    pub starts_at: NaiveTime,
    pub duration_minutes: i64,
}

/// Ambient per-organization configuration, read once per request and passed
/// into the lifecycle operation as a value.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrgSettings {
    pub term_periods_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn weekday_normalization_wraps_sunday() {
        assert_eq!(normalize_weekday(7), 0); // UI Sunday
        assert_eq!(normalize_weekday(1), 1); // UI Monday
        assert_eq!(normalize_weekday(6), 6); // UI Saturday
    }

    #[test]
    fn validate_rejects_inverted_times() {
        let def = ScheduleDefinition::SingleOccurrence {
            occurs_on: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            start_time: time(19, 0),
            end_time: time(18, 0),
        };
        assert!(def.validate().is_err());
    }

    #[test]
    fn validate_rejects_inverted_season() {
        let def = ScheduleDefinition::RecurringWeekly {
            weekday: 1,
            start_time: time(18, 0),
            end_time: time(19, 0),
            season_starts_on: NaiveDate::from_ymd_opt(2025, 6, 1),
            season_ends_on: NaiveDate::from_ymd_opt(2025, 1, 1),
        };
        assert!(def.validate().is_err());
    }

    #[test]
    fn validate_accepts_open_season() {
        let def = ScheduleDefinition::RecurringWeekly {
            weekday: 0,
            start_time: time(10, 0),
            end_time: time(11, 30),
            season_starts_on: None,
            season_ends_on: None,
        };
        assert!(def.validate().is_ok());
    }
}
