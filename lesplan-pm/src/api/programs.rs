//! Program management endpoints
//!
//! POST /api/programs and PUT /api/programs/:id. Handlers authenticate,
//! parse the schedule block, load the organization settings, then hand off
//! to the lifecycle layer and map its errors onto the wire taxonomy.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::error;
use uuid::Uuid;

use lesplan_common::db::models::{normalize_weekday, ProgramKind, ScheduleDefinition};

use crate::api::identity::bearer_token;
use crate::db::organizations;
use crate::error::{ApiError, ApiResult};
use crate::lifecycle::{LifecycleError, ProgramDraft, ProgramLifecycle};
use crate::AppState;

fn default_visible() -> bool {
    true
}

/// Request body shared by create and update
#[derive(Debug, Deserialize)]
pub struct ProgramRequest {
    pub organization_id: Uuid,
    pub kind: ProgramKind,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub term_period_id: Option<Uuid>,
    #[serde(default)]
    pub capacity: Option<i64>,
    #[serde(default)]
    pub waitlist_enabled: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default)]
    pub registration_form_id: Option<Uuid>,
    pub schedule: ScheduleRequest,
    #[serde(default)]
    pub location_ids: Vec<Uuid>,
    #[serde(default)]
    pub teacher_ids: Vec<Uuid>,
}

/// Raw schedule block; which fields are required depends on the kind.
/// Weekday uses the 1..7 Monday-first client convention.
#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    #[serde(default)]
    pub weekday: Option<u8>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub season_starts_on: Option<String>,
    #[serde(default)]
    pub season_ends_on: Option<String>,
    #[serde(default)]
    pub occurs_on: Option<String>,
}

fn parse_time(field: &str, value: &Option<String>) -> ApiResult<NaiveTime> {
    let value = value
        .as_deref()
        .ok_or_else(|| ApiError::MissingRequiredFields(field.to_string()))?;
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| ApiError::MissingRequiredFields(field.to_string()))
}

fn parse_date(field: &str, value: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ApiError::MissingRequiredFields(field.to_string()))
}

fn parse_schedule(kind: ProgramKind, schedule: &ScheduleRequest) -> ApiResult<ScheduleDefinition> {
    match kind {
        ProgramKind::Recurring => {
            let weekday = schedule
                .weekday
                .ok_or_else(|| ApiError::MissingRequiredFields("schedule.weekday".to_string()))?;
            if !(1..=7).contains(&weekday) {
                return Err(ApiError::MissingRequiredFields("schedule.weekday".to_string()));
            }
            Ok(ScheduleDefinition::RecurringWeekly {
                weekday: normalize_weekday(weekday),
                start_time: parse_time("schedule.start_time", &schedule.start_time)?,
                end_time: parse_time("schedule.end_time", &schedule.end_time)?,
                season_starts_on: schedule
                    .season_starts_on
                    .as_deref()
                    .map(|s| parse_date("schedule.season_starts_on", s))
                    .transpose()?,
                season_ends_on: schedule
                    .season_ends_on
                    .as_deref()
                    .map(|s| parse_date("schedule.season_ends_on", s))
                    .transpose()?,
            })
        }
        ProgramKind::OneOff => {
            let occurs_on = schedule
                .occurs_on
                .as_deref()
                .ok_or_else(|| ApiError::MissingRequiredFields("schedule.occurs_on".to_string()))?;
            Ok(ScheduleDefinition::SingleOccurrence {
                occurs_on: parse_date("schedule.occurs_on", occurs_on)?,
                start_time: parse_time("schedule.start_time", &schedule.start_time)?,
                end_time: parse_time("schedule.end_time", &schedule.end_time)?,
            })
        }
    }
}

fn draft_from(request: &ProgramRequest) -> ApiResult<ProgramDraft> {
    if request.title.trim().is_empty() {
        return Err(ApiError::MissingRequiredFields("title".to_string()));
    }
    Ok(ProgramDraft {
        title: request.title.clone(),
        description: request.description.clone(),
        term_period_id: request.term_period_id,
        capacity: request.capacity,
        waitlist_enabled: request.waitlist_enabled,
        visible: request.visible,
        paid: request.paid,
        price_cents: request.price_cents,
        registration_form_id: request.registration_form_id,
    })
}

/// POST /api/programs
pub async fn create_program(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ProgramRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let token = bearer_token(&headers)?;
    let actor = state.identity.verify(token).await?;

    let draft = draft_from(&request)?;
    let def = parse_schedule(request.kind, &request.schedule)?;

    let settings = organizations::org_settings(&state.db, request.organization_id)
        .await
        .map_err(|e| ApiError::ServerError(e.to_string()))?;

    let lifecycle = ProgramLifecycle::new(&state.db, &state.caps, &state.effects);
    let program = lifecycle
        .create(
            actor,
            request.organization_id,
            &draft,
            &def,
            &request.location_ids,
            &request.teacher_ids,
            &settings,
        )
        .await
        .map_err(map_create_error)?;

    Ok((StatusCode::CREATED, Json(json!({ "program": program }))))
}

/// PUT /api/programs/:id
pub async fn update_program(
    State(state): State<AppState>,
    Path(program_id): Path<Uuid>,
    headers: HeaderMap,
    Json(request): Json<ProgramRequest>,
) -> ApiResult<Json<Value>> {
    let token = bearer_token(&headers)?;
    let actor = state.identity.verify(token).await?;

    let draft = draft_from(&request)?;
    let def = parse_schedule(request.kind, &request.schedule)?;

    let settings = organizations::org_settings(&state.db, request.organization_id)
        .await
        .map_err(|e| ApiError::ServerError(e.to_string()))?;

    let lifecycle = ProgramLifecycle::new(&state.db, &state.caps, &state.effects);
    lifecycle
        .update(
            actor,
            program_id,
            request.organization_id,
            &draft,
            &def,
            &request.location_ids,
            &request.teacher_ids,
            &settings,
        )
        .await
        .map_err(map_update_error)?;

    Ok(Json(json!({ "success": true })))
}

fn map_create_error(err: LifecycleError) -> ApiError {
    match err {
        LifecycleError::Unauthorized => ApiError::Unauthorized,
        LifecycleError::TooManyLocations => ApiError::OnlyOneLocationAllowed,
        LifecycleError::InvalidSchedule(msg) => ApiError::MissingRequiredFields(msg),
        LifecycleError::ProgramInsertFailed(e) => {
            error!("program insert failed: {:#}", e);
            ApiError::ProgramInsertFailed
        }
        LifecycleError::DetailsInsertFailed(e) => {
            error!("schedule detail insert failed: {:#}", e);
            ApiError::DetailsInsertFailed
        }
        other => {
            error!("program create failed: {:#}", other);
            ApiError::ServerError(other.to_string())
        }
    }
}

fn map_update_error(err: LifecycleError) -> ApiError {
    match err {
        LifecycleError::Unauthorized => ApiError::Unauthorized,
        LifecycleError::TooManyLocations => ApiError::OnlyOneLocationAllowed,
        LifecycleError::InvalidSchedule(msg) => ApiError::MissingRequiredFields(msg),
        // A missing program surfaces as a failed update, not a 404: the
        // route shape already told the client which id it addressed
        LifecycleError::NotFound(_) => ApiError::ProgramUpdateFailed,
        LifecycleError::ProgramUpdateFailed(e) => {
            error!("program update failed: {:#}", e);
            ApiError::ProgramUpdateFailed
        }
        LifecycleError::DetailsUpdateFailed(e) => {
            error!("schedule detail update failed: {:#}", e);
            ApiError::DetailsUpdateFailed
        }
        other => {
            error!("program update failed: {:#}", other);
            ApiError::ServerError(other.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recurring_schedule() -> ScheduleRequest {
        ScheduleRequest {
            weekday: Some(1),
            start_time: Some("18:00".to_string()),
            end_time: Some("19:00".to_string()),
            season_starts_on: Some("2025-01-06".to_string()),
            season_ends_on: Some("2025-01-27".to_string()),
            occurs_on: None,
        }
    }

    #[test]
    fn recurring_schedule_parses_and_normalizes_weekday() {
        let mut schedule = recurring_schedule();
        schedule.weekday = Some(7); // UI Sunday
        let def = parse_schedule(ProgramKind::Recurring, &schedule).unwrap();
        match def {
            ScheduleDefinition::RecurringWeekly { weekday, .. } => assert_eq!(weekday, 0),
            _ => panic!("expected recurring definition"),
        }
    }

    #[test]
    fn recurring_without_weekday_is_missing_fields() {
        let mut schedule = recurring_schedule();
        schedule.weekday = None;
        let err = parse_schedule(ProgramKind::Recurring, &schedule).unwrap_err();
        assert!(matches!(err, ApiError::MissingRequiredFields(_)));
    }

    #[test]
    fn weekday_zero_is_rejected() {
        let mut schedule = recurring_schedule();
        schedule.weekday = Some(0);
        assert!(parse_schedule(ProgramKind::Recurring, &schedule).is_err());
    }

    #[test]
    fn one_off_requires_occurs_on() {
        let schedule = ScheduleRequest {
            weekday: None,
            start_time: Some("14:00".to_string()),
            end_time: Some("17:00".to_string()),
            season_starts_on: None,
            season_ends_on: None,
            occurs_on: None,
        };
        assert!(parse_schedule(ProgramKind::OneOff, &schedule).is_err());
    }

    #[test]
    fn one_off_parses() {
        let schedule = ScheduleRequest {
            weekday: None,
            start_time: Some("14:00".to_string()),
            end_time: Some("17:00".to_string()),
            season_starts_on: None,
            season_ends_on: None,
            occurs_on: Some("2025-03-15".to_string()),
        };
        let def = parse_schedule(ProgramKind::OneOff, &schedule).unwrap();
        assert!(matches!(def, ScheduleDefinition::SingleOccurrence { .. }));
    }

    #[test]
    fn malformed_time_is_missing_fields() {
        let mut schedule = recurring_schedule();
        schedule.start_time = Some("6pm".to_string());
        assert!(parse_schedule(ProgramKind::Recurring, &schedule).is_err());
    }
}
