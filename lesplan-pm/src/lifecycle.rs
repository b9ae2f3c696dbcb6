//! Program lifecycle operations
//!
//! Create and update are orchestrations over the db layer: authorize,
//! validate, write the program row, rebuild derived state (schedule detail,
//! lessons, links), then publish a domain event for the effects worker.
//!
//! Failure policy follows the write order. The program row is the anchor:
//! a failed schedule-detail insert after a successful program insert triggers
//! a compensating delete. Link and lesson writes at creation are best-effort;
//! their failure is logged and the created program stands.

use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use lesplan_common::db::models::{OrgSettings, Program, ScheduleDefinition};
use lesplan_common::db::schema_probe::SchemaCapabilities;
use lesplan_common::events::DomainEvent;

use crate::access;
use crate::db::{lessons, links, programs, schedules, term_periods};
use crate::schedule::{self, MaterializeContext};

/// Client-supplied program fields, already parsed and defaulted
#[derive(Debug, Clone)]
pub struct ProgramDraft {
    pub title: String,
    pub description: Option<String>,
    pub term_period_id: Option<Uuid>,
    pub capacity: Option<i64>,
    pub waitlist_enabled: bool,
    pub visible: bool,
    pub paid: bool,
    pub price_cents: Option<i64>,
    pub registration_form_id: Option<Uuid>,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("principal is not allowed to manage this organization's programs")]
    Unauthorized,

    #[error("a program may be linked to at most one location")]
    TooManyLocations,

    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("program row insert failed")]
    ProgramInsertFailed(#[source] anyhow::Error),

    #[error("schedule detail insert failed")]
    DetailsInsertFailed(#[source] anyhow::Error),

    #[error("program row update failed")]
    ProgramUpdateFailed(#[source] anyhow::Error),

    #[error("schedule detail update failed")]
    DetailsUpdateFailed(#[source] anyhow::Error),

    #[error("program {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Orchestrates program create/update against the db layer
pub struct ProgramLifecycle<'a> {
    pub db: &'a SqlitePool,
    pub caps: &'a SchemaCapabilities,
    pub effects: &'a mpsc::UnboundedSender<DomainEvent>,
}

impl<'a> ProgramLifecycle<'a> {
    pub fn new(
        db: &'a SqlitePool,
        caps: &'a SchemaCapabilities,
        effects: &'a mpsc::UnboundedSender<DomainEvent>,
    ) -> Self {
        Self { db, caps, effects }
    }

    /// Create a program with its schedule detail, lessons, and links.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        actor: Uuid,
        organization_id: Uuid,
        draft: &ProgramDraft,
        def: &ScheduleDefinition,
        location_ids: &[Uuid],
        teacher_ids: &[Uuid],
        settings: &OrgSettings,
    ) -> Result<Program, LifecycleError> {
        self.authorize(actor, organization_id).await?;
        validate_locations(location_ids)?;
        def.validate().map_err(LifecycleError::InvalidSchedule)?;

        let term_period_id =
            term_periods::resolve_term_period(self.db, organization_id, draft.term_period_id, settings)
                .await?;

        let program = Program {
            id: Uuid::new_v4(),
            organization_id,
            kind: def.kind(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            term_period_id,
            capacity: draft.capacity,
            waitlist_enabled: draft.waitlist_enabled,
            visible: draft.visible,
            paid: draft.paid,
            price_cents: draft.price_cents,
            registration_form_id: draft.registration_form_id,
            created_by: actor,
        };

        programs::insert_program(self.db, self.caps, &program)
            .await
            .map_err(LifecycleError::ProgramInsertFailed)?;

        if let Err(e) = schedules::insert_schedule(self.db, program.id, def).await {
            // Compensate: the program row without its detail row is useless
            if let Err(cleanup) = programs::delete_program(self.db, program.id).await {
                error!(program_id = %program.id, "compensation delete failed: {:#}", cleanup);
            }
            return Err(LifecycleError::DetailsInsertFailed(e));
        }

        // Links and lessons are best-effort: the program exists and is
        // editable, a partial creation is repaired by a follow-up update.
        if let Err(e) = links::replace_locations(self.db, program.id, location_ids).await {
            warn!(program_id = %program.id, "location link insert failed: {:#}", e);
        }
        if let Err(e) = links::replace_teachers(self.db, program.id, teacher_ids).await {
            warn!(program_id = %program.id, "teacher link insert failed: {:#}", e);
        }

        let ctx = MaterializeContext {
            program_id: program.id,
            program_title: program.title.clone(),
            location_id: location_ids.first().copied(),
            teacher_id: teacher_ids.first().copied(),
            term_period_id,
        };
        let lesson_set = schedule::materialize(def, &ctx);
        match lessons::insert_lessons(self.db, &lesson_set).await {
            Ok(count) => info!(program_id = %program.id, count, "lessons materialized"),
            Err(e) => warn!(program_id = %program.id, "lesson insert failed: {:#}", e),
        }

        self.publish(DomainEvent::ProgramCreated {
            program_id: program.id,
            organization_id,
            actor,
            title: program.title.clone(),
            kind: program.kind,
            timestamp: Utc::now(),
        });

        Ok(program)
    }

    /// Update a program: replace its fields, rebuild derived state, and
    /// publish an update event only when the schedule or location changed.
    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        &self,
        actor: Uuid,
        program_id: Uuid,
        organization_id: Uuid,
        draft: &ProgramDraft,
        def: &ScheduleDefinition,
        location_ids: &[Uuid],
        teacher_ids: &[Uuid],
        settings: &OrgSettings,
    ) -> Result<(), LifecycleError> {
        let existing = programs::load_program(self.db, program_id)
            .await?
            .ok_or(LifecycleError::NotFound(program_id))?;

        // Authorization is scoped to the organization that owns the program,
        // never to whichever organization the caller claims.
        if existing.organization_id != organization_id {
            return Err(LifecycleError::Unauthorized);
        }
        self.authorize(actor, existing.organization_id).await?;
        validate_locations(location_ids)?;
        def.validate().map_err(LifecycleError::InvalidSchedule)?;

        // Snapshot the previous state before any write so change detection
        // compares against what recipients last saw.
        let prev_schedule = schedules::load_schedule(self.db, program_id).await?;
        let prev_locations = links::location_ids(self.db, program_id).await?;

        let term_period_id =
            term_periods::resolve_term_period(self.db, organization_id, draft.term_period_id, settings)
                .await?;

        let program = Program {
            id: program_id,
            organization_id,
            kind: def.kind(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            term_period_id,
            capacity: draft.capacity,
            waitlist_enabled: draft.waitlist_enabled,
            visible: draft.visible,
            paid: draft.paid,
            price_cents: draft.price_cents,
            registration_form_id: draft.registration_form_id,
            created_by: existing.created_by,
        };

        programs::update_program(self.db, self.caps, &program)
            .await
            .map_err(LifecycleError::ProgramUpdateFailed)?;

        let ctx = MaterializeContext {
            program_id,
            program_title: program.title.clone(),
            location_id: location_ids.first().copied(),
            teacher_id: teacher_ids.first().copied(),
            term_period_id,
        };

        match def {
            ScheduleDefinition::RecurringWeekly { .. } => {
                // Full rebuild: the schedule definition is the source of
                // truth, per-lesson edits do not survive it.
                schedules::delete_schedule(self.db, program_id)
                    .await
                    .map_err(LifecycleError::DetailsUpdateFailed)?;
                schedules::insert_schedule(self.db, program_id, def)
                    .await
                    .map_err(LifecycleError::DetailsUpdateFailed)?;
                lessons::delete_for_program(self.db, program_id)
                    .await
                    .map_err(LifecycleError::DetailsUpdateFailed)?;
                let lesson_set = schedule::materialize(def, &ctx);
                lessons::insert_lessons(self.db, &lesson_set)
                    .await
                    .map_err(LifecycleError::DetailsUpdateFailed)?;
            }
            ScheduleDefinition::SingleOccurrence { .. } => {
                schedules::delete_schedule(self.db, program_id)
                    .await
                    .map_err(LifecycleError::DetailsUpdateFailed)?;
                schedules::insert_schedule(self.db, program_id, def)
                    .await
                    .map_err(LifecycleError::DetailsUpdateFailed)?;
                let lesson_set = schedule::materialize(def, &ctx);
                let was_one_off = matches!(
                    &prev_schedule,
                    Some(ScheduleDefinition::SingleOccurrence { .. })
                );
                if was_one_off {
                    if let Some(lesson) = lesson_set.first() {
                        lessons::update_single_lesson(self.db, lesson)
                            .await
                            .map_err(LifecycleError::DetailsUpdateFailed)?;
                    }
                } else {
                    // Kind switch: the old recurring lesson set must not
                    // survive, so rebuild instead of updating in place
                    lessons::delete_for_program(self.db, program_id)
                        .await
                        .map_err(LifecycleError::DetailsUpdateFailed)?;
                    lessons::insert_lessons(self.db, &lesson_set)
                        .await
                        .map_err(LifecycleError::DetailsUpdateFailed)?;
                }
            }
        }

        if let Err(e) = links::replace_locations(self.db, program_id, location_ids).await {
            warn!(%program_id, "location link replace failed: {:#}", e);
        }
        if let Err(e) = links::replace_teachers(self.db, program_id, teacher_ids).await {
            warn!(%program_id, "teacher link replace failed: {:#}", e);
        }

        let changes = schedule::detect(
            prev_schedule.as_ref(),
            def,
            &prev_locations,
            location_ids,
        );
        if changes.any() {
            self.publish(DomainEvent::ProgramUpdated {
                program_id,
                organization_id,
                actor,
                title: program.title,
                schedule_changed: changes.schedule_changed,
                location_changed: changes.location_changed,
                timestamp: Utc::now(),
            });
        }

        Ok(())
    }

    async fn authorize(&self, actor: Uuid, organization_id: Uuid) -> Result<(), LifecycleError> {
        match access::evaluate(self.db, actor, organization_id).await? {
            Some(signal) => {
                info!(%actor, %organization_id, ?signal, "program management authorized");
                Ok(())
            }
            None => Err(LifecycleError::Unauthorized),
        }
    }

    fn publish(&self, event: DomainEvent) {
        // The receiver only closes at shutdown; a dropped event then is fine
        if self.effects.send(event).is_err() {
            warn!("effects channel closed, event dropped");
        }
    }
}

fn validate_locations(location_ids: &[Uuid]) -> Result<(), LifecycleError> {
    if location_ids.len() > 1 {
        return Err(LifecycleError::TooManyLocations);
    }
    Ok(())
}
