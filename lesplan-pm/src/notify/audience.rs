//! Audience resolution
//!
//! Who hears about a program event. The acting principal is always excluded;
//! per-user preferences can narrow the new-program audience by scope.

use anyhow::Result;
use lesplan_common::db::models::ProgramKind;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::db::{enrollments, preferences};
use crate::notify::{NotificationCategory, SCOPE_WORKSHOPS_ONLY};

/// Followers of the organization who want to hear about this kind of
/// program, minus the actor.
///
/// The `workshops_only` scope keeps one-off announcements and drops
/// recurring ones; any other scope value admits everything.
pub async fn new_program_audience(
    pool: &SqlitePool,
    organization_id: Uuid,
    actor: Uuid,
    kind: ProgramKind,
) -> Result<Vec<Uuid>> {
    let followers = enrollments::follower_ids(pool, organization_id).await?;

    let mut audience = Vec::with_capacity(followers.len());
    for user_id in followers {
        if user_id == actor {
            continue;
        }
        let pref = preferences::load_preference(
            pool,
            user_id,
            NotificationCategory::NewProgram.as_str(),
        )
        .await?;
        if pref.scope == SCOPE_WORKSHOPS_ONLY && kind != ProgramKind::OneOff {
            continue;
        }
        audience.push(user_id);
    }

    Ok(audience)
}

/// Active enrollees of the program, minus the actor
pub async fn program_updated_audience(
    pool: &SqlitePool,
    program_id: Uuid,
    actor: Uuid,
) -> Result<Vec<Uuid>> {
    let enrollees = enrollments::active_enrollee_ids(pool, program_id).await?;
    Ok(enrollees.into_iter().filter(|id| *id != actor).collect())
}
