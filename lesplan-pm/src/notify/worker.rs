//! Effects worker
//!
//! Single consumer of the domain-event channel. Runs detached from the
//! request path with its own error policy: every failure is logged and the
//! loop keeps draining.

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use lesplan_common::events::DomainEvent;

use crate::billing::BillingSync;
use crate::notify::{audience, dispatcher, NotificationCategory};

/// Spawn the effects consumer. Exits when the sender side closes.
pub fn spawn_effects_worker(
    db: SqlitePool,
    billing: Arc<dyn BillingSync>,
    mut rx: mpsc::UnboundedReceiver<DomainEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("effects worker started");
        while let Some(event) = rx.recv().await {
            handle_event(&db, billing.as_ref(), event).await;
        }
        info!("effects worker stopped");
    })
}

async fn handle_event(db: &SqlitePool, billing: &dyn BillingSync, event: DomainEvent) {
    match event {
        DomainEvent::ProgramCreated {
            program_id,
            organization_id,
            actor,
            title,
            kind,
            ..
        } => {
            if let Err(e) = billing.program_changed(program_id).await {
                warn!(%program_id, "billing sync failed: {:#}", e);
            }

            let audience =
                match audience::new_program_audience(db, organization_id, actor, kind).await {
                    Ok(audience) => audience,
                    Err(e) => {
                        warn!(%program_id, "audience resolution failed: {:#}", e);
                        return;
                    }
                };

            let message = format!("A new program \"{}\" is open for registration", title);
            dispatcher::dispatch(
                db,
                &audience,
                NotificationCategory::NewProgram,
                &title,
                &message,
                &format!("/programs/{}", program_id),
            )
            .await;
        }

        DomainEvent::ProgramUpdated {
            program_id,
            actor,
            title,
            schedule_changed,
            location_changed,
            ..
        } => {
            let audience = match audience::program_updated_audience(db, program_id, actor).await {
                Ok(audience) => audience,
                Err(e) => {
                    warn!(%program_id, "audience resolution failed: {:#}", e);
                    return;
                }
            };

            let what = match (schedule_changed, location_changed) {
                (true, true) => "schedule and location",
                (true, false) => "schedule",
                _ => "location",
            };
            let message = format!("The {} of \"{}\" has changed", what, title);
            dispatcher::dispatch(
                db,
                &audience,
                NotificationCategory::ProgramUpdated,
                &title,
                &message,
                &format!("/programs/{}", program_id),
            )
            .await;
        }
    }
}
