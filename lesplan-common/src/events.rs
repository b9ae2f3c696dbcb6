//! Domain event types for the effects channel
//!
//! Lifecycle operations publish these on an mpsc channel and return; a
//! detached consumer task performs notification fan-out and billing sync
//! with its own error policy. Nothing on the request path awaits delivery.

use crate::db::models::ProgramKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fire-and-forget side effects emitted by program lifecycle operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DomainEvent {
    /// A program was created and published
    ProgramCreated {
        program_id: Uuid,
        organization_id: Uuid,
        /// Acting principal; excluded from every audience
        actor: Uuid,
        title: String,
        kind: ProgramKind,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A program's schedule and/or location changed.
    ///
    /// Only published when the change detector reports a relevant change;
    /// both flags false is never sent.
    ProgramUpdated {
        program_id: Uuid,
        organization_id: Uuid,
        actor: Uuid,
        title: String,
        schedule_changed: bool,
        location_changed: bool,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}
