//! lesplan-pm library - Program Management service
//!
//! Manages the lifecycle of recurring and one-off scheduled offerings
//! (programs), materializes concrete lessons from schedule definitions,
//! and fans out change notifications to affected users.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::mpsc;

use lesplan_common::db::schema_probe::SchemaCapabilities;
use lesplan_common::events::DomainEvent;

pub mod access;
pub mod api;
pub mod billing;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod notify;
pub mod schedule;

pub use api::identity::IdentityVerifier;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Deployed-schema capabilities, probed once at startup
    pub caps: SchemaCapabilities,
    /// Bearer-token verification against the external identity service
    pub identity: Arc<dyn IdentityVerifier>,
    /// Fire-and-forget effects channel (consumed by the effects worker)
    pub effects: mpsc::UnboundedSender<DomainEvent>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        db: SqlitePool,
        caps: SchemaCapabilities,
        identity: Arc<dyn IdentityVerifier>,
        effects: mpsc::UnboundedSender<DomainEvent>,
    ) -> Self {
        Self {
            db,
            caps,
            identity,
            effects,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{post, put};
    use tower_http::trace::TraceLayer;

    Router::new()
        .route("/api/programs", post(api::programs::create_program))
        .route("/api/programs/:id", put(api::programs::update_program))
        .merge(api::health::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
