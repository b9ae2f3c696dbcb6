//! lesplan-pm (Program Management) - program lifecycle and notification service

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use lesplan_common::config::{database_path, resolve_root_folder, ServiceConfig};
use lesplan_common::db::init::init_database;
use lesplan_common::db::schema_probe::SchemaCapabilities;
use lesplan_pm::api::identity::HttpIdentityVerifier;
use lesplan_pm::billing::HttpBillingSync;
use lesplan_pm::notify::worker::spawn_effects_worker;
use lesplan_pm::{build_router, AppState};

#[derive(Debug, Parser)]
#[command(name = "lesplan-pm", about = "Lesplan program management service")]
struct Cli {
    /// Root folder holding the database (overrides env and config file)
    #[arg(long)]
    root_folder: Option<String>,

    /// Address to bind the HTTP server to
    #[arg(long, env = "LESPLAN_PM_BIND", default_value = "127.0.0.1:5810")]
    bind: String,

    /// Base URL of the identity service used for token verification
    #[arg(long, env = "LESPLAN_IDENTITY_URL", default_value = "http://127.0.0.1:5801")]
    identity_url: String,

    /// Billing sync endpoint; billing triggers are a no-op when unset
    #[arg(long, env = "LESPLAN_BILLING_URL")]
    billing_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!(
        "Starting Lesplan Program Management (lesplan-pm) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let cli = Cli::parse();
    let root_folder = resolve_root_folder(cli.root_folder.as_deref(), "LESPLAN_ROOT")?;
    let config = ServiceConfig {
        root_folder,
        bind_addr: cli.bind,
        identity_url: cli.identity_url,
        billing_url: cli.billing_url,
    };

    let db_path = database_path(&config.root_folder);
    info!("Database path: {}", db_path.display());
    let pool = init_database(&db_path).await?;

    // Probe once which optional columns the deployed schema carries
    let caps = SchemaCapabilities::probe(&pool).await?;

    // Effects channel: lifecycle operations publish, the worker consumes.
    // Failures on the worker side are logged and never reach a request.
    let (effects_tx, effects_rx) = mpsc::unbounded_channel();
    let billing = Arc::new(HttpBillingSync::new(config.billing_url.clone()));
    spawn_effects_worker(pool.clone(), billing, effects_rx);

    let identity = Arc::new(HttpIdentityVerifier::new(config.identity_url.clone()));
    let state = AppState::new(pool, caps, identity, effects_tx);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("lesplan-pm listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
