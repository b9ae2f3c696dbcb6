//! Billing synchronization
//!
//! The billing service keeps its own view of paid programs. Lifecycle
//! operations notify it after the fact; a failed sync is logged and never
//! blocks the originating request.

use anyhow::Result;
use axum::async_trait;
use uuid::Uuid;

/// Downstream billing notification seam
#[async_trait]
pub trait BillingSync: Send + Sync {
    /// Tell billing that a program was created or changed
    async fn program_changed(&self, program_id: Uuid) -> Result<()>;
}

/// HTTP client against the billing service.
///
/// When no endpoint is configured the sync is a no-op, so deployments
/// without a billing service need no special casing.
pub struct HttpBillingSync {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl HttpBillingSync {
    pub fn new(endpoint: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl BillingSync for HttpBillingSync {
    async fn program_changed(&self, program_id: Uuid) -> Result<()> {
        let Some(endpoint) = &self.endpoint else {
            return Ok(());
        };

        self.client
            .post(format!("{}/api/billing/program-changed", endpoint))
            .json(&serde_json::json!({ "program_id": program_id }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

/// Sync that does nothing; used in tests
pub struct NoopBillingSync;

#[async_trait]
impl BillingSync for NoopBillingSync {
    async fn program_changed(&self, _program_id: Uuid) -> Result<()> {
        Ok(())
    }
}
