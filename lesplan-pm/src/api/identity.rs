//! Bearer-token verification against the external identity service
//!
//! Every program management request carries a bearer token; the identity
//! service exchanges it for a principal id. The trait seam exists so tests
//! can substitute a stub verifier.

use axum::async_trait;
use axum::http::{header, HeaderMap};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("no bearer token in request")]
    MissingToken,

    #[error("token rejected by identity service")]
    InvalidToken,

    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::MissingToken => ApiError::MissingAccessToken,
            IdentityError::InvalidToken => ApiError::InvalidToken,
            IdentityError::Unavailable(msg) => ApiError::ServerError(msg),
        }
    }
}

/// Token-to-principal resolution seam
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Uuid, IdentityError>;
}

/// Extract the bearer token from the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, IdentityError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or(IdentityError::MissingToken)
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    user_id: Uuid,
}

/// HTTP client against the identity service
pub struct HttpIdentityVerifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpIdentityVerifier {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl IdentityVerifier for HttpIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<Uuid, IdentityError> {
        let response = self
            .client
            .get(format!("{}/verify", self.base_url))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                let body: VerifyResponse = response
                    .json()
                    .await
                    .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
                Ok(body.user_id)
            }
            status if status.as_u16() == 401 || status.as_u16() == 403 => {
                Err(IdentityError::InvalidToken)
            }
            status => Err(IdentityError::Unavailable(format!(
                "identity service returned {}",
                status
            ))),
        }
    }
}
