//! HTTP API tests using in-memory router requests

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tower::util::ServiceExt;
use uuid::Uuid;

use lesplan_common::db::init::create_all_tables;
use lesplan_common::db::schema_probe::SchemaCapabilities;
use lesplan_pm::api::identity::{IdentityError, IdentityVerifier};
use lesplan_pm::db::organizations;
use lesplan_pm::{build_router, AppState};

/// Verifier accepting exactly one token for one principal
struct StubVerifier {
    token: &'static str,
    principal: Uuid,
}

#[axum::async_trait]
impl IdentityVerifier for StubVerifier {
    async fn verify(&self, token: &str) -> Result<Uuid, IdentityError> {
        if token == self.token {
            Ok(self.principal)
        } else {
            Err(IdentityError::InvalidToken)
        }
    }
}

struct Harness {
    app: axum::Router,
    pool: SqlitePool,
    org: Uuid,
    owner: Uuid,
}

async fn setup() -> Harness {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    create_all_tables(&pool).await.unwrap();
    let caps = SchemaCapabilities::probe(&pool).await.unwrap();

    let org = Uuid::new_v4();
    let owner = Uuid::new_v4();
    organizations::insert_organization(&pool, org, "Dojo Amsterdam", owner, false)
        .await
        .unwrap();

    let (effects_tx, _effects_rx) = mpsc::unbounded_channel();
    let identity = Arc::new(StubVerifier {
        token: "valid-token",
        principal: owner,
    });
    let state = AppState::new(pool.clone(), caps, identity, effects_tx);

    Harness {
        app: build_router(state),
        pool,
        org,
        owner,
    }
}

fn program_body(org: Uuid, location_ids: Vec<Uuid>) -> Value {
    json!({
        "organization_id": org,
        "kind": "recurring",
        "title": "Judo beginners",
        "schedule": {
            "weekday": 1,
            "start_time": "18:00",
            "end_time": "19:00",
            "season_starts_on": "2025-01-06",
            "season_ends_on": "2025-01-27"
        },
        "location_ids": location_ids
    })
}

fn post_programs(body: &Value, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/programs")
        .header("content-type", "application/json");
    if let Some(token) = auth {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_requires_no_auth() {
    let h = setup().await;
    let response = h
        .app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "lesplan-pm");
}

#[tokio::test]
async fn missing_token_is_401_missing_access_token() {
    let h = setup().await;
    let response = h
        .app
        .oneshot(post_programs(&program_body(h.org, vec![]), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["error"], "missing_access_token");
}

#[tokio::test]
async fn bad_token_is_401_invalid_token() {
    let h = setup().await;
    let response = h
        .app
        .oneshot(post_programs(&program_body(h.org, vec![]), Some("wrong")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(response).await;
    assert_eq!(body["error"], "invalid_token");
}

#[tokio::test]
async fn principal_without_signal_is_403_unauthorized() {
    let mut h = setup().await;
    // Re-point the stub at a principal with no relation to the organization
    let stranger = Uuid::new_v4();
    let caps = SchemaCapabilities::probe(&h.pool).await.unwrap();
    let (effects_tx, _rx) = mpsc::unbounded_channel();
    let identity = Arc::new(StubVerifier {
        token: "valid-token",
        principal: stranger,
    });
    h.app = build_router(AppState::new(h.pool.clone(), caps, identity, effects_tx));

    let response = h
        .app
        .oneshot(post_programs(
            &program_body(h.org, vec![]),
            Some("valid-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = response_json(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn owner_creates_program_with_lessons() {
    let h = setup().await;
    let response = h
        .app
        .oneshot(post_programs(
            &program_body(h.org, vec![]),
            Some("valid-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["program"]["title"], "Judo beginners");
    assert_eq!(body["program"]["created_by"], json!(h.owner));

    let lesson_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lessons")
        .fetch_one(&h.pool)
        .await
        .unwrap();
    assert_eq!(lesson_count, 4);
}

#[tokio::test]
async fn two_locations_is_400_only_one_location_allowed() {
    let h = setup().await;
    let response = h
        .app
        .oneshot(post_programs(
            &program_body(h.org, vec![Uuid::new_v4(), Uuid::new_v4()]),
            Some("valid-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "only_one_location_allowed");
}

#[tokio::test]
async fn missing_schedule_fields_is_400() {
    let h = setup().await;
    let mut body = program_body(h.org, vec![]);
    body["schedule"]["weekday"] = Value::Null;

    let response = h
        .app
        .oneshot(post_programs(&body, Some("valid-token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["error"], "missing_required_fields");
}

#[tokio::test]
async fn update_roundtrip_returns_success() {
    let h = setup().await;
    let create_response = h
        .app
        .clone()
        .oneshot(post_programs(
            &program_body(h.org, vec![]),
            Some("valid-token"),
        ))
        .await
        .unwrap();
    assert_eq!(create_response.status(), StatusCode::CREATED);
    let created = response_json(create_response).await;
    let program_id = created["program"]["id"].as_str().unwrap().to_string();

    let mut body = program_body(h.org, vec![]);
    body["schedule"]["weekday"] = json!(3);
    let response = h
        .app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(format!("/api/programs/{}", program_id))
                .header("content-type", "application/json")
                .header("authorization", "Bearer valid-token")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
}
