//! HTTP-level tests for the administrative API.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use aegis::server::handlers::AppState;
use aegis::server::routes::build_router;
use aegis::table::{LicenseRecord, LicenseTable};

const SIGNING_SECRET: &str = "test-signing-secret";
const ADMIN_KEY: &str = "test-admin-key";

fn test_state() -> AppState {
    AppState {
        table: Arc::new(LicenseTable::new()),
        signing_secret: SIGNING_SECRET.to_string(),
        admin_key: ADMIN_KEY.to_string(),
        default_duration_secs: 300,
        default_max_uses: 10,
    }
}

/// POST with the admin key in the query string.
async fn post_admin(app: &axum::Router, path: &str, body: Value) -> (StatusCode, Value) {
    let uri = format!("{path}?key={ADMIN_KEY}");
    post_raw(app, &uri, body).await
}

async fn post_raw(app: &axum::Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get_raw(app: &axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn admin_requires_credential() {
    let app = build_router(test_state());
    let body = json!({"hwid": "HWID-1", "username": "alice"});

    // No key at all.
    let (status, response) = post_raw(&app, "/admin/add_license", body.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(response["message"], "unauthorized");

    // Wrong key.
    let (status, response) =
        post_raw(&app, "/admin/add_license?key=wrong", body.clone()).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(response["message"], "unauthorized");

    // Listing too.
    let (status, _) = get_raw(&app, "/admin/licenses").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_key_accepted_via_header() {
    let app = build_router(test_state());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/admin/add_license")
                .header("content-type", "application/json")
                .header("x-admin-key", ADMIN_KEY)
                .body(Body::from(
                    json!({"hwid": "HWID-1", "username": "alice"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Add
// ============================================================================

#[tokio::test]
async fn add_license_creates_unactivated_record() {
    let state = test_state();
    let app = build_router(state.clone());

    let (status, body) = post_admin(
        &app,
        "/admin/add_license",
        json!({"hwid": "HWID-1", "username": "alice", "duration": 600, "max_uses": 5}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().unwrap().contains("HWID-1"));

    let record = state.table.get("HWID-1").unwrap().unwrap();
    assert_eq!(record.owner_label, "alice");
    assert_eq!(record.duration, 600);
    assert_eq!(record.max_uses, 5);
    assert!(!record.is_activated());
    assert_eq!(record.use_count, 0);
}

#[tokio::test]
async fn add_license_applies_configured_defaults() {
    let state = test_state();
    let app = build_router(state.clone());

    post_admin(
        &app,
        "/admin/add_license",
        json!({"hwid": "HWID-1", "username": "alice"}),
    )
    .await;

    let record = state.table.get("HWID-1").unwrap().unwrap();
    assert_eq!(record.duration, 300);
    assert_eq!(record.max_uses, 10);
}

#[tokio::test]
async fn add_license_rejects_duplicates_and_bad_input() {
    let app = build_router(test_state());

    let body = json!({"hwid": "HWID-1", "username": "alice"});
    let (status, _) = post_admin(&app, "/admin/add_license", body.clone()).await;
    assert_eq!(status, StatusCode::OK);

    // Duplicate id.
    let (status, response) = post_admin(&app, "/admin/add_license", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["message"], "License already exists");

    // Missing username.
    let (status, _) = post_admin(&app, "/admin/add_license", json!({"hwid": "HWID-2"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Negative duration.
    let (status, _) = post_admin(
        &app,
        "/admin/add_license",
        json!({"hwid": "HWID-2", "username": "bob", "duration": -5}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Out-of-range max_uses.
    let (status, _) = post_admin(
        &app,
        "/admin/add_license",
        json!({"hwid": "HWID-2", "username": "bob", "max_uses": 0}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Reset
// ============================================================================

#[tokio::test]
async fn reset_returns_license_to_unactivated() {
    let state = test_state();
    state
        .table
        .insert(LicenseRecord::new("HWID-1", "alice", 300, 10).unwrap())
        .unwrap();
    let app = build_router(state.clone());

    // Activate and use it.
    let (_, body) = post_raw(&app, "/check_license", json!({"hwid": "HWID-1"})).await;
    assert_eq!(body["message"], "License activated");

    let (status, _) = post_admin(&app, "/admin/reset_license", json!({"hwid": "HWID-1"})).await;
    assert_eq!(status, StatusCode::OK);

    let record = state.table.get("HWID-1").unwrap().unwrap();
    assert!(!record.is_activated());
    assert_eq!(record.use_count, 0);
    assert_eq!(record.last_used_at, 0);

    // The next validation is a fresh activation.
    let (_, body) = post_raw(&app, "/check_license", json!({"hwid": "HWID-1"})).await;
    assert_eq!(body["message"], "License activated");
    assert_eq!(body["use_count"], 1);
}

#[tokio::test]
async fn reset_unknown_id_is_404() {
    let app = build_router(test_state());

    let (status, response) =
        post_admin(&app, "/admin/reset_license", json!({"hwid": "HWID-NOPE"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(response["message"], "License not found");
}

// ============================================================================
// Extend
// ============================================================================

#[tokio::test]
async fn extend_lengthens_window_without_touching_activation() {
    let state = test_state();
    let mut record = LicenseRecord::new("HWID-1", "alice", 300, 10).unwrap();
    record.activated_at = 1_700_000_000;
    state.table.insert(record).unwrap();
    let app = build_router(state.clone());

    let (status, _) = post_admin(
        &app,
        "/admin/extend_license",
        json!({"hwid": "HWID-1", "minutes": 5}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let record = state.table.get("HWID-1").unwrap().unwrap();
    assert_eq!(record.duration, 300 + 5 * 60);
    assert_eq!(record.activated_at, 1_700_000_000);
}

#[tokio::test]
async fn extend_rejects_bad_minutes_and_unknown_id() {
    let state = test_state();
    state
        .table
        .insert(LicenseRecord::new("HWID-1", "alice", 300, 10).unwrap())
        .unwrap();
    let app = build_router(state);

    let (status, _) = post_admin(
        &app,
        "/admin/extend_license",
        json!({"hwid": "HWID-1", "minutes": 0}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_admin(
        &app,
        "/admin/extend_license",
        json!({"hwid": "HWID-NOPE", "minutes": 5}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn delete_removes_record_then_validation_fails() {
    let state = test_state();
    state
        .table
        .insert(LicenseRecord::new("HWID-1", "alice", 300, 10).unwrap())
        .unwrap();
    let app = build_router(state);

    let (status, _) = post_admin(&app, "/admin/delete_license", json!({"hwid": "HWID-1"})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_raw(&app, "/check_license", json!({"hwid": "HWID-1"})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "License not found");

    let (status, _) = post_admin(&app, "/admin/delete_license", json!({"hwid": "HWID-1"})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Edit max uses
// ============================================================================

#[tokio::test]
async fn edit_max_uses_overwrites_ceiling() {
    let state = test_state();
    state
        .table
        .insert(LicenseRecord::new("HWID-1", "alice", 300, 10).unwrap())
        .unwrap();
    let app = build_router(state.clone());

    let (status, _) = post_admin(
        &app,
        "/admin/edit_max_uses",
        json!({"hwid": "HWID-1", "max_uses": 500}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.table.get("HWID-1").unwrap().unwrap().max_uses, 500);
}

#[tokio::test]
async fn edit_max_uses_validates_range() {
    let state = test_state();
    state
        .table
        .insert(LicenseRecord::new("HWID-1", "alice", 300, 10).unwrap())
        .unwrap();
    let app = build_router(state);

    for bad in [0, 1001] {
        let (status, _) = post_admin(
            &app,
            "/admin/edit_max_uses",
            json!({"hwid": "HWID-1", "max_uses": bad}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    let (status, _) = post_admin(
        &app,
        "/admin/edit_max_uses",
        json!({"hwid": "HWID-NOPE", "max_uses": 5}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lowering_max_uses_exhausts_immediately() {
    let state = test_state();
    state
        .table
        .insert(LicenseRecord::new("HWID-1", "alice", 300, 10).unwrap())
        .unwrap();
    let app = build_router(state);

    // Use it twice.
    post_raw(&app, "/check_license", json!({"hwid": "HWID-1"})).await;
    post_raw(&app, "/check_license", json!({"hwid": "HWID-1"})).await;

    // Lower the ceiling below the current count.
    let (status, _) = post_admin(
        &app,
        "/admin/edit_max_uses",
        json!({"hwid": "HWID-1", "max_uses": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_raw(&app, "/check_license", json!({"hwid": "HWID-1"})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Usage limit exceeded");
}

// ============================================================================
// Listing
// ============================================================================

#[tokio::test]
async fn listing_reports_states_and_counts() {
    let state = test_state();
    state
        .table
        .insert(LicenseRecord::new("HWID-A", "alice", 300, 10).unwrap())
        .unwrap();
    state
        .table
        .insert(LicenseRecord::new("HWID-B", "bob", 300, 1).unwrap())
        .unwrap();
    let app = build_router(state);

    // Activate A; exhaust B.
    post_raw(&app, "/check_license", json!({"hwid": "HWID-A"})).await;
    post_raw(&app, "/check_license", json!({"hwid": "HWID-B"})).await;

    let (status, body) = get_raw(&app, &format!("/admin/licenses?key={ADMIN_KEY}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["active"], 1);
    assert_eq!(body["expired"], 1);

    let licenses = body["licenses"].as_array().unwrap();
    assert_eq!(licenses.len(), 2);
    assert_eq!(licenses[0]["device_id"], "HWID-A");
    assert_eq!(licenses[0]["status"], "active");
    assert_eq!(licenses[1]["device_id"], "HWID-B");
    assert_eq!(licenses[1]["status"], "exhausted");
}
