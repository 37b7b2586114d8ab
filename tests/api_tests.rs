// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP API tests against the in-memory stack.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;
use common::{assert_close, body_json, create_offline_app, create_test_app};

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

#[tokio::test]
async fn test_health_check() {
    let (app, _ctx) = create_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_add_commit_and_read_today() {
    let (app, _ctx) = create_test_app();

    let (status, added) = send(
        &app,
        "POST",
        "/health/fitness/users/u1/workouts/Squat?reps=20&sets=6&duration=60",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_close(added["calories_burned"].as_f64().unwrap(), 720.0);

    let (status, pending) = send(&app, "GET", "/health/fitness/users/u1/pending", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(pending["workouts"].as_array().unwrap().len(), 1);

    let (status, saved) = send(&app, "POST", "/health/fitness/users/u1/save-workouts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["fitness_id"], "u1_2026-10-14");
    assert_eq!(saved["fitness_date"], "2026-10-14");

    let (status, today) = send(&app, "GET", "/health/fitness/users/u1/today", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(today, saved);

    let (_, pending) = send(&app, "GET", "/health/fitness/users/u1/pending", None).await;
    assert!(pending["workouts"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_workout_name_with_spaces() {
    let (app, _ctx) = create_test_app();
    let (status, added) = send(
        &app,
        "POST",
        "/health/fitness/users/u1/workouts/push%20ups",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(added["workout_name"], "Push Ups");
    assert_eq!(added["calories_burned"], 50.0);
}

#[tokio::test]
async fn test_unknown_workout_is_404() {
    let (app, _ctx) = create_test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/health/fitness/users/u1/workouts/Moonwalk",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_catalog_unavailable_is_502() {
    let (app, ctx) = create_test_app();
    ctx.catalog.set_unavailable(true);
    let (status, body) = send(&app, "POST", "/health/fitness/users/u1/workouts/Squat", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream_unavailable");
}

#[tokio::test]
async fn test_invalid_performance_query() {
    let (app, _ctx) = create_test_app();

    let (status, _) = send(
        &app,
        "POST",
        "/health/fitness/users/u1/workouts/Squat?reps=-3",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        "POST",
        "/health/fitness/users/u1/workouts/Squat?duration=99999",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_custom_workout_flow_and_calories() {
    let (app, _ctx) = create_test_app();

    let (status, _) = send(
        &app,
        "POST",
        "/health/fitness/users/u1/custom-workouts",
        Some(json!({"workout_name": "Run", "duration_minutes": 30, "calories_burned": 300.0})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    send(&app, "POST", "/health/fitness/users/u1/save-workouts", None).await;

    send(
        &app,
        "POST",
        "/health/fitness/users/u1/custom-workouts",
        Some(json!({"workout_name": "Plank", "reps": 1, "sets": 3, "duration_minutes": 5})),
    )
    .await;

    let (status, calories) =
        send(&app, "GET", "/health/fitness/users/u1/today/calories", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_close(calories["committed_calories"].as_f64().unwrap(), 300.0);
    // 0.1 · 1 · 3 · 5
    assert_close(calories["pending_calories"].as_f64().unwrap(), 1.5);
    assert_close(calories["total_calories_burned"].as_f64().unwrap(), 301.5);
    assert_eq!(calories["date"], "2026-10-14");
}

#[tokio::test]
async fn test_custom_workout_validation() {
    let (app, _ctx) = create_test_app();

    let (status, _) = send(
        &app,
        "POST",
        "/health/fitness/users/u1/custom-workouts",
        Some(json!({"workout_name": "", "calories_burned": 10.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/health/fitness/users/u1/custom-workouts",
        Some(json!({"workout_name": "Run", "calories_burned": -10.0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Malformed JSON still gets the JSON error body
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/health/fitness/users/u1/custom-workouts")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "bad_request");
}

#[tokio::test]
async fn test_custom_workout_id_reuse_is_409() {
    let (app, _ctx) = create_test_app();
    let body = json!({"workout_id": "morning-run", "workout_name": "Run", "calories_burned": 300.0});

    let (status, created) = send(
        &app,
        "POST",
        "/health/fitness/users/u1/custom-workouts",
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["workout_id"], "morning-run");

    let (status, error) = send(
        &app,
        "POST",
        "/health/fitness/users/u1/custom-workouts",
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(error["error"], "conflict");

    let (_, pending) = send(&app, "GET", "/health/fitness/users/u1/pending", None).await;
    assert_eq!(pending["workouts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_user_id_too_long() {
    let (app, _ctx) = create_test_app();
    let long_user = "a".repeat(129);
    let (status, _) = send(
        &app,
        "GET",
        &format!("/health/fitness/users/{}/today", long_user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_save_with_nothing_pending_is_400() {
    let (app, _ctx) = create_test_app();
    let (status, body) = send(&app, "POST", "/health/fitness/users/u1/save-workouts", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_update_without_aggregate_is_404() {
    let (app, _ctx) = create_test_app();
    send(&app, "POST", "/health/fitness/users/u1/workouts/Squat", None).await;
    let (status, _) = send(&app, "POST", "/health/fitness/users/u1/update-workouts", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_today_without_record_is_404() {
    let (app, _ctx) = create_test_app();
    let (status, body) = send(&app, "GET", "/health/fitness/users/u1/today", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["details"].as_str().unwrap().contains("u1"));
}

#[tokio::test]
async fn test_edit_and_delete_workout() {
    let (app, _ctx) = create_test_app();
    send(&app, "POST", "/health/fitness/users/u1/workouts/Squat", None).await;
    send(&app, "POST", "/health/fitness/users/u1/workouts/Push%20Ups", None).await;
    let (_, saved) = send(&app, "POST", "/health/fitness/users/u1/save-workouts", None).await;
    let workout_id = saved["workout_list"][0]["workout_id"].as_str().unwrap().to_string();

    let (status, edited) = send(
        &app,
        "PUT",
        &format!("/health/fitness/records/u1_2026-10-14/workouts/{}", workout_id),
        Some(json!({
            "workout_name": "Squat",
            "reps": 20,
            "sets": 6,
            "duration_minutes": 60,
            "workout_type": "Strength"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(edited["success"], true);
    assert_close(
        edited["record"]["total_calories_burned"].as_f64().unwrap(),
        770.0,
    );

    let (status, deleted) = send(
        &app,
        "DELETE",
        &format!("/health/fitness/records/u1_2026-10-14/workouts/{}", workout_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["record"]["workout_list"].as_array().unwrap().len(), 1);
    assert_close(
        deleted["record"]["total_calories_burned"].as_f64().unwrap(),
        50.0,
    );

    let (status, body) = send(
        &app,
        "DELETE",
        &format!("/health/fitness/records/u1_2026-10-14/workouts/{}", workout_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["details"].as_str().unwrap().contains("Workout with ID"));
}

#[tokio::test]
async fn test_delete_today_workout() {
    let (app, _ctx) = create_test_app();
    send(&app, "POST", "/health/fitness/users/u1/workouts/Squat", None).await;
    let (_, saved) = send(&app, "POST", "/health/fitness/users/u1/save-workouts", None).await;
    let workout_id = saved["workout_list"][0]["workout_id"].as_str().unwrap().to_string();

    let (status, deleted) = send(
        &app,
        "DELETE",
        &format!("/health/fitness/users/u1/today/workouts/{}", workout_id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["record"]["total_calories_burned"], 0.0);
}

#[tokio::test]
async fn test_get_record_by_id() {
    let (app, _ctx) = create_test_app();
    send(&app, "POST", "/health/fitness/users/u1/workouts/Squat", None).await;
    send(&app, "POST", "/health/fitness/users/u1/save-workouts", None).await;

    let (status, record) = send(&app, "GET", "/health/fitness/records/u1_2026-10-14", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(record["user_id"], "u1");

    let (status, _) = send(&app, "GET", "/health/fitness/records/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_records_by_range() {
    let (app, _ctx) = create_test_app();
    send(&app, "POST", "/health/fitness/users/u1/workouts/Squat", None).await;
    send(&app, "POST", "/health/fitness/users/u1/save-workouts", None).await;

    let (status, records) = send(
        &app,
        "GET",
        "/health/fitness/users/u1/records?start=2026-10-01&end=2026-10-15",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(records.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        "GET",
        "/health/fitness/users/u1/records?start=2026-09-01&end=2026-10-01",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_records_by_range_validation() {
    let (app, _ctx) = create_test_app();

    for uri in [
        "/health/fitness/users/u1/records?start=yesterday&end=2026-10-15",
        "/health/fitness/users/u1/records?start=2026-10-15&end=2026-10-01",
        "/health/fitness/users/u1/records?start=2026-10-01",
    ] {
        let (status, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(body["error"], "bad_request", "{uri}");
    }
}

#[tokio::test]
async fn test_offline_store_is_500_without_details() {
    let app = create_offline_app();
    let (status, body) = send(&app, "GET", "/health/fitness/users/u1/today", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "persistence_error");
    assert!(body.get("details").is_none());

    // Adding to the buffer does not touch the store
    let (status, _) = send(&app, "POST", "/health/fitness/users/u1/workouts/Squat", None).await;
    assert_eq!(status, StatusCode::CREATED);
}
