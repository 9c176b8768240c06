//! Consume endpoint integration tests over the in-memory task store.

mod helpers;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

use helpers::{
    build_router, build_state, setup_test_app, setup_test_app_with,
    setup_test_app_with_done_outcome, test_config, DoneOutcome, InstantWork,
};
use taskflow_consumer::SleepSimulator;
use taskflow_core::{TaskState, TaskType, TaskValue};
use taskflow_db::TaskStore;

fn t(raw: i32) -> TaskType {
    TaskType::new(raw).unwrap()
}

#[tokio::test]
async fn test_consume_processes_matching_task() {
    let app = setup_test_app().await;
    let id = app.seed(3, 50).await;

    let response = app
        .server
        .post("/consume")
        .form(&[("type", "3"), ("value", "50")])
        .await;

    response.assert_status_ok();
    assert_eq!(response.text(), "Task processed");

    let task = app.store.get_task(id).await.unwrap().unwrap();
    assert_eq!(task.state, TaskState::Done);

    let metrics = &app.state.metrics;
    assert_eq!(metrics.done(t(3)), 1);
    assert_eq!(metrics.processed(t(3)), 1);
    assert_eq!(metrics.value_total(t(3)), 50);
    assert_eq!(metrics.in_processing(t(3)), 0);
    assert_eq!(app.state.ledger.total(t(3)).await, 50);
}

#[tokio::test]
async fn test_consume_without_match_returns_404() {
    let app = setup_test_app().await;
    app.seed(3, 49).await;

    let response = app
        .server
        .post("/consume")
        .form(&[("type", "3"), ("value", "50")])
        .await;

    response.assert_status(StatusCode::NOT_FOUND);

    let metrics = &app.state.metrics;
    assert_eq!(metrics.done(t(3)), 0);
    assert_eq!(metrics.processed(t(3)), 0);
    assert_eq!(metrics.value_total(t(3)), 0);
    assert_eq!(app.store.count_by_state(TaskState::Received).await.unwrap(), 1);
}

#[tokio::test]
async fn test_consume_rejects_invalid_input() {
    let app = setup_test_app().await;
    app.seed(3, 50).await;

    for form in [
        vec![("type", "abc"), ("value", "50")],
        vec![("type", "3"), ("value", "")],
        vec![("type", "10"), ("value", "50")],
        vec![("type", "3"), ("value", "100")],
        vec![("value", "50")],
        vec![("type", " 3"), ("value", "50")],
    ] {
        let response = app.server.post("/consume").form(&form).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    // Not a form at all
    let response = app.server.post("/consume").text("type=3&value=50").await;
    response.assert_status(StatusCode::BAD_REQUEST);

    assert_eq!(app.store.count_by_state(TaskState::Received).await.unwrap(), 1);
}

#[tokio::test]
async fn test_burst_exhaustion_returns_429() {
    let app = setup_test_app_with(test_config("0.01", "2"), Arc::new(InstantWork)).await;
    let id = app.seed(1, 1).await;

    for _ in 0..2 {
        app.server
            .post("/consume")
            .form(&[("type", "9"), ("value", "9")])
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    let response = app
        .server
        .post("/consume")
        .form(&[("type", "1"), ("value", "1")])
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().get(header::RETRY_AFTER).is_some());

    // Rejected before the claim: the matching task is untouched
    let task = app.store.get_task(id).await.unwrap().unwrap();
    assert_eq!(task.state, TaskState::Received);
    assert_eq!(app.state.metrics.processed(t(1)), 0);
}

#[tokio::test]
async fn test_limiter_refills_after_burst() {
    let app = setup_test_app_with(test_config("20", "1"), Arc::new(InstantWork)).await;
    app.seed(2, 2).await;

    app.server
        .post("/consume")
        .form(&[("type", "5"), ("value", "5")])
        .await
        .assert_status(StatusCode::NOT_FOUND);
    app.server
        .post("/consume")
        .form(&[("type", "2"), ("value", "2")])
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS);

    tokio::time::sleep(Duration::from_millis(120)).await;

    app.server
        .post("/consume")
        .form(&[("type", "2"), ("value", "2")])
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_concurrent_claimants_single_winner() {
    let app = setup_test_app().await;
    let id = app.seed(4, 20).await;

    let requests = (0..6).map(|_| {
        app.server
            .post("/consume")
            .form(&[("type", "4"), ("value", "20")])
            .into_future()
    });
    let responses = futures::future::join_all(requests).await;

    let ok = responses
        .iter()
        .filter(|r| r.status_code() == StatusCode::OK)
        .count();
    let not_found = responses
        .iter()
        .filter(|r| r.status_code() == StatusCode::NOT_FOUND)
        .count();
    assert_eq!(ok, 1);
    assert_eq!(not_found, 5);

    let task = app.store.get_task(id).await.unwrap().unwrap();
    assert_eq!(task.state, TaskState::Done);
    assert_eq!(app.state.metrics.done(t(4)), 1);
    assert_eq!(app.state.metrics.value_total(t(4)), 20);
}

#[tokio::test]
async fn test_duplicates_are_claimed_oldest_first() {
    let app = setup_test_app_with(test_config("1000", "1000"), Arc::new(InstantWork)).await;
    let first = app.seed(6, 6).await;
    let second = app.seed(6, 6).await;

    app.server
        .post("/consume")
        .form(&[("type", "6"), ("value", "6")])
        .await
        .assert_status_ok();

    assert_eq!(
        app.store.get_task(first).await.unwrap().unwrap().state,
        TaskState::Done
    );
    assert_eq!(
        app.store.get_task(second).await.unwrap().unwrap().state,
        TaskState::Received
    );
}

#[tokio::test]
async fn test_unaffected_done_transition_is_not_counted() {
    let app = setup_test_app_with_done_outcome(DoneOutcome::NoRowAffected).await;
    let id = app.seed(5, 30).await;

    let response = app
        .server
        .post("/consume")
        .form(&[("type", "5"), ("value", "30")])
        .await;

    // The work ran, so the request still succeeds
    response.assert_status_ok();
    assert_eq!(response.text(), "Task processed");

    let metrics = &app.state.metrics;
    assert_eq!(metrics.processed(t(5)), 1);
    assert_eq!(metrics.done(t(5)), 0);
    assert_eq!(metrics.value_total(t(5)), 0);
    assert_eq!(metrics.in_processing(t(5)), 0);
    assert_eq!(app.state.ledger.total(t(5)).await, 0);

    let task = app.store.get_task(id).await.unwrap().unwrap();
    assert_eq!(task.state, TaskState::Processing);
}

#[tokio::test]
async fn test_failed_done_transition_returns_500() {
    let app = setup_test_app_with_done_outcome(DoneOutcome::StoreError).await;
    let id = app.seed(2, 12).await;

    let response = app
        .server
        .post("/consume")
        .form(&[("type", "2"), ("value", "12")])
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

    let metrics = &app.state.metrics;
    assert_eq!(metrics.processed(t(2)), 1);
    assert_eq!(metrics.done(t(2)), 0);
    assert_eq!(metrics.value_total(t(2)), 0);
    assert_eq!(metrics.in_processing(t(2)), 0);
    assert_eq!(app.state.ledger.total(t(2)).await, 0);

    // No automatic recovery: the task stays claimed
    let task = app.store.get_task(id).await.unwrap().unwrap();
    assert_eq!(task.state, TaskState::Processing);
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_counters() {
    let app = setup_test_app().await;
    app.seed(3, 50).await;

    app.server
        .post("/consume")
        .form(&[("type", "3"), ("value", "50")])
        .await
        .assert_status_ok();

    let response = app.server.get("/metrics").await;
    response.assert_status_ok();
    let text = response.text();
    assert!(text.contains("tasks_done_total{type=\"3\"} 1"));
    assert!(text.contains("tasks_processed_total{type=\"3\"} 1"));
    assert!(text.contains("total_value_per_task_type{type=\"3\"} 50"));
    assert!(text.contains("tasks_in_processing{type=\"3\"} 0"));
}

#[tokio::test]
async fn test_stats_reports_store_aggregates() {
    let app = setup_test_app_with(test_config("1000", "1000"), Arc::new(InstantWork)).await;
    app.seed(3, 10).await;
    app.seed(3, 15).await;
    app.seed(7, 1).await;

    for value in ["10", "15"] {
        app.server
            .post("/consume")
            .form(&[("type", "3"), ("value", value)])
            .await
            .assert_status_ok();
    }

    let response = app.server.get("/stats").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();

    assert_eq!(body["received"], 1);
    assert_eq!(body["processing"], 0);
    assert_eq!(body["done"], 2);
    assert_eq!(body["totals"][0]["type"], 3);
    assert_eq!(body["totals"][0]["done_count"], 2);
    assert_eq!(body["totals"][0]["value_total"], 25);
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = setup_test_app().await;

    app.server.get("/health/live").await.assert_status_ok();
    app.server.get("/health/ready").await.assert_status_ok();
}

#[tokio::test]
async fn test_disconnected_client_still_completes_task() {
    let (state, store) = build_state(test_config("1000", "1000"), Arc::new(SleepSimulator));
    let id = store.insert(t(8), TaskValue::new(99).unwrap()).await.unwrap();
    let router = build_router(state.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/consume")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("type=8&value=99"))
        .unwrap();

    // Drop the request future well before the 99ms of work ends
    let outcome = tokio::time::timeout(Duration::from_millis(20), router.oneshot(request)).await;
    assert!(outcome.is_err());

    for _ in 0..100 {
        if state.metrics.done(t(8)) == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(state.metrics.done(t(8)), 1);
    let task = store.get_task(id).await.unwrap().unwrap();
    assert_eq!(task.state, TaskState::Done);
}
