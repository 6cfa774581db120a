use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::rating::router::rating_router;
use crate::rating::service::RatingService;
use crate::rating::signals::SignalLedger;

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("serializable")))
        .expect("request")
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn router() -> (axum::Router, crate::rating::config::FinalRatingConfig) {
    let (service, active) = build_service();
    (rating_router(Arc::new(service)), active)
}

#[tokio::test]
async fn calculate_route_returns_sorted_breakdowns() {
    let (router, active) = router();

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/final-rating/calculate",
            &json!({
                "period_start": "2025-01-01",
                "period_end": "2025-01-31",
                "max_points": 200,
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["period"], json!({"start": "2025-01-01", "end": "2025-01-31"}));
    assert_eq!(body["config"]["id"], json!(active.id.0));
    assert_eq!(body["config"]["version"], json!(1));
    assert_eq!(body["max_points_for_100_percent"], json!(200.0));
    assert_eq!(body["users"][0]["user_id"], json!(1));
    assert_eq!(body["users"][0]["final_percentage"], json!(73.5));
    assert_eq!(
        body["users"][0]["breakdown"]["task_ratings"]["details"][0]["calculation"],
        json!("task_rating(80) × weight(0.5) × user_pct(1) = 40")
    );
    assert!(body["calculated_at"].is_string());
}

#[tokio::test]
async fn malformed_bodies_get_the_json_error_shape() {
    let (router, _) = router();

    let truncated = Request::builder()
        .method("POST")
        .uri("/api/v1/final-rating/calculate")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"period_start\": \"2025-01-01\""))
        .expect("request");
    let missing_field = json_request(
        "POST",
        "/api/v1/final-rating/calculate",
        &json!({"period_start": "2025-01-01", "period_end": "2025-01-31"}),
    );
    let bad_draft = json_request(
        "POST",
        "/api/v1/final-rating/configs",
        &json!({"name": 42}),
    );

    for request in [truncated, missing_field, bad_draft] {
        let response = router.clone().oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = read_json_body(response).await;
        assert!(body["error"].is_string(), "unexpected body {body}");
    }
}

#[tokio::test]
async fn calculate_route_rejects_zero_max_points() {
    let (router, _) = router();

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/final-rating/calculate",
            &json!({
                "period_start": "2025-01-01",
                "period_end": "2025-01-31",
                "max_points": 0,
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("message")
        .contains("max_points"));
}

#[tokio::test]
async fn calculate_route_reports_unknown_config() {
    let (router, _) = router();

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/final-rating/calculate",
            &json!({
                "period_start": "2025-01-01",
                "period_end": "2025-01-31",
                "max_points": 100,
                "config_id": 77,
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_route_lists_every_violation() {
    let (router, _) = router();

    let response = router
        .oneshot(json_request(
            "POST",
            "/api/v1/final-rating/configs",
            &json!({
                "name": "Broken",
                "rules": {
                    "task_ratings": {"enabled": true, "aggregation": "median"},
                    "stakeholder_ratings": {"enabled": false},
                    "help_requests_helper": {"enabled": true, "points_per_help": -1, "max_points": 10},
                    "help_requests_requester": {"enabled": false},
                    "tickets_resolved": {"enabled": true, "points_per_ticket": 1, "max_points": -3}
                }
            }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    let fields: Vec<&str> = body["violations"]
        .as_array()
        .expect("violations")
        .iter()
        .filter_map(|violation| violation["field"].as_str())
        .collect();
    assert_eq!(
        fields,
        vec![
            "task_ratings.aggregation",
            "help_requests_helper.points_per_help",
            "tickets_resolved.max_points",
        ]
    );
}

#[tokio::test]
async fn default_template_can_be_posted_back() {
    let (router, _) = router();

    let response = router
        .clone()
        .oneshot(empty_request("GET", "/api/v1/final-rating/configs/default"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let mut template = read_json_body(response).await;
    assert_eq!(template["rules"]["tickets_resolved"]["max_points"], json!(30.0));
    template["name"] = json!("From template");

    let response = router
        .oneshot(json_request("POST", "/api/v1/final-rating/configs", &template))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["config"]["is_active"], json!(false));
    assert_eq!(body["warnings"], json!([]));
}

#[tokio::test]
async fn activation_swaps_the_active_config() {
    let (router, original) = router();

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/final-rating/configs",
            &json!({
                "name": "Tickets only",
                "rules": {
                    "task_ratings": {"enabled": false},
                    "stakeholder_ratings": {"enabled": false},
                    "help_requests_helper": {"enabled": false},
                    "help_requests_requester": {"enabled": false},
                    "tickets_resolved": {"enabled": true, "points_per_ticket": 2, "max_points": 50}
                }
            }),
        ))
        .await
        .expect("response");
    let created = read_json_body(response).await;
    let id = created["config"]["id"].as_u64().expect("id");

    let response = router
        .clone()
        .oneshot(empty_request(
            "POST",
            &format!("/api/v1/final-rating/configs/{id}/activate"),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .clone()
        .oneshot(empty_request("GET", "/api/v1/final-rating/configs"))
        .await
        .expect("response");
    let listed = read_json_body(response).await;
    let active: Vec<u64> = listed
        .as_array()
        .expect("list")
        .iter()
        .filter(|config| config["is_active"] == json!(true))
        .filter_map(|config| config["id"].as_u64())
        .collect();
    assert_eq!(active, vec![id]);

    let response = router
        .oneshot(empty_request(
            "DELETE",
            &format!("/api/v1/final-rating/configs/{}", original.id),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn deleting_the_active_config_conflicts() {
    let (router, active) = router();

    let response = router
        .oneshot(empty_request(
            "DELETE",
            &format!("/api/v1/final-rating/configs/{}", active.id),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn get_handler_maps_store_outage_to_internal_error() {
    let service = Arc::new(RatingService::new(
        Arc::new(UnavailableStore),
        Arc::new(SignalLedger::default()),
    ));

    let response = crate::rating::router::get_config_handler::<UnavailableStore, SignalLedger>(
        State(service),
        Path(1),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn update_route_bumps_version() {
    let (router, active) = router();
    let template = serde_json::to_value(default_config("Quarterly review v2")).expect("json");

    let response = router
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/final-rating/configs/{}", active.id),
            &template,
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["config"]["version"], json!(2));
    assert_eq!(body["config"]["is_active"], json!(true));
}
