use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use rideflow::api::rest::router;
use rideflow::state::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;

fn setup() -> axum::Router {
    router(Arc::new(AppState::new(64)))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn car_rule_body() -> Value {
    json!({
        "category": "car",
        "vehicle_type": "sedan",
        "vehicle_model": "dzire",
        "trip_type": "one-way",
        "distance_tiers": [
            { "threshold_km": 50.0, "rate_per_km": 12.0 },
            { "threshold_km": 100.0, "rate_per_km": 10.0 },
            { "threshold_km": 150.0, "rate_per_km": 9.0 },
            { "threshold_km": 200.0, "rate_per_km": 8.0 },
            { "threshold_km": 250.0, "rate_per_km": 7.0 },
            { "threshold_km": 300.0, "rate_per_km": 6.0 }
        ]
    })
}

fn auto_rule_body() -> Value {
    json!({
        "category": "auto",
        "vehicle_type": "rickshaw",
        "vehicle_model": "bajaj",
        "trip_type": "one-way",
        "fixed_price": 120.0
    })
}

async fn seed_rule(app: &axum::Router, body: Value) -> Value {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/pricing-rules", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

fn booking_body(distance_km: f64, payment_method: &str) -> Value {
    json!({
        "vehicle_id": "00000000-0000-0000-0000-000000000001",
        "rider_id": "00000000-0000-0000-0000-000000000002",
        "category": "car",
        "vehicle_type": "sedan",
        "vehicle_model": "dzire",
        "fuel_type": "petrol",
        "pickup": "Anna Nagar",
        "destination": "Airport",
        "scheduled_at": "2025-06-10T10:00:00Z",
        "trip_type": "one-way",
        "distance_km": distance_km,
        "payment_method": payment_method
    })
}

fn driver_actor() -> Value {
    json!({ "role": "driver", "id": "00000000-0000-0000-0000-000000000010" })
}

fn admin_actor() -> Value {
    json!({ "role": "admin", "id": "00000000-0000-0000-0000-000000000020" })
}

async fn transition(app: &axum::Router, booking_id: &str, event: &str, actor: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/bookings/{booking_id}/transition"),
            json!({ "event": event, "actor": actor }),
        ))
        .await
        .unwrap();

    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn health_returns_ok() {
    let app = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["pricing_rules"], 0);
    assert_eq!(body["bookings"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("active_pricing_rules"));
}

#[tokio::test]
async fn auto_rule_without_fixed_price_is_rejected() {
    let app = setup();
    let mut body = auto_rule_body();
    body["fixed_price"] = json!(0.0);

    let response = app
        .oneshot(json_request("POST", "/pricing-rules", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_pricing_rule_is_a_conflict() {
    let app = setup();
    seed_rule(&app, car_rule_body()).await;

    let response = app
        .oneshot(json_request("POST", "/pricing-rules", car_rule_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn auto_fare_is_distance_independent() {
    let app = setup();
    seed_rule(&app, auto_rule_body()).await;

    for distance in [3.0, 42.0] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/fare/quote",
                json!({
                    "category": "auto",
                    "vehicle_type": "rickshaw",
                    "vehicle_model": "bajaj",
                    "trip_type": "one-way",
                    "fuel_type": "cng",
                    "distance_km": distance,
                    "scheduled_at": "2025-06-10T10:00:00Z"
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["base_fare"], 120.0);
        assert_eq!(body["gst_amount"], 6.0);
        assert_eq!(body["total_amount"], 126.0);
    }
}

#[tokio::test]
async fn hundred_km_car_fare_uses_hundred_km_band() {
    let app = setup();
    seed_rule(&app, car_rule_body()).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/fare/quote",
            json!({
                "category": "car",
                "vehicle_type": "sedan",
                "vehicle_model": "dzire",
                "trip_type": "one-way",
                "fuel_type": "petrol",
                "distance_km": 100.0,
                "scheduled_at": "2025-06-10T10:00:00Z"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["base_fare"], 1000.0);
    assert_eq!(body["gst_amount"], 50.0);
    assert_eq!(body["total_amount"], 1050.0);
    assert_eq!(body["rate_per_km"], 10.0);
    assert_eq!(body["distance_tier_used"], "100km");
}

#[tokio::test]
async fn quote_without_matching_rule_is_not_found() {
    let app = setup();

    let response = app
        .oneshot(json_request(
            "POST",
            "/fare/quote",
            json!({
                "category": "bus",
                "vehicle_type": "coach",
                "vehicle_model": "volvo",
                "trip_type": "return",
                "fuel_type": "diesel",
                "distance_km": 80.0,
                "scheduled_at": "2025-06-10T10:00:00Z"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_positive_distance_is_a_bad_request() {
    let app = setup();
    seed_rule(&app, car_rule_body()).await;

    let response = app
        .oneshot(json_request("POST", "/bookings", booking_body(0.0, "cash")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn online_booking_splits_payment_twenty_eighty() {
    let app = setup();
    seed_rule(&app, car_rule_body()).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/bookings",
            booking_body(100.0, "online"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["status"], "pending");
    assert_eq!(body["pricing"]["total_amount"], 1050.0);
    assert_eq!(body["payment"]["is_partial_payment"], true);
    assert_eq!(body["payment"]["partial"]["online_amount"], 210.0);
    assert_eq!(body["payment"]["partial"]["cash_amount"], 840.0);
    assert_eq!(body["payment"]["partial"]["online_status"], "paid");
    assert_eq!(body["payment"]["partial"]["cash_status"], "pending");
}

#[tokio::test]
async fn cash_booking_has_no_split() {
    let app = setup();
    seed_rule(&app, car_rule_body()).await;

    let response = app
        .oneshot(json_request("POST", "/bookings", booking_body(100.0, "cash")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    assert_eq!(body["payment"]["is_partial_payment"], false);
    assert!(body["payment"]["partial"].is_null());
}

#[tokio::test]
async fn full_lifecycle_then_cancel_is_rejected() {
    let app = setup();
    seed_rule(&app, car_rule_body()).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/bookings",
            booking_body(100.0, "online"),
        ))
        .await
        .unwrap();
    let booking = body_json(response).await;
    let id = booking["id"].as_str().unwrap().to_string();

    let (status, body) = transition(&app, &id, "accept", driver_actor()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");

    let (status, body) = transition(&app, &id, "start", driver_actor()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "started");

    let (status, body) = transition(&app, &id, "complete", driver_actor()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");

    let (status, body) = transition(&app, &id, "cancel", admin_actor()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("cannot cancel"));
}

#[tokio::test]
async fn started_booking_rejects_cancel() {
    let app = setup();
    seed_rule(&app, car_rule_body()).await;

    let response = app
        .clone()
        .oneshot(json_request("POST", "/bookings", booking_body(100.0, "cash")))
        .await
        .unwrap();
    let booking = body_json(response).await;
    let id = booking["id"].as_str().unwrap().to_string();

    transition(&app, &id, "accept", driver_actor()).await;
    transition(&app, &id, "start", driver_actor()).await;

    let (status, _) = transition(&app, &id, "cancel", admin_actor()).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn cash_collection_after_completion() {
    let app = setup();
    seed_rule(&app, car_rule_body()).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/bookings",
            booking_body(100.0, "online"),
        ))
        .await
        .unwrap();
    let booking = body_json(response).await;
    let id = booking["id"].as_str().unwrap().to_string();

    // Too early: nothing to collect before the trip completes.
    let early = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/bookings/{id}/collect-cash"),
            json!({ "actor": driver_actor() }),
        ))
        .await
        .unwrap();
    assert_eq!(early.status(), StatusCode::CONFLICT);

    transition(&app, &id, "accept", driver_actor()).await;
    transition(&app, &id, "start", driver_actor()).await;
    transition(&app, &id, "complete", driver_actor()).await;

    let collected = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/bookings/{id}/collect-cash"),
            json!({ "actor": driver_actor() }),
        ))
        .await
        .unwrap();
    assert_eq!(collected.status(), StatusCode::OK);
    let body = body_json(collected).await;
    assert_eq!(body["payment"]["partial"]["cash_status"], "collected");

    let again = app
        .oneshot(json_request(
            "POST",
            &format!("/bookings/{id}/collect-cash"),
            json!({ "actor": driver_actor() }),
        ))
        .await
        .unwrap();
    assert_eq!(again.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn booking_pricing_survives_rule_deletion() {
    let app = setup();
    let rule = seed_rule(&app, car_rule_body()).await;
    let rule_id = rule["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json_request("POST", "/bookings", booking_body(100.0, "cash")))
        .await
        .unwrap();
    let booking = body_json(response).await;
    let id = booking["id"].as_str().unwrap().to_string();

    let deleted = app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/pricing-rules/{rule_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);

    let fetched = app
        .oneshot(get_request(&format!("/bookings/{id}")))
        .await
        .unwrap();
    let body = body_json(fetched).await;
    assert_eq!(body["pricing"]["total_amount"], 1050.0);
    assert_eq!(body["pricing"]["rate_per_km"], 10.0);
    assert_eq!(body["pricing"]["distance_tier_used"], "100km");
}

#[tokio::test]
async fn unknown_booking_transition_is_not_found() {
    let app = setup();

    let (status, _) = transition(
        &app,
        "00000000-0000-0000-0000-0000000000ff",
        "accept",
        driver_actor(),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
