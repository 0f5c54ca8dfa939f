use std::path::PathBuf;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use travelwise_api::build_app;

const API_KEY: &str = "dev-travelwise-key";

fn data_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data")
}

async fn app() -> Router {
    build_app(data_root()).await.expect("app should build")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-api-key", API_KEY)
        .header("x-user-id", "asha")
        .body(Body::empty())
        .unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", API_KEY)
        .header("x-user-id", "asha")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, parsed)
}

#[tokio::test]
async fn health_is_public_and_reports_dataset() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert!(response.headers().get("x-request-id").is_some());

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let parsed: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["dataset"]["cities"], 10);
    assert_eq!(parsed["capabilities"]["storage"], "memory");
}

#[tokio::test]
async fn suggestions_require_api_key() {
    let app = app().await;

    let request = Request::builder()
        .method("POST")
        .uri("/v1/suggestions")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"destination": "Jaipur", "budget": "budget", "travel_style": "solo"})
                .to_string(),
        ))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn allowed_origin_passes_without_key() {
    let app = app().await;

    let request = Request::builder()
        .uri("/v1/destinations/autocomplete?q=ja")
        .header("origin", "http://localhost:5173")
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cities"][0]["city"], "Jaipur");
}

#[tokio::test]
async fn origin_bypass_only_matches_listed_origins() {
    let app = app().await;
    let request = |origin: &str| {
        Request::builder()
            .uri("/v1/destinations/autocomplete?q=ja")
            .header("origin", origin)
            .body(Body::empty())
            .unwrap()
    };

    let (status, _) = send(&app, request("http://localhost:5173/")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, request("https://evil.example")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn suggestions_resolve_from_dataset_when_offline() {
    let app = app().await;

    let (status, body) = send(
        &app,
        post(
            "/v1/suggestions",
            json!({
                "destination": "jaipur",
                "budget": "luxury",
                "travel_style": "couple",
                "interests": ["history", "food"]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resolved_by"], "dataset");
    assert_eq!(body["suggestions"][0]["place"], "Jaipur");
    assert_eq!(body["suggestions"][0]["source"], "dataset");
    assert_eq!(body["attempts"][0]["outcome"], "skipped");
}

#[tokio::test]
async fn suggestions_accept_capitalised_form_labels() {
    let app = app().await;

    let (status, body) = send(
        &app,
        post(
            "/v1/suggestions",
            json!({
                "destination": "Mumbai",
                "budget": "Mid-range",
                "travel_style": "Couple",
                "interests": ["beaches"]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suggestions"][0]["place"], "Mumbai");

    let (status, plan) = send(
        &app,
        post(
            "/v1/plan",
            json!({
                "destination": "Jaipur",
                "budget": "Luxury",
                "travel_style": "Family",
                "duration": 1,
                "start_date": "2025-01-06"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plan["budget"], "luxury");
    assert_eq!(plan["travel_style"], "family");
}

#[tokio::test]
async fn start_dates_at_the_calendar_end_are_bad_requests() {
    let app = app().await;

    let (status, body) = send(
        &app,
        get("/v1/weather/forecast?city=Mumbai&days=5&start=%2B262142-12-31"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");

    let (status, _) = send(
        &app,
        get("/v1/weather/outfit?city=Mumbai&day=3&start=%2B262142-12-31"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post(
            "/v1/plan",
            json!({
                "destination": "Mumbai",
                "budget": "budget",
                "travel_style": "solo",
                "duration": 3,
                "start_date": "+262142-12-31"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, feed) = send(&app, get("/v1/notifications")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed["unread_count"], 0);
}

#[tokio::test]
async fn unknown_destination_falls_back() {
    let app = app().await;

    let (status, body) = send(
        &app,
        post(
            "/v1/suggestions",
            json!({"destination": "Atlantis", "budget": "budget", "travel_style": "friends"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resolved_by"], "fallback");
    assert_eq!(body["suggestions"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn blank_destination_and_bad_json_are_bad_requests() {
    let app = app().await;

    let (status, body) = send(
        &app,
        post(
            "/v1/suggestions",
            json!({"destination": "   ", "budget": "budget", "travel_style": "solo"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_request");

    let (status, body) = send(
        &app,
        post(
            "/v1/plan",
            json!({"destination": "Mumbai", "budget": "cheap", "travel_style": "solo"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_json");
}

#[tokio::test]
async fn plan_builds_days_and_notifies() {
    let app = app().await;

    let (status, plan) = send(
        &app,
        post(
            "/v1/plan",
            json!({
                "destination": "Mumbai",
                "budget": "mid-range",
                "travel_style": "family",
                "interests": ["beaches"],
                "duration": 2,
                "start_date": "2025-01-06"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(plan["destination"], "Mumbai");
    assert_eq!(plan["days"].as_array().unwrap().len(), 2);
    assert_eq!(plan["days"][0]["date"], "Monday, January 6, 2025");
    assert_eq!(plan["days"][0]["activities"].as_array().unwrap().len(), 5);

    let (status, feed) = send(&app, get("/v1/notifications")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed["unread_count"], 1);
    let id = feed["notifications"][0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app, post(&format!("/v1/notifications/{id}/read"), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unread_count"], 0);

    let (status, _) = send(&app, post("/v1/notifications/missing/read", json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn restaurant_deck_saves_loved_cards() {
    let app = app().await;

    let (status, step) = send(&app, post("/v1/cities/Mumbai/restaurants/next", json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(step["card"]["name"], "Trishna");

    let (status, step) = send(
        &app,
        post(
            "/v1/cities/Mumbai/restaurants/next",
            json!({"current": 0, "action": "love", "viewed": step["viewed"]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(step["saved"], true);
    assert_eq!(step["card"]["name"], "Leopold Cafe");

    let (status, saved) = send(&app, get("/v1/saved")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["items"][0]["name"], "Trishna");
    assert_eq!(saved["items"][0]["kind"], "restaurant");

    let (status, _) = send(&app, get("/v1/cities/Atlantis/restaurants")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn saving_twice_is_idempotent() {
    let app = app().await;
    let item = json!({"kind": "attraction", "name": "Hawa Mahal", "city": "Jaipur"});

    let (status, body) = send(&app, post("/v1/saved", item.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["saved"], true);

    let (status, body) = send(&app, post("/v1/saved", item)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["saved"], false);

    let (status, _) = send(
        &app,
        post("/v1/saved", json!({"kind": "hotel", "name": "Taj", "city": "Mumbai"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn attractions_and_place_details_use_curated_notes() {
    let app = app().await;

    let (status, body) = send(&app, get("/v1/cities/mumbai/attractions")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cards"][0]["name"], "Gateway of India");
    assert!(body["cards"][0]["description"]
        .as_str()
        .unwrap()
        .starts_with("Iconic arch monument"));

    let (status, body) = send(
        &app,
        get("/v1/places/details?place=Red%20Fort&city=Delhi"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["state"], "Delhi");
    assert_eq!(body["info"]["category"], "historical");
}

#[tokio::test]
async fn nearest_destination_and_weather() {
    let app = app().await;

    let (status, body) = send(&app, get("/v1/destinations/nearest?lat=18.52&lng=73.85")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "Pune");

    let (status, _) = send(&app, get("/v1/destinations/nearest?lat=0&lng=0")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &app,
        get("/v1/weather/forecast?city=Delhi&days=3&start=2025-01-06"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["days"].as_array().unwrap().len(), 3);

    let (status, body) = send(&app, get("/v1/weather/outfit?city=Delhi&day=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "Delhi");
    assert!(!body["style_tips"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn pricing_is_public() {
    let app = app().await;

    let request = Request::builder()
        .uri("/v1/pricing?cycle=annual")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cycle"], "annual");
    assert_eq!(body["trial_days"], 14);

    let request = Request::builder()
        .uri("/v1/pricing?cycle=weekly")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
