mod error;
mod rate_limit;

use std::env;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Json, Path as AxumPath, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use travelwise_agents::{SwipeAction, TravelPlanner};
use travelwise_core::{
    pricing_plans, BillingCycle, Coordinates, SavedItemKind, TripRequest, TRIAL_DAYS,
};
use travelwise_dataset::{DatasetCatalog, DatasetStats, DEFAULT_NEARBY_RADIUS_KM};
use travelwise_observability::{AppMetrics, MetricsSnapshot};
use travelwise_providers::{AiBackend, PlacesBackend, ProviderConfig, ProviderStack};
use travelwise_storage::Store;

pub use crate::error::ApiError;
use crate::rate_limit::IpRateLimiter;

const MAX_USER_ID_LEN: usize = 64;
const MAX_QUERY_FIELD_LEN: usize = 120;
const DEFAULT_USER_ID: &str = "guest";
const BODY_LIMIT_BYTES: usize = 64 * 1024;

pub type Planner = TravelPlanner<PlacesBackend, AiBackend, Store>;

#[derive(Clone)]
pub struct ApiState {
    pub planner: Arc<Planner>,
    pub metrics: Arc<AppMetrics>,
    pub api_key: String,
    pub limiter: IpRateLimiter,
    pub allowed_origins: Arc<Vec<String>>,
    pub storage_backend: &'static str,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: MetricsSnapshot,
    dataset: DatasetStats,
    capabilities: HealthCapabilities,
}

#[derive(Debug, Serialize)]
struct HealthCapabilities {
    places_api: bool,
    generative_ai: bool,
    storage: &'static str,
}

#[derive(Debug, Deserialize)]
struct PlanRequest {
    #[serde(flatten)]
    trip: TripRequest,
    #[serde(default)]
    start_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct AutocompleteQuery {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Serialize)]
struct CitySummary {
    city: String,
    state: String,
}

#[derive(Debug, Deserialize)]
struct NearestQuery {
    lat: f64,
    lng: f64,
    #[serde(default)]
    radius_km: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PlaceDetailsQuery {
    place: String,
    city: String,
}

#[derive(Debug, Deserialize)]
struct SwipeRequest {
    #[serde(default)]
    current: Option<usize>,
    #[serde(default)]
    action: Option<SwipeAction>,
    #[serde(default)]
    viewed: Vec<usize>,
}

#[derive(Debug, Deserialize)]
struct WeatherQuery {
    city: String,
    #[serde(default)]
    day: Option<u8>,
    #[serde(default)]
    days: Option<u8>,
    #[serde(default)]
    start: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct PricingQuery {
    #[serde(default)]
    cycle: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SaveItemRequest {
    kind: String,
    name: String,
    #[serde(default)]
    city: String,
}

pub async fn build_app(data_root: impl AsRef<Path>) -> Result<Router> {
    let data_root = data_root.as_ref();
    let metrics = AppMetrics::shared();

    let dataset = Arc::new(
        DatasetCatalog::from_data_dir(data_root).context("failed to load travel dataset")?,
    );

    let store = if let Ok(database_url) = env::var("TRAVELWISE_DATABASE_URL") {
        Store::sqlite(&database_url).await?
    } else {
        Store::memory()
    };
    let storage_backend = store.backend_name();

    let providers = ProviderStack::from_config(ProviderConfig::from_env())
        .context("failed to initialize providers")?;
    let places_backend = providers.places.name();

    let planner = Arc::new(TravelPlanner::new(
        dataset,
        providers.places,
        providers.ai,
        Arc::new(store),
        metrics.clone(),
    ));
    info!(
        places = places_backend,
        ai_enabled = planner.ai_enabled(),
        storage = storage_backend,
        cities = planner.dataset().stats().cities,
        "travel planner configured"
    );

    let api_key =
        env::var("TRAVELWISE_API_KEY").unwrap_or_else(|_| "dev-travelwise-key".to_string());
    let rate_limit_window = Duration::from_secs(
        env::var("TRAVELWISE_API_RATE_LIMIT_WINDOW_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(60),
    );
    let rate_limit_max = env::var("TRAVELWISE_API_RATE_LIMIT_MAX")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(80);
    let allowed_origins = parse_allowed_origins();
    info!(
        window_seconds = rate_limit_window.as_secs(),
        max_requests = rate_limit_max,
        allowed_origins = allowed_origins.len(),
        "api guard configured"
    );

    let state = ApiState {
        planner,
        metrics,
        api_key,
        limiter: IpRateLimiter::new(rate_limit_window, rate_limit_max),
        allowed_origins: Arc::new(allowed_origins),
        storage_backend,
    };

    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/suggestions", post(suggestions))
        .route("/v1/plan", post(plan))
        .route("/v1/destinations/autocomplete", get(autocomplete))
        .route("/v1/destinations/nearest", get(nearest_destination))
        .route("/v1/places/details", get(place_details))
        .route("/v1/cities/:city/attractions", get(city_attractions))
        .route("/v1/cities/:city/restaurants", get(city_restaurants))
        .route("/v1/cities/:city/restaurants/next", post(next_restaurant))
        .route("/v1/weather/outfit", get(weather_outfit))
        .route("/v1/weather/forecast", get(weather_forecast))
        .route("/v1/pricing", get(pricing))
        .route("/v1/notifications", get(notifications))
        .route("/v1/notifications/read_all", post(notifications_read_all))
        .route("/v1/notifications/:id/read", post(notification_read))
        .route("/v1/saved", get(saved_list).post(saved_create))
        .layer(build_cors_layer(&state.allowed_origins))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api_key_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .with_state(state)
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
        dataset: state.planner.dataset().stats(),
        capabilities: HealthCapabilities {
            places_api: state.planner.places_live(),
            generative_ai: state.planner.ai_enabled(),
            storage: state.storage_backend,
        },
    };
    (StatusCode::OK, Json(payload))
}

async fn suggestions(
    State(state): State<ApiState>,
    payload: Result<Json<TripRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let report = state.planner.suggest(request).await?;
    Ok((StatusCode::OK, Json(report)).into_response())
}

async fn plan(
    State(state): State<ApiState>,
    headers: HeaderMap,
    payload: Result<Json<PlanRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let user_id = user_id_from_headers(&headers);
    let start = request
        .start_date
        .unwrap_or_else(|| Utc::now().date_naive());

    let plan = state.planner.plan(&user_id, request.trip, start).await?;
    Ok((StatusCode::OK, Json(plan)).into_response())
}

async fn autocomplete(
    State(state): State<ApiState>,
    query: Result<Query<AutocompleteQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let input = sanitize_limited_text(&query.q, MAX_QUERY_FIELD_LEN);
    let cities = state
        .planner
        .dataset()
        .autocomplete(&input)
        .into_iter()
        .map(|record| CitySummary {
            city: record.city.clone(),
            state: record.state.clone(),
        })
        .collect::<Vec<_>>();

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "query": input, "cities": cities })),
    )
        .into_response())
}

async fn nearest_destination(
    State(state): State<ApiState>,
    query: Result<Query<NearestQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    if !(-90.0..=90.0).contains(&query.lat) || !(-180.0..=180.0).contains(&query.lng) {
        return Err(ApiError::bad_request(
            "invalid_coordinates",
            "lat must be within ±90 and lng within ±180",
        ));
    }
    let radius_km = query
        .radius_km
        .filter(|radius| radius.is_finite() && *radius > 0.0)
        .unwrap_or(DEFAULT_NEARBY_RADIUS_KM);

    let point = Coordinates::new(query.lat, query.lng);
    let Some((record, distance_km)) = state.planner.dataset().nearest_city(point, radius_km) else {
        return Err(ApiError::not_found(
            "no_nearby_city",
            format!("no dataset city within {radius_km} km"),
        ));
    };

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "city": record.city,
            "state": record.state,
            "distance_km": (distance_km * 10.0).round() / 10.0,
            "radius_km": radius_km,
        })),
    )
        .into_response())
}

async fn place_details(
    State(state): State<ApiState>,
    query: Result<Query<PlaceDetailsQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let place = sanitize_limited_text(&query.place, MAX_QUERY_FIELD_LEN);
    let city = sanitize_limited_text(&query.city, MAX_QUERY_FIELD_LEN);
    if place.is_empty() || city.is_empty() {
        return Err(ApiError::bad_request(
            "invalid_request",
            "place and city are required",
        ));
    }

    let details = state.planner.place_details(&place, &city).await;
    let info = state.planner.dataset().place_info(&place, &city);
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "details": details, "info": info })),
    )
        .into_response())
}

async fn city_attractions(
    State(state): State<ApiState>,
    AxumPath(city): AxumPath<String>,
) -> Result<Response, ApiError> {
    let cards = state
        .planner
        .attraction_cards(&city)
        .ok_or_else(|| ApiError::unknown_city(&city))?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "city": city, "cards": cards })),
    )
        .into_response())
}

async fn city_restaurants(
    State(state): State<ApiState>,
    AxumPath(city): AxumPath<String>,
) -> Result<Response, ApiError> {
    let cards = state
        .planner
        .restaurant_cards(&city)
        .ok_or_else(|| ApiError::unknown_city(&city))?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "city": city, "cards": cards })),
    )
        .into_response())
}

async fn next_restaurant(
    State(state): State<ApiState>,
    headers: HeaderMap,
    AxumPath(city): AxumPath<String>,
    payload: Result<Json<SwipeRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let user_id = user_id_from_headers(&headers);

    let step = state
        .planner
        .swipe_restaurant(
            &user_id,
            &city,
            request.current,
            request.action,
            request.viewed,
        )
        .await?
        .ok_or_else(|| {
            ApiError::not_found("no_restaurants", format!("no restaurants listed for `{city}`"))
        })?;
    Ok((StatusCode::OK, Json(step)).into_response())
}

async fn weather_outfit(
    State(state): State<ApiState>,
    query: Result<Query<WeatherQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let city = required_city(&query.city)?;
    let start = query.start.unwrap_or_else(|| Utc::now().date_naive());

    let report = state.planner.outfit(&city, query.day.unwrap_or(1), start)?;
    Ok((StatusCode::OK, Json(report)).into_response())
}

async fn weather_forecast(
    State(state): State<ApiState>,
    query: Result<Query<WeatherQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let city = required_city(&query.city)?;
    let start = query.start.unwrap_or_else(|| Utc::now().date_naive());

    let forecast = state.planner.forecast(&city, query.days.unwrap_or(5), start)?;
    Ok((StatusCode::OK, Json(forecast)).into_response())
}

async fn pricing(query: Result<Query<PricingQuery>, QueryRejection>) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let cycle = match query.cycle.as_deref() {
        Some(value) => BillingCycle::from_str(value)?,
        None => BillingCycle::default(),
    };

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "cycle": cycle,
            "trial_days": TRIAL_DAYS,
            "plans": pricing_plans(cycle),
        })),
    )
        .into_response())
}

async fn notifications(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user_id = user_id_from_headers(&headers);
    let feed = state.planner.notifications(&user_id).await?;
    Ok((StatusCode::OK, Json(feed)).into_response())
}

async fn notification_read(
    State(state): State<ApiState>,
    headers: HeaderMap,
    AxumPath(id): AxumPath<String>,
) -> Result<Response, ApiError> {
    let user_id = user_id_from_headers(&headers);
    if !state.planner.mark_read(&user_id, &id).await? {
        return Err(ApiError::not_found(
            "notification_not_found",
            format!("no notification `{id}` for this user"),
        ));
    }
    let unread_count = state.planner.unread_count(&user_id).await?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "id": id, "unread": false, "unread_count": unread_count })),
    )
        .into_response())
}

async fn notifications_read_all(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user_id = user_id_from_headers(&headers);
    let updated = state.planner.mark_all_read(&user_id).await?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "updated": updated, "unread_count": 0 })),
    )
        .into_response())
}

async fn saved_list(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user_id = user_id_from_headers(&headers);
    let items = state.planner.saved_items(&user_id).await?;
    Ok((StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response())
}

async fn saved_create(
    State(state): State<ApiState>,
    headers: HeaderMap,
    payload: Result<Json<SaveItemRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload?;
    let user_id = user_id_from_headers(&headers);
    let Some(kind) = SavedItemKind::parse(&request.kind) else {
        return Err(ApiError::bad_request(
            "invalid_request",
            format!(
                "unknown saved item kind `{}` (expected restaurant, attraction or destination)",
                request.kind
            ),
        ));
    };
    let name = sanitize_limited_text(&request.name, MAX_QUERY_FIELD_LEN);
    let city = sanitize_limited_text(&request.city, MAX_QUERY_FIELD_LEN);

    let saved = state
        .planner
        .save_item(&user_id, kind, &name, &city)
        .await?;
    let status = if saved {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(serde_json::json!({ "saved": saved }))).into_response())
}

fn required_city(value: &str) -> Result<String, ApiError> {
    let city = sanitize_limited_text(value, MAX_QUERY_FIELD_LEN);
    if city.is_empty() {
        return Err(ApiError::bad_request("invalid_request", "city is required"));
    }
    Ok(city)
}

fn sanitize_limited_text(value: &str, max_chars: usize) -> String {
    value.trim().chars().take(max_chars).collect::<String>()
}

/// Caller identity from `x-user-id`, restricted to a safe character set;
/// anything missing or unusable maps to the shared guest user.
fn user_id_from_headers(headers: &HeaderMap) -> String {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .map(|value| sanitize_limited_text(value, MAX_USER_ID_LEN))
        .filter(|value| {
            !value.is_empty()
                && value
                    .chars()
                    .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '@'))
        })
        .unwrap_or_else(|| DEFAULT_USER_ID.to_string())
}

fn parse_allowed_origins() -> Vec<String> {
    let default_origins = [
        "http://localhost:5173",
        "http://127.0.0.1:5173",
        "http://localhost:3000",
        "http://127.0.0.1:3000",
    ];

    env::var("TRAVELWISE_ALLOWED_ORIGINS")
        .ok()
        .map(|value| {
            value
                .split(',')
                .map(|origin| origin.trim().trim_end_matches('/').to_string())
                .filter(|origin| !origin.is_empty())
                .collect::<Vec<_>>()
        })
        .unwrap_or_else(|| {
            default_origins
                .iter()
                .map(|value| value.trim_end_matches('/').to_string())
                .collect()
        })
}

fn is_public_endpoint(path: &str) -> bool {
    matches!(path, "/health" | "/v1/pricing")
}

/// Whether the `Origin` header names a configured browser origin.
///
/// Clients can forge `Origin`, so this is a convenience for the bundled web
/// frontend and not authentication. Deployments that need real access control
/// put the api behind a gateway or clear `TRAVELWISE_ALLOWED_ORIGINS`.
fn request_origin_is_allowed(state: &ApiState, headers: &HeaderMap) -> bool {
    headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .is_some_and(|origin| state.allowed_origins.iter().any(|allowed| allowed == origin))
}

async fn api_key_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path();
    if request.method() == Method::OPTIONS || is_public_endpoint(path) {
        return next.run(request).await;
    }

    let header_key = request
        .headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if header_key == state.api_key || request_origin_is_allowed(&state, request.headers()) {
        return next.run(request).await;
    }

    ApiError::new(
        StatusCode::UNAUTHORIZED,
        "unauthorized",
        "missing or invalid x-api-key, and request origin is not allowed",
    )
    .into_response()
}

fn build_cors_layer(allowed_origins: &Arc<Vec<String>>) -> CorsLayer {
    let origins = allowed_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect::<Vec<_>>();
    let origins = if origins.is_empty() {
        vec![HeaderValue::from_static("http://localhost:5173")]
    } else {
        origins
    };

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-api-key"),
            header::HeaderName::from_static("x-user-id"),
        ])
}

async fn rate_limit_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if request.method() == Method::OPTIONS || is_public_endpoint(request.uri().path()) {
        return next.run(request).await;
    }

    let ip = request_ip(&request);
    if let Err(retry_after) = state.limiter.check(&ip) {
        let mut response = ApiError::new(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "rate limit exceeded for this IP",
        )
        .into_response();
        if let Ok(value) = HeaderValue::from_str(&retry_after.as_secs().max(1).to_string()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        return response;
    }

    next.run(request).await
}

fn request_ip(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "local".to_string())
}

async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static("camera=(), microphone=(), geolocation=(self)"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'; base-uri 'none'"),
    );

    response
}
