mod search;
mod stats;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use vicinity_search::CompiledCatalog;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub catalog: Arc<CompiledCatalog>,
    pub default_radius_km: f64,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &vicinity_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/search",
            get(search::structured_search).post(search::voice_search),
        )
        .route("/api/v1/search/stats", get(stats::search_stats))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match vicinity_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;
    use vicinity_core::KeywordCatalog;

    fn test_catalog() -> Arc<CompiledCatalog> {
        let raw: KeywordCatalog = serde_yaml::from_str(
            r#"
categories:
  - name: pizzeria
    id: 2
    keywords: [pizzeria, pizza]
location_keywords: [near, nearby]
"#,
        )
        .expect("parse catalog");
        Arc::new(CompiledCatalog::compile(&raw))
    }

    fn test_app(pool: PgPool) -> Router {
        let auth = crate::middleware::AuthState::from_env(true).expect("auth");
        build_app(
            AppState {
                pool,
                catalog: test_catalog(),
                default_radius_km: 5.0,
            },
            auth,
            default_rate_limit_state(),
        )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json parse")
    }

    #[test]
    fn api_error_validation_error_maps_to_bad_request() {
        let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn api_error_unknown_code_maps_to_internal_error() {
        let response = ApiError::new("req-1", "weird", "boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    async fn seed_category(pool: &PgPool, id: i64, name: &str) {
        sqlx::query("INSERT INTO categories (id, name) VALUES ($1, $2)")
            .bind(id)
            .bind(name)
            .execute(pool)
            .await
            .expect("seed category");
    }

    async fn seed_business(pool: &PgPool, name: &str, city: &str, category_id: Option<i64>) -> i64 {
        sqlx::query_scalar::<_, i64>(
            "INSERT INTO businesses (name, address, city, country, category_id) \
             VALUES ($1, $2, $3, 'US', $4) RETURNING id",
        )
        .bind(name)
        .bind(format!("1 {name} Ave"))
        .bind(city)
        .bind(category_id)
        .fetch_one(pool)
        .await
        .expect("seed business")
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn structured_search_returns_hits_and_stats(pool: PgPool) {
        seed_business(&pool, "Pizza Palace", "Springfield", None).await;
        seed_business(&pool, "Burger Barn", "Springfield", None).await;

        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/search?q=pizza")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let records = json["data"]["records"].as_array().expect("records");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["name"], "Pizza Palace");
        assert_eq!(json["data"]["stats"]["total_results"], 1);
        assert!(json["meta"]["request_id"].is_string());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn structured_search_filters_by_category(pool: PgPool) {
        seed_category(&pool, 2, "pizzeria").await;
        seed_business(&pool, "Pizza Palace", "Springfield", Some(2)).await;
        seed_business(&pool, "Burger Barn", "Springfield", None).await;

        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/search?category_id=2")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let records = json["data"]["records"].as_array().expect("records");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["category_name"], "pizzeria");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn voice_search_shapes_businesses_and_returns_trace(pool: PgPool) {
        seed_category(&pool, 2, "pizzeria").await;
        let business_id = seed_business(&pool, "Pizza Palace", "Springfield", Some(2)).await;
        sqlx::query(
            "INSERT INTO business_hours (business_id, day, open_a, close_a) \
             VALUES ($1, 0, '12:00', '23:00')",
        )
        .bind(business_id)
        .execute(&pool)
        .await
        .expect("seed hours");

        let body = serde_json::json!({
            "voice_text": "pizza in springfield",
        });
        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/search")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;

        let businesses = json["data"]["businesses"].as_array().expect("businesses");
        assert_eq!(businesses.len(), 1);
        assert_eq!(businesses[0]["business_name"], "Pizza Palace");
        assert_eq!(businesses[0]["category"]["category_name"], "pizzeria");
        assert_eq!(
            businesses[0]["business_opening_hours"]["day_0"]["open_a"],
            "12:00"
        );
        // All seven days are present even when only one has hours.
        assert!(businesses[0]["business_opening_hours"]["day_6"].is_object());

        let interpretation = &json["data"]["interpretation"];
        assert_eq!(interpretation["location_source"], "text_specified");
        assert_eq!(interpretation["filters"]["city_name"], "Springfield");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn voice_search_without_text_runs_radius_search(pool: PgPool) {
        sqlx::query(
            "INSERT INTO businesses (name, city, country, latitude, longitude) \
             VALUES ('Near Cafe', 'Springfield', 'US', 40.4200, -3.7038)",
        )
        .execute(&pool)
        .await
        .expect("seed");

        let body = serde_json::json!({
            "latitude": 40.4168,
            "longitude": -3.7038,
            "radius": 5.0,
        });
        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/search")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let businesses = json["data"]["businesses"].as_array().expect("businesses");
        assert_eq!(businesses.len(), 1);
        assert!(businesses[0]["distance"].as_f64().expect("distance") < 2.0);
        assert!(json["data"]["interpretation"].is_null());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn search_stats_aggregates_recorded_searches(pool: PgPool) {
        // Two searches land in the log before the stats call.
        for uri in ["/api/v1/search?q=pizza", "/api/v1/search?q=sushi"] {
            let response = test_app(pool.clone())
                .oneshot(
                    Request::builder()
                        .uri(uri)
                        .body(Body::empty())
                        .expect("request"),
                )
                .await
                .expect("response");
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/search/stats?days=7")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["data"]["period_days"], 7);
        assert_eq!(json["data"]["total_searches"], 2);
        assert_eq!(
            json["data"]["zero_results_percentage"].as_f64(),
            Some(100.0)
        );
        assert_eq!(json["data"]["top_searches"].as_array().map(Vec::len), Some(2));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn responses_echo_request_id_header(pool: PgPool) {
        let response = test_app(pool)
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header("x-request-id", "test-req-42")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(
            response
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok()),
            Some("test-req-42")
        );
    }
}
