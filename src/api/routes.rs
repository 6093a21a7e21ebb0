use crate::api::handlers::{analysis, health, reports, AppState};
use crate::api::middleware::require_user;
use crate::config::ApiConfig;
use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::Level;

pub fn create_router(state: AppState, config: &ApiConfig) -> Router {
    // Public routes (no user required)
    let public_routes = Router::new().route("/health", get(health::health));

    // Caller identity comes from oauth2-proxy in front of the service
    let api_routes = Router::new()
        .route("/api/v1/analyses", post(analysis::upload))
        .route("/api/v1/analyses/latest", get(analysis::get_latest))
        .route("/api/v1/analyses/{id}", get(analysis::get_analysis))
        .route(
            "/api/v1/analyses/{id}/feeders/{feeder}/recommendations",
            get(analysis::preview_recommendations),
        )
        .route("/api/v1/analyses/{id}/reports", post(analysis::create_report))
        .route("/api/v1/reports", get(reports::list_reports))
        .route("/api/v1/reports/{id}", get(reports::get_report))
        .route_layer(middleware::from_fn(require_user));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request| {
                    tracing::span!(
                        Level::INFO,
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_request(|_request: &Request, _span: &tracing::Span| {
                    tracing::event!(Level::DEBUG, "received request");
                })
                .on_response(
                    |response: &axum::response::Response,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::event!(
                            Level::INFO,
                            status = response.status().as_u16(),
                            latency = ?latency,
                            "request completed"
                        );
                    },
                )
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     _latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::event!(Level::ERROR, error = %error, "request failed");
                    },
                ),
        )
}
