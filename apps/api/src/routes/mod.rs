pub mod health;

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, Method, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::{AllowedOrigin, MAX_BODY_BYTES};
use crate::errors::AppError;
use crate::state::AppState;
use crate::survey::handlers;

async fn not_found() -> AppError {
    AppError::NotFound
}

/// CORS headers go on every response, including errors and 404s.
pub fn cors_layer(origin: &AllowedOrigin) -> CorsLayer {
    let allow_origin = match origin {
        AllowedOrigin::Any => AllowOrigin::any(),
        AllowedOrigin::Exact(value) => AllowOrigin::exact(value.clone()),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// CorsLayer answers every OPTIONS request itself with 200. Preflights are
// answered with 204 No Content.
async fn preflight_no_content(request: Request, next: Next) -> Response {
    let is_preflight = request.method() == Method::OPTIONS;
    let mut response = next.run(request).await;
    if is_preflight && response.status() == StatusCode::OK {
        *response.status_mut() = StatusCode::NO_CONTENT;
    }
    response
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origin);

    // A wrong method on a known path is answered like an unknown path.
    Router::new()
        .route("/health", get(health::health_handler).fallback(not_found))
        .route("/api/survey", post(handlers::handle_submit).fallback(not_found))
        .route(
            "/api/survey/export",
            get(handlers::handle_export).fallback(not_found),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(preflight_no_content))
                .layer(cors),
        )
        .with_state(state)
}
