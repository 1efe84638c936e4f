use std::sync::Arc;

use axum::{middleware, routing::get, Extension, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::{
    handler::{
        auth::auth_handler, predictions::predictions_handler, premium::premium_handler,
        referral::referral_handler, users::users_handler,
    },
    middleware::{auth, cache_and_rate_limit, premium_gate},
    AppState,
};

// Health check handler
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Server is running"
    }))
}

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_route = Router::new()
        .nest("/auth", auth_handler())
        .nest("/users", users_handler().layer(middleware::from_fn(auth)))
        .nest("/premium", premium_handler().layer(middleware::from_fn(auth)))
        .nest(
            "/referrals",
            referral_handler().layer(middleware::from_fn(auth)),
        )
        .nest(
            "/predictions",
            predictions_handler()
                .layer(middleware::from_fn(premium_gate))
                .layer(middleware::from_fn(auth)),
        );

    // Cache middleware sits outside the /api nest so it sees full paths,
    // matching the invalidation group tables.
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_route)
        .layer(middleware::from_fn(cache_and_rate_limit))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(app_state))
}
