//! Application router

use axum::{middleware, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{api, web, AppState};

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_files = ServeDir::new(&state.config.server.static_dir);

    Router::new()
        .merge(web::routes::router())
        .nest("/api/v1", api::router().layer(cors))
        .merge(api::openapi::create_openapi_router())
        .nest_service("/static", static_files)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            web::middleware::login_required,
        ))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
