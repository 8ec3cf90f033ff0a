use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;
use crate::common::response::ApiError;
use crate::config::settings::SERVICE_TITLE;
use crate::docs::ApiDoc;
use axum::{Json, Router};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde_json::{json, Value};
use crate::state::AppState;

use tower_http::cors::{Any, CorsLayer};

pub fn configure_routes(state: &AppState) -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(Redoc::with_url("/redoc", ApiDoc::openapi()))
        .route("/", get(root))
        .nest("/api/v1", api_routes(state))
        .fallback(not_found)
        .layer(cors)
}

fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(crate::modules::video::router(state.config.max_upload_bytes))
}

async fn root() -> Json<Value> {
    Json(json!({ "message": SERVICE_TITLE }))
}

async fn not_found() -> impl IntoResponse {
    ApiError("Not Found".to_string(), StatusCode::NOT_FOUND)
}
