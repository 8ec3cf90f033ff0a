use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};

use crate::state::AppState;

pub mod dto;
pub mod handler;
pub mod model;
pub mod repository;
pub mod service;
pub mod stream_handler;

pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    let upload_routes = Router::new()
        .route("/upload_file", post(handler::upload_video))
        .layer(DefaultBodyLimit::max(max_upload_bytes));

    Router::new()
        .route("/videos", get(handler::list_videos))
        .route("/videos/{id}", get(handler::get_video))
        .route("/videos/{id}/output", get(stream_handler::stream_output))
        .merge(upload_routes)
}
