use super::dto::{ListVideosQuery, UploadResponse};
use super::model::VideoJob;
use super::service::VideoService;
use crate::common::extract::{ApiPath, ApiQuery};
use crate::common::response::{ApiResponse, ApiSuccess, ErrorResponse};
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

/// List video jobs, newest first
#[utoipa::path(
    get,
    path = "/api/v1/videos",
    params(ListVideosQuery),
    responses(
        (status = 200, description = "List Video Jobs", body = ApiResponse<Vec<VideoJob>>),
        (status = 422, description = "Invalid filter or pagination", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    ),
    tag = "Videos"
)]
pub async fn list_videos(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListVideosQuery>,
) -> impl IntoResponse {
    match VideoService::list_jobs(state, query).await {
        Ok(res) => ApiSuccess(ApiResponse::success(res, "Videos retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}",
    params(
        ("id" = Uuid, Path, description = "Video job ID")
    ),
    responses(
        (status = 200, description = "Get Video Job", body = ApiResponse<VideoJob>),
        (status = 404, description = "Video Job Not Found", body = ErrorResponse),
        (status = 422, description = "Malformed job ID", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    ),
    tag = "Videos"
)]
pub async fn get_video(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> impl IntoResponse {
    match VideoService::get_job(state, id).await {
        Ok(res) => ApiSuccess(ApiResponse::success(res, "Video retrieved successfully"), StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Upload a video and start object detection on it
/// The file is streamed to disk; processing continues in the background.
#[utoipa::path(
    post,
    path = "/api/v1/upload_file",
    request_body(content = String, content_type = "multipart/form-data", description = "Video in the `file` field"),
    responses(
        (status = 200, description = "Upload accepted", body = ApiResponse<UploadResponse>),
        (status = 400, description = "Bad Request", body = ErrorResponse),
        (status = 413, description = "Payload Too Large", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    ),
    tag = "Videos"
)]
pub async fn upload_video(
    State(state): State<AppState>,
    multipart: Multipart,
) -> impl IntoResponse {
    match VideoService::upload_and_process(state, multipart).await {
        Ok(res) => ApiSuccess(ApiResponse::success(res, "Video uploaded, processing started"), StatusCode::OK).into_response(),
        Err(e) => e.into_response(),
    }
}
