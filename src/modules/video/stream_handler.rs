use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use crate::common::error::AppError;
use crate::common::extract::ApiPath;
use crate::modules::video::service::VideoService;
use crate::state::AppState;
use tokio_util::io::ReaderStream;
use uuid::Uuid;

/// Stream the annotated output video
#[utoipa::path(
    get,
    path = "/api/v1/videos/{id}/output",
    params(
        ("id" = Uuid, Path, description = "Video job ID")
    ),
    responses(
        (status = 200, description = "Annotated video", content_type = "video/mp4"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Processing not finished or failed"),
        (status = 422, description = "Malformed job ID"),
        (status = 500, description = "Internal Server Error")
    ),
    tag = "Videos"
)]
pub async fn stream_output(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Response {
    let path = match VideoService::output_path(state, id).await {
        Ok(p) => p,
        Err(e) => return e.into_response(),
    };

    let file = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return AppError::NotFound("Output video").into_response();
        }
        Err(e) => return AppError::Io(e).into_response(),
    };

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, mime_guess::from_path(&path).first_or_octet_stream().to_string())
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}.mp4\"", id),
        );

    if let Ok(meta) = file.metadata().await {
        builder = builder.header(header::CONTENT_LENGTH, meta.len());
    }

    let body = Body::from_stream(ReaderStream::new(file));

    builder
        .body(body)
        .unwrap_or_else(|e| AppError::Internal(e.into()).into_response())
}
