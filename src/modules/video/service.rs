use super::dto::{ListVideosQuery, UploadResponse};
use super::model::{JobStatus, VideoJob};
use super::repository::VideoRepository;
use crate::common::error::{AppError, AppResult};
use crate::common::upload::{is_video_upload, stream_to_file};
use crate::infrastructure::storage::media::INPUT_FILE_NAME;
use crate::state::AppState;
use crate::workers::detection::spawn_detection_job;
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

/// Name of the multipart field carrying the video.
pub const UPLOAD_FIELD: &str = "file";

pub struct VideoService;

impl VideoService {
    pub async fn list_jobs(state: AppState, query: ListVideosQuery) -> AppResult<Vec<VideoJob>> {
        query.validate()?;
        let jobs =
            VideoRepository::list(&state.db, query.status, query.limit(), query.offset()).await?;
        Ok(jobs)
    }

    pub async fn get_job(state: AppState, id: Uuid) -> AppResult<VideoJob> {
        VideoRepository::find_by_id(&state.db, id)
            .await?
            .ok_or(AppError::NotFound("Video job"))
    }

    /// Location of the annotated video, once the job has finished successfully.
    pub async fn output_path(state: AppState, id: Uuid) -> AppResult<PathBuf> {
        let job = Self::get_job(state.clone(), id).await?;
        match job.status {
            JobStatus::Done => Ok(state.media.output_path(id)),
            JobStatus::InProcess => Err(AppError::Conflict("Video is still being processed".to_string())),
            JobStatus::Error => Err(AppError::Conflict("Video processing failed".to_string())),
        }
    }

    /// Save the uploaded video, record the job and start processing it.
    pub async fn upload_and_process(
        state: AppState,
        mut multipart: Multipart,
    ) -> AppResult<UploadResponse> {
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            if field.name() != Some(UPLOAD_FIELD) {
                continue;
            }

            let filename = client_filename(field.file_name());
            if !is_video_upload(field.content_type(), field.file_name()) {
                return Err(AppError::BadRequest(
                    "Invalid content type: only video files are accepted".to_string(),
                ));
            }

            let id = Uuid::new_v4();
            state.media.create_job_dir(id).await?;
            info!("Receiving upload {} as job {}", filename, id);

            if let Err(e) = stream_to_file(field, &state.media.input_path(id)).await {
                discard(&state, id).await;
                return Err(match e.downcast::<MultipartError>() {
                    Ok(e) => multipart_error(e),
                    Err(e) => AppError::BadRequest(format!("Upload failed: {}", e)),
                });
            }

            let job = match VideoRepository::insert(&state.db, id, &filename).await {
                Ok(job) => job,
                Err(e) => {
                    discard(&state, id).await;
                    return Err(e.into());
                }
            };

            spawn_detection_job(state.clone(), job.id);

            return Ok(UploadResponse {
                id: job.id,
                filename: job.filename,
                status: job.status,
            });
        }

        Err(AppError::BadRequest(format!(
            "No '{}' field found in multipart request",
            UPLOAD_FIELD
        )))
    }
}

async fn discard(state: &AppState, id: Uuid) {
    if let Err(e) = state.media.discard_job(id).await {
        warn!("Failed to clean up media for job {}: {}", id, e);
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::TooLarge(e.body_text())
    } else {
        AppError::BadRequest(format!("Invalid multipart body: {}", e.body_text()))
    }
}

/// The client's file name without any directory part.
pub fn client_filename(raw: Option<&str>) -> String {
    raw.and_then(|name| Path::new(name).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or(INPUT_FILE_NAME)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_filename_strips_directories() {
        assert_eq!(client_filename(Some("../../etc/flight.mp4")), "flight.mp4");
        assert_eq!(client_filename(Some("clip.avi")), "clip.avi");
        assert_eq!(client_filename(Some("")), INPUT_FILE_NAME);
        assert_eq!(client_filename(None), INPUT_FILE_NAME);
    }
}
