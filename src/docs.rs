use utoipa::OpenApi;
use crate::common::response::{ErrorData, ErrorResponse};
use crate::modules::video::dto::UploadResponse;
use crate::modules::video::model::{JobStatus, VideoJob};

#[derive(OpenApi)]
#[openapi(
    info(title = "Capture Aerospace Backend", version = "1.0.0"),
    paths(
        crate::modules::video::handler::list_videos,
        crate::modules::video::handler::get_video,
        crate::modules::video::handler::upload_video,
        crate::modules::video::stream_handler::stream_output,
    ),
    components(
        schemas(VideoJob, JobStatus, UploadResponse, ErrorResponse, ErrorData)
    ),
    tags(
        (name = "Videos", description = "Video upload and object detection jobs")
    )
)]
pub struct ApiDoc;
