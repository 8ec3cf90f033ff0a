use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn success(data: T, message: &str) -> Self {
        Self {
            status: "SUCCESS".to_string(),
            message: message.to_string(),
            data: Some(data),
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorData {
    pub error_code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status: String,
    pub error_data: ErrorData,
}

impl ErrorResponse {
    pub fn new(message: &str, status: StatusCode, detail: Option<Value>) -> Self {
        Self {
            status: "FAIL".to_string(),
            error_data: ErrorData {
                error_code: status.as_u16(),
                message: message.to_string(),
                detail,
            },
        }
    }
}

pub struct ApiSuccess<T>(pub T, pub StatusCode);

impl<T> IntoResponse for ApiSuccess<ApiResponse<T>>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        let (response, status) = (self.0, self.1);
        (status, Json(response)).into_response()
    }
}

pub struct ApiError(pub String, pub StatusCode);

impl ApiError {
    pub fn with_detail(self, detail: Value) -> DetailedApiError {
        DetailedApiError(self, detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (message, status) = (self.0, self.1);
        (status, Json(ErrorResponse::new(&message, status, None))).into_response()
    }
}

pub struct DetailedApiError(pub ApiError, pub Value);

impl IntoResponse for DetailedApiError {
    fn into_response(self) -> Response {
        let (ApiError(message, status), detail) = (self.0, self.1);
        (status, Json(ErrorResponse::new(&message, status, Some(detail)))).into_response()
    }
}
