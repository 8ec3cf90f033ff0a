use axum::extract::{FromRequestParts, Path, Query};

use super::error::AppError;

/// `Query` whose rejections answer with the error envelope.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// `Path` whose rejections answer with the error envelope.
#[derive(FromRequestParts)]
#[from_request(via(Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);
