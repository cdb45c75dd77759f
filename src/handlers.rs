pub mod authors;
pub mod books;
pub mod comments;
pub mod editors;
pub mod health;
pub mod registration;
pub mod security;

use axum::{
    extract::FromRequest,
    http::{HeaderName, StatusCode, header},
    response::Json,
};

use crate::error::ApiError;
use crate::schemas::ApiResponse;

/// JSON request body whose rejections are reported as [`ApiError`].
///
/// Protected handlers take it as `Result<ApiJson<T>, ApiError>` and only
/// unwrap it once access has been granted.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// A JSON response pointing at the canonical URL of the resource it carries.
pub type WithLocation<T> = (StatusCode, [(HeaderName, String); 1], Json<ApiResponse<T>>);

pub fn with_location<T>(
    status: StatusCode,
    location: String,
    data: T,
    message: &str,
) -> WithLocation<T> {
    (
        status,
        [(header::LOCATION, location)],
        Json(ApiResponse::ok(data, message)),
    )
}
