use axum::{http::StatusCode, response::{IntoResponse, Response}};

#[derive(Debug)]
pub struct ApiError(pub StatusCode, pub String);

impl ApiError {
    pub fn not_found(what: impl Into<String>) -> Self { Self(StatusCode::NOT_FOUND, what.into()) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response { (self.0, self.1).into_response() }
}
