use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use radgate_common::GatewayError;

/// Renders the `{"error": {...}}` body spec §7 mandates, with the HTTP
/// status derived from the error's taxonomy (spec §4.4).
pub struct ApiError(pub GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0.to_body())).into_response()
    }
}
