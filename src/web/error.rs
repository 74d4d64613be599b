use crate::services::validation::ServiceError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

/// Any failure a handler can report, rendered as the JSON envelope.
pub struct AppError(ServiceError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self.0 {
            ServiceError::Validation(errors) => json!({
                "status": "INVALID",
                "errors": errors,
            }),
            ServiceError::NotFound(what) => json!({
                "status": "NOTFOUND",
                "message": format!("{} not found", what),
            }),
            ServiceError::Unauthorized => json!({
                "status": "UNAUTHORIZED",
                "message": "Authentication required",
            }),
            ServiceError::Forbidden => json!({
                "status": "FORBIDDEN",
                "message": "Permission denied",
            }),
            ServiceError::Internal(err) => {
                tracing::error!("Application error: {:?}", err);
                json!({
                    "status": "ERROR",
                    "message": "Internal server error",
                })
            }
        };
        (status, Json(body)).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<ServiceError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

pub type AppResult<T> = Result<T, AppError>;
