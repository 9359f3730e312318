use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::predictor::PredictorError;
use crate::storage::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Incorrect email or password")]
    Unauthorized,
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Predictor(#[from] PredictorError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
    detail: String,
}

impl ApiError {
    /// Stable machine-readable code for server-side failures.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized => "unauthorized",
            ApiError::Validation(_) => "validation_error",
            ApiError::Storage(_) => "storage_error",
            ApiError::Predictor(_) => "predictor_error",
            ApiError::Io(_) => "internal_error",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Storage(_) => StatusCode::BAD_GATEWAY,
            ApiError::Predictor(_) | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Unauthorized => HttpResponse::Unauthorized()
                .insert_header((header::WWW_AUTHENTICATE, "Basic"))
                .json(serde_json::json!({ "detail": self.to_string() })),
            ApiError::Validation(message) => {
                HttpResponse::UnprocessableEntity().json(serde_json::json!({ "detail": message }))
            }
            _ => HttpResponse::build(self.status_code()).json(ErrorResponse {
                error: self.code(),
                detail: self.to_string(),
            }),
        }
    }
}
