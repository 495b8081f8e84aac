//! Handler error taxonomy and its single mapping to HTTP responses.

use rouille::Response;
use thiserror::Error;

use super::dto::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing path parameter, undecodable body, bad field value
    #[error("{0}")]
    Validation(String),
    /// Key already present on create
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    /// Backing store not wired up
    #[error("{0}")]
    Unavailable(String),
    #[error("Error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::Internal(_) => 500,
            ApiError::Unavailable(_) => 503,
        }
    }

    pub fn into_response(self) -> Response {
        let status = self.status_code();
        if status >= 500 {
            log::error!("API error {}: {}", status, self);
        } else {
            log::debug!("API error {}: {}", status, self);
        }
        Response::json(&ApiResponse::err(&self.to_string())).with_status_code(status)
    }
}
