use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::errors::RosterError;

/// API error type with HTTP status code and message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Creates a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 409 Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    /// Creates a 500 Internal Server Error
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<RosterError> for ApiError {
    fn from(error: RosterError) -> Self {
        match &error {
            RosterError::Validation(_) => Self::bad_request(error.to_string()),
            RosterError::NotFound { .. } => Self::not_found(error.to_string()),
            RosterError::Conflict { .. } => Self::conflict(error.to_string()),
            RosterError::Store(e) => {
                tracing::error!(error = %e, "Store operation failed");
                Self::internal_server_error(error.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ValidationError;
    use crate::domain::repositories::StoreError;
    use uuid::Uuid;

    #[test]
    fn roster_errors_map_to_status_codes() {
        let cases = [
            (
                RosterError::from(ValidationError::NoAgentsAssigned),
                StatusCode::BAD_REQUEST,
            ),
            (RosterError::agent_not_found(Uuid::nil()), StatusCode::NOT_FOUND),
            (
                RosterError::Conflict {
                    agent_id: Uuid::nil(),
                    mission_id: Uuid::nil(),
                },
                StatusCode::CONFLICT,
            ),
            (
                RosterError::from(StoreError::Backend("down".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(ApiError::from(error).status, status);
        }
    }

    #[test]
    fn not_found_message_is_kept() {
        let id = Uuid::new_v4();
        let error = ApiError::from(RosterError::mission_not_found(id));

        assert_eq!(error.message, format!("Mission not found: {}", id));
    }
}
