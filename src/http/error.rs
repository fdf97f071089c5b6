// HTTP errors - status mapping and response bodies

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Body of every non-entity response: errors and delete confirmations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub code: u16,
    pub message: String,
}

impl ApiMessage {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiMessage {
            code: status.as_u16(),
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    /// Unique or foreign key violation
    Conflict(String),
    Timeout,
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::NotFound(msg)
            | AppError::BadRequest(msg)
            | AppError::Conflict(msg)
            | AppError::Internal(msg) => msg,
            AppError::Timeout => "deadline exceeded".to_string(),
        };

        (status, Json(ApiMessage::new(status, message))).into_response()
    }
}

impl From<crate::Error> for AppError {
    fn from(err: crate::Error) -> Self {
        use crate::Error;

        if err.is_constraint_violation() {
            return AppError::Conflict(err.to_string());
        }
        match err {
            Error::ParentNotFound { .. } => AppError::NotFound(err.to_string()),
            Error::Invalid { .. } => AppError::BadRequest(err.to_string()),
            Error::DeadlineExceeded => AppError::Timeout,
            Error::Store(_) | Error::Query(_) => {
                tracing::error!(error = %err, "request failed");
                AppError::Internal(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_error_mapping() {
        let cases = [
            (Error::ParentNotFound { parent: "category" }, StatusCode::NOT_FOUND),
            (Error::required("name"), StatusCode::BAD_REQUEST),
            (Error::DeadlineExceeded, StatusCode::GATEWAY_TIMEOUT),
            (Error::Query("bad".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_constraint_violation_is_conflict() {
        let conn = crate::db::open_in_memory().unwrap();
        let err = conn
            .execute(
                "INSERT INTO food_subcategories (name, description, food_category_id) VALUES ('a', 'b', 9)",
                [],
            )
            .unwrap_err();
        assert_eq!(AppError::from(Error::from(err)).status(), StatusCode::CONFLICT);
    }
}
