//! Request-level errors and their HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::headers::HeaderUtil;
use crate::repository::StorageError;
use crate::tutor::ENTITY_NAME;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("A new tutor cannot already have an ID")]
    IdExists,
    #[error("Invalid id")]
    IdNull,
    #[error("No tutor with id {0}")]
    NotFound(i64),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::IdExists | ApiError::IdNull => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_key(&self) -> &'static str {
        match self {
            ApiError::IdExists => "idexists",
            ApiError::IdNull => "idnull",
            ApiError::NotFound(_) => "idnotfound",
            ApiError::Storage(_) => "internal",
        }
    }
}

/// Problem-style error body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub title: String,
    pub status: u16,
    pub entity_name: &'static str,
    pub error_key: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let title = match &self {
            ApiError::Storage(e) => {
                error!("Storage failure: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            title,
            status: status.as_u16(),
            entity_name: ENTITY_NAME,
            error_key: self.error_key(),
        };

        (status, Json(body)).into_response()
    }
}

/// An [`ApiError`] decorated with the client alert headers.
pub struct Rejection {
    error: ApiError,
    headers: HeaderUtil,
}

impl Rejection {
    pub fn new(error: ApiError, headers: &HeaderUtil) -> Self {
        Self {
            error,
            headers: headers.clone(),
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let alert = match self.error {
            ApiError::Storage(_) => None,
            ref e => Some(self.headers.failure(ENTITY_NAME, e.error_key())),
        };

        let mut response = self.error.into_response();
        if let Some(alert) = alert {
            response.headers_mut().extend(alert);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::IdExists.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::IdNull.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::NotFound(1).status(), StatusCode::NOT_FOUND);
        let storage = ApiError::from(StorageError::Database(sqlx::Error::PoolClosed));
        assert_eq!(storage.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_storage_details_are_not_leaked() {
        let storage = ApiError::from(StorageError::Database(sqlx::Error::PoolClosed));
        let response = Rejection::new(storage, &HeaderUtil::new("tutorApp")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get("x-tutorapp-error").is_none());
    }

    #[test]
    fn test_rejection_carries_failure_headers() {
        let response =
            Rejection::new(ApiError::NotFound(9), &HeaderUtil::new("tutorApp")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get("x-tutorapp-error").unwrap(),
            "error.idnotfound"
        );
    }
}
