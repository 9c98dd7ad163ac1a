use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ProblemConfig;
use crate::exchange::repository::SnapshotRepositoryError;
use crate::forecast::repository::RepositoryError;
use crate::integration::IntegrationError;

pub const PROBLEM_JSON: &str = "application/problem+json";

const HIDDEN_INTERNAL_DETAIL: &str = "An error occurred.";

/// Every way a request can fail once it has reached a handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    // Reserved; no route requires authentication yet.
    #[allow(dead_code)]
    #[error("{0}")]
    Unauthorized(String),
    #[allow(dead_code)]
    #[error("{0}")]
    Forbidden(String),
    #[error(transparent)]
    Upstream(#[from] IntegrationError),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "Resource Not Found",
            ApiError::Validation(_) => "Validation Error",
            ApiError::Unauthorized(_) => "Unauthorized",
            ApiError::Forbidden(_) => "Forbidden",
            ApiError::Upstream(_) => "Upstream Service Failure",
            ApiError::Internal(_) => "An unexpected error occurred!",
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<SnapshotRepositoryError> for ApiError {
    fn from(err: SnapshotRepositoryError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// JSON problem body, `{status, title, detail, instance}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub status: u16,
    pub title: String,
    pub detail: String,
    pub instance: String,
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, PROBLEM_JSON)], Json(self)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Error encountered while processing request: {}", self);
        } else {
            debug!("Request rejected with {}: {}", status, self);
        }
        let problem = ProblemDetails {
            status: status.as_u16(),
            title: self.title().to_string(),
            detail: self.to_string(),
            instance: String::new(),
        };
        // The request path is not known here, render_problems fills it in.
        let mut response = problem.clone().into_response();
        response.extensions_mut().insert(problem);
        response
    }
}

/// Middleware completing problem responses with the request path as
/// `instance` and applying the internal error disclosure setting.
pub async fn render_problems(
    State(problem_config): State<ProblemConfig>,
    request: Request,
    next: Next,
) -> Response {
    let instance = request.uri().path().to_string();
    let mut response = next.run(request).await;
    let Some(mut problem) = response.extensions_mut().remove::<ProblemDetails>() else {
        return response;
    };
    problem.instance = instance;
    if problem.status >= StatusCode::INTERNAL_SERVER_ERROR.as_u16()
        && !problem_config.expose_internal_errors
    {
        problem.detail = HIDDEN_INTERNAL_DETAIL.to_string();
    }
    problem.into_response()
}
