//! Error taxonomy surfaced by the auth handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::fmt::Display;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Missing or mismatched request fields.
    #[error("{0}")]
    Validation(&'static str),
    /// Username or email already taken.
    #[error("{0}")]
    Conflict(&'static str),
    /// Unknown username or wrong password; the two are indistinguishable.
    #[error("Invalid username or password")]
    InvalidCredentials,
    /// Store, hasher or session backend failure. Carries the public message only.
    #[error("{0}")]
    Infrastructure(&'static str),
}

impl AuthError {
    /// Log the underlying cause and return a generic infrastructure error.
    pub(crate) fn infrastructure(message: &'static str, cause: impl Display) -> Self {
        error!("{message}: {cause}");
        Self::Infrastructure(message)
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::Conflict(_) | Self::InvalidCredentials => {
                StatusCode::BAD_REQUEST
            }
            Self::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
