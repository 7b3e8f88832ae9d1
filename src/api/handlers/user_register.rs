use super::{
    auth::{
        types::{ErrorResponse, RegisterResponse},
        AuthState, RegisterRequest,
    },
    Payload,
};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tracing::instrument;

const REGISTERED: &str = "User registered successfully. Please login.";

#[utoipa::path(
    post,
    path= "/register",
    request_body(
        content = RegisterRequest,
        description = "JSON or application/x-www-form-urlencoded",
        content_type = "application/json"
    ),
    responses (
        (status = 200, description = "Registration successful", body = RegisterResponse),
        (status = 400, description = "Missing fields, password mismatch, or username/email already taken", body = ErrorResponse),
        (status = 500, description = "Registration failed", body = ErrorResponse),
    ),
    tag= "auth"
)]
#[instrument(skip_all)]
pub async fn register(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Payload<RegisterRequest>>,
) -> impl IntoResponse {
    // A missing or undecodable body is validated like an empty form.
    let request = payload.map(Payload::into_inner).unwrap_or_default();

    match auth_state.register(request).await {
        Ok(_) => (
            StatusCode::OK,
            Json(RegisterResponse {
                success: true,
                message: REGISTERED.to_string(),
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::{
        Argon2Hasher, AuthConfig, MemoryCredentialStore, MemorySessionStore,
    };
    use anyhow::Result;
    use axum::body::to_bytes;
    use secrecy::SecretString;

    fn auth_state() -> Result<Arc<AuthState>> {
        Ok(Arc::new(AuthState::new(
            AuthConfig::new(),
            Arc::new(MemoryCredentialStore::new()),
            Arc::new(Argon2Hasher::with_params(1024, 1, 1)?),
            Arc::new(MemorySessionStore::new()),
        )))
    }

    fn request(password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            username: Some("alice".to_string()),
            email: Some("a@x.com".to_string()),
            password: Some(SecretString::from(password.to_string())),
            confirm_password: Some(SecretString::from(confirm.to_string())),
        }
    }

    async fn body_json(response: axum::response::Response) -> Result<serde_json::Value> {
        let body = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    #[tokio::test]
    async fn register_missing_payload() -> Result<()> {
        let response = register(Extension(auth_state()?), None)
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await?["error"], "All fields are required");
        Ok(())
    }

    #[tokio::test]
    async fn register_success_message() -> Result<()> {
        let response = register(
            Extension(auth_state()?),
            Some(Payload(request("Secret1!", "Secret1!"))),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await?;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], REGISTERED);
        Ok(())
    }

    #[tokio::test]
    async fn register_password_mismatch() -> Result<()> {
        let response = register(
            Extension(auth_state()?),
            Some(Payload(request("Secret1!", "Secret2!"))),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await?["error"], "Passwords do not match");
        Ok(())
    }
}
