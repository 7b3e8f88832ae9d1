use super::{
    auth::{
        session_cookie,
        types::{ErrorResponse, LoginResponse},
        AuthError, AuthState, LoginRequest, LOGIN_FAILED,
    },
    Payload,
};
use axum::{
    extract::Extension,
    http::{header::SET_COOKIE, StatusCode},
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use tracing::instrument;

#[utoipa::path(
    post,
    path= "/login",
    request_body(
        content = LoginRequest,
        description = "JSON or application/x-www-form-urlencoded",
        content_type = "application/json"
    ),
    responses (
        (status = 200, description = "Login successful, session cookie set", body = LoginResponse,
            headers(("set-cookie" = String, description = "HttpOnly session cookie"))),
        (status = 400, description = "Missing fields or invalid username/password", body = ErrorResponse),
        (status = 500, description = "Login failed", body = ErrorResponse),
    ),
    tag= "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Payload<LoginRequest>>,
) -> impl IntoResponse {
    let request = payload.map(Payload::into_inner).unwrap_or_default();

    let outcome = match auth_state.login(request).await {
        Ok(outcome) => outcome,
        Err(err) => return err.into_response(),
    };

    let cookie = match session_cookie(
        &outcome.session_token,
        auth_state.config().session_cookie_secure(),
    ) {
        Ok(cookie) => cookie,
        Err(err) => return AuthError::infrastructure(LOGIN_FAILED, err).into_response(),
    };

    (
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(LoginResponse {
            success: true,
            username: outcome.username,
            email: outcome.email,
            message: "Login successful".to_string(),
        }),
    )
        .into_response()
}
