use super::auth::{extract_session_token, types::WelcomeQuery, AuthState, WelcomeSource};
use crate::api::templates;
use axum::{
    extract::{Extension, Query},
    http::HeaderMap,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, instrument};

#[utoipa::path(
    get,
    path= "/welcome",
    params(WelcomeQuery),
    responses (
        (status = 200, description = "Welcome page for the current identity", body = String, content_type = "text/html"),
        (status = 303, description = "No identity available, redirect to /"),
        (status = 500, description = "Session lookup failed"),
    ),
    tag= "auth"
)]
#[instrument(skip_all)]
pub async fn welcome(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
    query: Option<Query<WelcomeQuery>>,
) -> Response {
    let identity = match auth_state.config().welcome_source() {
        WelcomeSource::Session => {
            let Some(token) = extract_session_token(&headers) else {
                debug!("welcome without session cookie");
                return Redirect::to("/").into_response();
            };
            match auth_state.session(&token).await {
                Ok(record) => record.map(|record| (record.username, record.email)),
                Err(err) => return err.into_response(),
            }
        }
        WelcomeSource::Query => query.and_then(|Query(query)| {
            let username = query.username.filter(|value| !value.is_empty())?;
            let email = query.email.filter(|value| !value.is_empty())?;
            Some((username, email))
        }),
    };

    let Some((username, email)) = identity else {
        debug!("welcome without identity");
        return Redirect::to("/").into_response();
    };

    Html(templates::render_welcome(
        &username,
        &email,
        auth_state.config().html_escaping(),
    ))
    .into_response()
}
