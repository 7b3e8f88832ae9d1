use crate::api::handlers::{
    auth::{
        Argon2Hasher, AuthConfig, AuthState, HtmlEscaping, MemorySessionStore, PgCredentialStore,
    },
    health, root, user_login, user_register, welcome,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post},
    Extension, Router,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::{fmt::Display, future::Future, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, info_span, warn, Span};
use ulid::Ulid;

pub mod handlers;
// OpenAPI document for the `openapi` binary.
mod openapi;
pub(crate) mod templates;

pub use openapi::openapi;

const SCHEMA_RETRY_INITIAL: Duration = Duration::from_secs(1);
const SCHEMA_RETRY_MAX: Duration = Duration::from_secs(30);

/// Build the application router around an [`AuthState`].
///
/// The server wires `PostgreSQL`; tests pass in-memory stores.
#[must_use]
pub fn router(auth_state: Arc<AuthState>) -> Router {
    Router::new()
        .route("/", get(root::root))
        .route(
            "/register",
            get(root::register_page).post(user_register::register),
        )
        .route("/login", post(user_login::login))
        .route("/welcome", get(welcome::welcome))
        .route("/health", get(health::health).options(health::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(auth_state)),
        )
}

/// Start the server
/// # Errors
/// Return error if the DSN is invalid or the listener cannot be bound
pub async fn new(port: u16, dsn: String, auth_config: AuthConfig) -> Result<()> {
    if auth_config.html_escaping() == HtmlEscaping::Raw {
        warn!("HTML escaping is disabled on /welcome; user input is rendered verbatim");
    }

    // Lazy pool: the service starts even if the database is not reachable yet.
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .acquire_timeout(Duration::from_secs(5))
        .test_before_acquire(true)
        .connect_lazy(&dsn)
        .context("Invalid database connection string")?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    serve(listener, pool, auth_config, shutdown_signal()).await
}

async fn serve<F>(
    listener: TcpListener,
    pool: PgPool,
    auth_config: AuthConfig,
    shutdown: F,
) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let users = PgCredentialStore::new(pool);

    // Requests are served while the schema is still pending.
    tokio::spawn(bootstrap_schema(users.clone()));

    let auth_state = Arc::new(AuthState::new(
        auth_config,
        Arc::new(users),
        Arc::new(Argon2Hasher::new()),
        Arc::new(MemorySessionStore::new()),
    ));

    axum::serve(listener, router(auth_state).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

async fn bootstrap_schema(users: PgCredentialStore) {
    let users = &users;
    retry_with_backoff(
        "apply database schema",
        SCHEMA_RETRY_INITIAL,
        SCHEMA_RETRY_MAX,
        move || users.ensure_schema(),
    )
    .await;
}

/// Run `op` until it succeeds, doubling the delay between attempts up to `max`.
async fn retry_with_backoff<F, Fut, E>(what: &str, initial: Duration, max: Duration, mut op: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), E>>,
    E: Display,
{
    let mut delay = initial;
    let mut attempt: u32 = 1;

    loop {
        match op().await {
            Ok(()) => {
                info!("Done: {} (attempt {})", what, attempt);
                return;
            }
            Err(err) => {
                error!(
                    "Failed to {} (attempt {}): {}; retrying in {:?}",
                    what, attempt, err, delay
                );
            }
        }

        tokio::time::sleep(delay).await;
        delay = delay.saturating_mul(2).min(max);
        attempt = attempt.saturating_add(1);
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
