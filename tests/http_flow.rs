//! End-to-end flows through the full router over in-memory stores.

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Request, StatusCode,
    },
    response::Response,
    Router,
};
use gatekeep::api::{
    handlers::auth::{
        Argon2Hasher, AuthConfig, AuthState, HtmlEscaping, MemoryCredentialStore,
        MemorySessionStore, WelcomeSource,
    },
    router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app(config: AuthConfig) -> Result<Router> {
    let state = AuthState::new(
        config,
        Arc::new(MemoryCredentialStore::new()),
        Arc::new(Argon2Hasher::with_params(1024, 1, 1)?),
        Arc::new(MemorySessionStore::new()),
    );
    Ok(router(Arc::new(state)))
}

async fn send(app: &Router, request: Request<Body>) -> Result<Response> {
    Ok(app.clone().oneshot(request).await?)
}

fn post_json(uri: &str, body: &Value) -> Result<Request<Body>> {
    Ok(Request::post(uri)
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))?)
}

fn post_form(uri: &str, body: &'static str) -> Result<Request<Body>> {
    Ok(Request::post(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))?)
}

fn get(uri: &str) -> Result<Request<Body>> {
    Ok(Request::get(uri).body(Body::empty())?)
}

async fn json_body(response: Response) -> Result<Value> {
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&body)?)
}

async fn text_body(response: Response) -> Result<String> {
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(String::from_utf8(body.to_vec())?)
}

fn alice() -> Value {
    json!({
        "username": "alice",
        "email": "a@x.com",
        "password": "Secret1!",
        "confirm-password": "Secret1!"
    })
}

/// Register alice and log her in, returning the `name=value` cookie pair.
async fn register_and_login(app: &Router) -> Result<String> {
    let response = send(app, post_json("/register", &alice())?).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(
        app,
        post_json("/login", &json!({"username": "alice", "password": "Secret1!"}))?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .context("login did not set a cookie")?
        .to_str()?;
    Ok(cookie.split(';').next().unwrap_or_default().to_string())
}

#[tokio::test]
async fn register_login_welcome() -> Result<()> {
    let app = app(AuthConfig::new())?;

    let response = send(&app, post_json("/register", &alice())?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await?,
        json!({"success": true, "message": "User registered successfully. Please login."})
    );

    let response = send(
        &app,
        post_json("/login", &json!({"username": "alice", "password": "Secret1!"}))?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(SET_COOKIE)
        .context("login did not set a cookie")?
        .to_str()?
        .split(';')
        .next()
        .unwrap_or_default()
        .to_string();
    assert_eq!(
        json_body(response).await?,
        json!({
            "success": true,
            "username": "alice",
            "email": "a@x.com",
            "message": "Login successful"
        })
    );

    let response = send(
        &app,
        Request::get("/welcome")
            .header(COOKIE, cookie)
            .body(Body::empty())?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = text_body(response).await?;
    assert!(html.contains("Welcome!"));
    assert!(html.contains("alice"));
    assert!(html.contains("a@x.com"));
    Ok(())
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_the_same() -> Result<()> {
    let app = app(AuthConfig::new())?;
    register_and_login(&app).await?;

    let wrong = send(
        &app,
        post_json("/login", &json!({"username": "alice", "password": "wrong"}))?,
    )
    .await?;
    assert_eq!(wrong.status(), StatusCode::BAD_REQUEST);
    let wrong = json_body(wrong).await?;

    let unknown = send(
        &app,
        post_json("/login", &json!({"username": "nobody", "password": "Secret1!"}))?,
    )
    .await?;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
    let unknown = json_body(unknown).await?;

    assert_eq!(wrong, json!({"error": "Invalid username or password"}));
    assert_eq!(wrong, unknown);
    Ok(())
}

#[tokio::test]
async fn form_bodies_are_accepted() -> Result<()> {
    let app = app(AuthConfig::new())?;

    let response = send(
        &app,
        post_form(
            "/register",
            "username=bob&email=b%40x.com&password=pw&confirm-password=pw",
        )?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, post_form("/login", "username=bob&password=pw")?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await?["email"], "b@x.com");
    Ok(())
}

#[tokio::test]
async fn duplicate_identity_is_rejected() -> Result<()> {
    let app = app(AuthConfig::new())?;
    send(&app, post_json("/register", &alice())?).await?;

    let same_email = json!({
        "username": "alice2",
        "email": "a@x.com",
        "password": "x",
        "confirm-password": "x"
    });
    let response = send(&app, post_json("/register", &same_email)?).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await?,
        json!({"error": "Username or email already exists"})
    );
    Ok(())
}

#[tokio::test]
async fn invalid_register_bodies() -> Result<()> {
    let app = app(AuthConfig::new())?;

    let mismatch = json!({
        "username": "alice",
        "email": "a@x.com",
        "password": "Secret1!",
        "confirm-password": "Secret2!"
    });
    let response = send(&app, post_json("/register", &mismatch)?).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await?,
        json!({"error": "Passwords do not match"})
    );

    let response = send(
        &app,
        Request::post("/register")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{broken"))?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await?,
        json!({"error": "All fields are required"})
    );
    Ok(())
}

#[tokio::test]
async fn welcome_without_session_redirects_home() -> Result<()> {
    let app = app(AuthConfig::new())?;

    // Query parameters are not trusted in session mode.
    let response = send(&app, get("/welcome?username=alice&email=a%40x.com")?).await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(LOCATION).map(|v| v.as_bytes()),
        Some(&b"/"[..])
    );
    Ok(())
}

#[tokio::test]
async fn welcome_query_mode_escapes() -> Result<()> {
    let app = app(AuthConfig::new().with_welcome_source(WelcomeSource::Query))?;

    let response = send(
        &app,
        get("/welcome?username=%3Cscript%3Ealert(1)%3C%2Fscript%3E&email=a%40x.com")?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = text_body(response).await?;
    assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(!html.contains("<script>alert(1)</script>"));

    let response = send(&app, get("/welcome?username=alice")?).await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    Ok(())
}

#[tokio::test]
async fn welcome_query_mode_raw_html() -> Result<()> {
    let app = app(
        AuthConfig::new()
            .with_welcome_source(WelcomeSource::Query)
            .with_html_escaping(HtmlEscaping::Raw),
    )?;

    let response = send(&app, get("/welcome?username=%3Cb%3Ealice%3C%2Fb%3E&email=a%40x.com")?).await?;
    let html = text_body(response).await?;
    assert!(html.contains("<b>alice</b>"));
    Ok(())
}

#[tokio::test]
async fn entry_pages_and_health() -> Result<()> {
    let app = app(AuthConfig::new())?;

    for uri in ["/", "/register"] {
        let response = send(&app, get(uri)?).await?;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .context("missing content type")?
            .to_str()?
            .to_string();
        assert!(content_type.starts_with("text/html"));
    }

    let response = send(&app, get("/health")?).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert!(response.headers().contains_key("X-App"));
    assert_eq!(json_body(response).await?["database"], "ok");

    let response = send(
        &app,
        Request::options("/health").body(Body::empty())?,
    )
    .await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn request_id_is_propagated() -> Result<()> {
    let app = app(AuthConfig::new())?;

    let response = send(
        &app,
        Request::get("/health")
            .header("x-request-id", "01HZY8ZQ6Y4X3E6V2W0K9M1N7P")
            .body(Body::empty())?,
    )
    .await?;
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .map(|v| v.as_bytes()),
        Some(&b"01HZY8ZQ6Y4X3E6V2W0K9M1N7P"[..])
    );
    Ok(())
}
