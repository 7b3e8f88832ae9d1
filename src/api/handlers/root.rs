use crate::api::templates;
use axum::response::Html;

// axum handler for the login entry page
pub async fn root() -> Html<String> {
    Html(templates::login_page())
}

pub async fn register_page() -> Html<String> {
    Html(templates::register_page())
}
