use super::handlers::{
    auth::types::{ErrorResponse, LoginResponse, RegisterResponse},
    auth::{LoginRequest, RegisterRequest},
    health, user_login, user_register, welcome,
};
use utoipa::OpenApi;

/// Documented routes. The HTML entry pages and `OPTIONS /health` are served
/// but left out of the document.
///
/// Title, version, description, contact and license come from Cargo.toml.
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        user_register::register,
        user_login::login,
        welcome::welcome,
    ),
    components(schemas(
        health::Health,
        RegisterRequest,
        RegisterResponse,
        LoginRequest,
        LoginResponse,
        ErrorResponse,
    )),
    tags(
        (name = "auth", description = "Registration, login and welcome page"),
        (name = "health", description = "Service and credential store health"),
    )
)]
struct ApiDoc;

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));

        let contact = spec.info.contact;
        assert!(contact.is_some());
        if let Some(contact) = contact {
            assert_eq!(contact.name.as_deref(), Some("Team Gatekeep"));
            assert_eq!(contact.email.as_deref(), Some("team@gatekeep.dev"));
        }
    }

    #[test]
    fn openapi_documents_auth_routes() {
        let spec = openapi();
        for path in ["/health", "/register", "/login", "/welcome"] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
        assert!(!spec.paths.paths.contains_key("/"));
    }

    #[test]
    fn health_responses_are_single_objects() -> Result<(), serde_json::Error> {
        let doc = serde_json::to_value(openapi())?;
        for status in ["200", "503"] {
            let schema = &doc["paths"]["/health"]["get"]["responses"][status]["content"]
                ["application/json"]["schema"];
            assert_eq!(schema["$ref"], "#/components/schemas/Health", "{status}");
            assert!(schema.get("items").is_none());
        }
        Ok(())
    }
}
