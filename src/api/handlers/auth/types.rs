//! Request/response types for auth endpoints.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

fn secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

/// Every field is optional so missing values surface as validation errors
/// instead of extractor rejections.
#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct RegisterRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "secret")]
    #[schema(value_type = String)]
    pub password: Option<SecretString>,
    #[serde(
        default,
        rename = "confirm-password",
        alias = "confirmPassword",
        deserialize_with = "secret"
    )]
    #[schema(value_type = String)]
    pub confirm_password: Option<SecretString>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
}

#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct LoginRequest {
    pub username: Option<String>,
    #[serde(default, deserialize_with = "secret")]
    #[schema(value_type = String)]
    pub password: Option<SecretString>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct LoginResponse {
    pub success: bool,
    pub username: String,
    pub email: String,
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

/// Identity passed on the query string; only read in compatibility mode.
#[derive(IntoParams, Deserialize, Debug, Default)]
#[into_params(parameter_in = Query)]
pub struct WelcomeQuery {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn register_request_accepts_dashed_confirm_field() -> serde_json::Result<()> {
        let request: RegisterRequest = serde_json::from_str(
            r#"{"username":"alice","email":"a@x.com","password":"p","confirm-password":"p"}"#,
        )?;
        assert_eq!(request.username.as_deref(), Some("alice"));
        assert_eq!(
            request
                .confirm_password
                .as_ref()
                .map(|s| s.expose_secret().to_string()),
            Some("p".to_string())
        );
        Ok(())
    }

    #[test]
    fn register_request_missing_fields_are_none() -> serde_json::Result<()> {
        let request: RegisterRequest = serde_json::from_str(r#"{"username":"alice"}"#)?;
        assert!(request.email.is_none());
        assert!(request.password.is_none());
        assert!(request.confirm_password.is_none());
        Ok(())
    }

    #[test]
    fn debug_output_redacts_passwords() -> serde_json::Result<()> {
        let request: LoginRequest =
            serde_json::from_str(r#"{"username":"alice","password":"hunter2"}"#)?;
        let rendered = format!("{request:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter2"));
        Ok(())
    }
}
