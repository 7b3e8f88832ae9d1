//! Auth state, configuration, and the registration/login flows.

use secrecy::{ExposeSecret, SecretString};
use std::{fmt, str::FromStr, sync::Arc};
use tracing::{debug, info, instrument};

use super::{
    error::AuthError,
    hasher::PasswordHasher,
    session::{SessionRecord, SessionStore},
    storage::{CredentialStore, NewUser, StoreError, User},
    types::{LoginRequest, RegisterRequest},
    utils::{generate_session_token, now_unix_seconds, required_field, required_secret},
};

const ALL_FIELDS_REQUIRED: &str = "All fields are required";
const PASSWORDS_DO_NOT_MATCH: &str = "Passwords do not match";
const IDENTITY_TAKEN: &str = "Username or email already exists";
const LOGIN_FIELDS_REQUIRED: &str = "Username and password are required";
const REGISTRATION_FAILED: &str = "Registration failed";
pub(crate) const LOGIN_FAILED: &str = "Login failed";
const SESSION_LOOKUP_FAILED: &str = "Session lookup failed";

/// Where `/welcome` reads the identity it greets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WelcomeSource {
    /// Session registry, keyed by the session cookie.
    #[default]
    Session,
    /// Unauthenticated `username`/`email` query parameters (legacy clients).
    Query,
}

impl FromStr for WelcomeSource {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "session" => Ok(Self::Session),
            "query" => Ok(Self::Query),
            other => Err(format!("invalid welcome source: {other}")),
        }
    }
}

impl fmt::Display for WelcomeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Session => f.write_str("session"),
            Self::Query => f.write_str("query"),
        }
    }
}

/// Whether user-controlled values are HTML-escaped when rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HtmlEscaping {
    #[default]
    Escape,
    /// Interpolate verbatim. Only for reproducing legacy output in tests.
    Raw,
}

#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    session_cookie_secure: bool,
    welcome_source: WelcomeSource,
    html_escaping: HtmlEscaping,
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_session_cookie_secure(mut self, secure: bool) -> Self {
        self.session_cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn with_welcome_source(mut self, source: WelcomeSource) -> Self {
        self.welcome_source = source;
        self
    }

    #[must_use]
    pub fn with_html_escaping(mut self, escaping: HtmlEscaping) -> Self {
        self.html_escaping = escaping;
        self
    }

    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.session_cookie_secure
    }

    #[must_use]
    pub fn welcome_source(&self) -> WelcomeSource {
        self.welcome_source
    }

    #[must_use]
    pub fn html_escaping(&self) -> HtmlEscaping {
        self.html_escaping
    }
}

/// Result of a successful login. The token is only ever handed to the cookie.
pub struct LoginOutcome {
    pub session_token: String,
    pub username: String,
    pub email: String,
}

pub struct AuthState {
    config: AuthConfig,
    users: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    sessions: Arc<dyn SessionStore>,
}

impl AuthState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        users: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            config,
            users,
            hasher,
            sessions,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub(crate) fn users(&self) -> &dyn CredentialStore {
        self.users.as_ref()
    }

    /// Create a user account. Does not log the user in.
    ///
    /// # Errors
    /// `Validation` for missing or mismatched fields (before any store access),
    /// `Conflict` when the username or email is taken, `Infrastructure` otherwise.
    #[instrument(skip_all)]
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AuthError> {
        let (Some(username), Some(email), Some(password), Some(confirm_password)) = (
            required_field(request.username.as_deref()),
            required_field(request.email.as_deref()),
            required_secret(request.password.as_ref()),
            required_secret(request.confirm_password.as_ref()),
        ) else {
            return Err(AuthError::Validation(ALL_FIELDS_REQUIRED));
        };

        if password.expose_secret() != confirm_password.expose_secret() {
            return Err(AuthError::Validation(PASSWORDS_DO_NOT_MATCH));
        }

        match self
            .users
            .find_user_by_username_or_email(&username, &email)
            .await
        {
            Ok(Some(_)) => {
                debug!(username = %username, "username or email already registered");
                return Err(AuthError::Conflict(IDENTITY_TAKEN));
            }
            Ok(None) => (),
            Err(e) => return Err(AuthError::infrastructure(REGISTRATION_FAILED, e)),
        }

        let password = SecretString::from(password.expose_secret().to_string());
        let hasher = self.hasher.clone();
        let password_digest = tokio::task::spawn_blocking(move || hasher.hash(password.expose_secret()))
            .await
            .map_err(|e| AuthError::infrastructure(REGISTRATION_FAILED, e))?
            .map_err(|e| AuthError::infrastructure(REGISTRATION_FAILED, e))?;

        // The pre-check above can race with a concurrent registration; the
        // store's uniqueness constraint has the final word.
        let user = match self
            .users
            .insert_user(NewUser {
                username,
                email,
                password_digest,
            })
            .await
        {
            Ok(user) => user,
            Err(StoreError::Duplicate) => {
                debug!("lost registration race on unique constraint");
                return Err(AuthError::Conflict(IDENTITY_TAKEN));
            }
            Err(e) => return Err(AuthError::infrastructure(REGISTRATION_FAILED, e)),
        };

        info!(user_id = %user.id, username = %user.username, "user registered");

        Ok(user)
    }

    /// Verify credentials and open a session.
    ///
    /// # Errors
    /// `Validation` for missing fields, `InvalidCredentials` for an unknown
    /// username or wrong password, `Infrastructure` otherwise.
    #[instrument(skip_all)]
    pub async fn login(&self, request: LoginRequest) -> Result<LoginOutcome, AuthError> {
        let (Some(username), Some(password)) = (
            required_field(request.username.as_deref()),
            required_secret(request.password.as_ref()),
        ) else {
            return Err(AuthError::Validation(LOGIN_FIELDS_REQUIRED));
        };

        let user = match self.users.find_user_by_username(&username).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!("login for unknown username");
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(AuthError::infrastructure(LOGIN_FAILED, e)),
        };

        let password = SecretString::from(password.expose_secret().to_string());
        let digest = user.password_digest.clone();
        let hasher = self.hasher.clone();
        let valid = tokio::task::spawn_blocking(move || hasher.verify(password.expose_secret(), &digest))
            .await
            .map_err(|e| AuthError::infrastructure(LOGIN_FAILED, e))?
            .map_err(|e| AuthError::infrastructure(LOGIN_FAILED, e))?;

        if !valid {
            debug!(user_id = %user.id, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let session_token =
            generate_session_token().map_err(|e| AuthError::infrastructure(LOGIN_FAILED, e))?;
        let record = SessionRecord {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            created_at_unix: now_unix_seconds(),
        };
        self.sessions
            .put(session_token.clone(), record)
            .await
            .map_err(|e| AuthError::infrastructure(LOGIN_FAILED, e))?;

        info!(user_id = %user.id, "login successful");

        Ok(LoginOutcome {
            session_token,
            username: user.username,
            email: user.email,
        })
    }

    /// Resolve a session token to its record.
    ///
    /// # Errors
    /// Returns `Infrastructure` if the session backend fails.
    pub async fn session(&self, token: &str) -> Result<Option<SessionRecord>, AuthError> {
        self.sessions
            .get(token)
            .await
            .map_err(|e| AuthError::infrastructure(SESSION_LOOKUP_FAILED, e))
    }
}
