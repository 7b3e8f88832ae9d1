//! Auth handlers and supporting modules.
//!
//! Registration and login share one [`AuthState`], which owns the three
//! collaborators the flows need:
//!
//! - a [`CredentialStore`] for user records,
//! - a [`PasswordHasher`] producing Argon2id digests,
//! - a [`SessionStore`] mapping session tokens to logged-in users.
//!
//! All of them are trait objects so the server wires `PostgreSQL` and the
//! in-memory session map while tests use in-memory stores throughout.

mod error;
mod hasher;
mod session;
mod state;
mod storage;
pub(crate) mod types;
mod utils;

pub use error::AuthError;
pub use hasher::{Argon2Hasher, PasswordHasher};
pub(crate) use session::{extract_session_token, session_cookie};
pub use session::{MemorySessionStore, SessionRecord, SessionStore};
pub(crate) use state::LOGIN_FAILED;
pub use state::{AuthConfig, AuthState, HtmlEscaping, LoginOutcome, WelcomeSource};
pub use storage::{
    CredentialStore, MemoryCredentialStore, NewUser, PgCredentialStore, StoreError, User,
};
pub use types::{LoginRequest, RegisterRequest};
