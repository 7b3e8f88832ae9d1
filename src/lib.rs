//! # Gatekeep
//!
//! `gatekeep` is a small credential-based authentication service: users
//! register with a username, email and password, log in, and land on a
//! personalized welcome page.
//!
//! ## Credentials
//!
//! Passwords are hashed with Argon2id using a fixed work factor and stored as
//! PHC strings. Usernames and emails are trimmed and must be unique; the
//! credential store's unique constraint is the final arbiter, so two
//! concurrent registrations for the same identity resolve to one success and
//! one conflict.
//!
//! ## Sessions
//!
//! A successful login issues a random session token, records the session in
//! an injected [`SessionStore`](api::handlers::auth::SessionStore) and hands
//! the token back only as an `HttpOnly` cookie. `/welcome` resolves the
//! cookie against the store. Sessions never expire and live as long as the
//! process.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
