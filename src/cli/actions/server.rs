use crate::{
    api,
    api::handlers::auth::{AuthConfig, HtmlEscaping, WelcomeSource},
};
use anyhow::{Context, Result};
use std::fmt::Write as _;
use tracing::info;
use url::Url;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub session_cookie_secure: bool,
    pub welcome_source: WelcomeSource,
    pub unsafe_raw_html: bool,
}

impl Args {
    fn auth_config(&self) -> AuthConfig {
        let html_escaping = if self.unsafe_raw_html {
            HtmlEscaping::Raw
        } else {
            HtmlEscaping::Escape
        };

        AuthConfig::new()
            .with_session_cookie_secure(self.session_cookie_secure)
            .with_welcome_source(self.welcome_source)
            .with_html_escaping(html_escaping)
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the DSN is not a URL or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    Url::parse(&args.dsn).context("Invalid database connection string")?;

    log_startup_args(&args);

    let auth_config = args.auth_config();

    api::new(args.port, args.dsn, auth_config).await
}

fn log_startup_args(args: &Args) {
    info!("{}", startup_message(args));
}

fn startup_message(args: &Args) -> String {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("dsn", redact_dsn(&args.dsn)),
        (
            "session_cookie_secure",
            args.session_cookie_secure.to_string(),
        ),
        ("welcome_source", args.welcome_source.to_string()),
        ("unsafe_raw_html", args.unsafe_raw_html.to_string()),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ = write!(message, "\n  {key}:{padding} {value}");
    }
    message
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

fn short_commit(hash: &str) -> &str {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed)
}
