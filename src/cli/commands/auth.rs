use crate::api::handlers::auth::WelcomeSource;
use anyhow::{anyhow, Result};
use clap::{builder::BoolishValueParser, Arg, ArgAction, ArgMatches, Command};

pub const ARG_SESSION_COOKIE_SECURE: &str = "session-cookie-secure";
pub const ARG_WELCOME_SOURCE: &str = "welcome-source";
pub const ARG_UNSAFE_RAW_HTML: &str = "unsafe-raw-html";

#[derive(Debug)]
pub struct Options {
    pub session_cookie_secure: bool,
    pub welcome_source: WelcomeSource,
    pub unsafe_raw_html: bool,
}

impl Options {
    /// # Errors
    /// Returns an error if the welcome source is not recognised.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let welcome_source = matches
            .get_one::<String>(ARG_WELCOME_SOURCE)
            .map_or(Ok(WelcomeSource::default()), |value| {
                value.parse::<WelcomeSource>()
            })
            .map_err(|e| anyhow!(e))?;

        Ok(Self {
            session_cookie_secure: matches.get_flag(ARG_SESSION_COOKIE_SECURE),
            welcome_source,
            unsafe_raw_html: matches.get_flag(ARG_UNSAFE_RAW_HTML),
        })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_COOKIE_SECURE)
                .long(ARG_SESSION_COOKIE_SECURE)
                .help("Mark the session cookie Secure (serve over HTTPS)")
                .env("GATEKEEP_SESSION_COOKIE_SECURE")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
        .arg(
            Arg::new(ARG_WELCOME_SOURCE)
                .long(ARG_WELCOME_SOURCE)
                .help("Where /welcome reads the identity from: session or query")
                .long_help(
                    "Where /welcome reads the identity from. `session` uses the session cookie set by /login. `query` trusts the username and email query parameters and exists for legacy clients only.",
                )
                .env("GATEKEEP_WELCOME_SOURCE")
                .default_value("session")
                .value_parser(["session", "query"]),
        )
        .arg(
            Arg::new(ARG_UNSAFE_RAW_HTML)
                .long(ARG_UNSAFE_RAW_HTML)
                .help("Render /welcome values without HTML escaping (testing only)")
                .env("GATEKEEP_UNSAFE_RAW_HTML")
                .action(ArgAction::SetTrue)
                .value_parser(BoolishValueParser::new()),
        )
}
