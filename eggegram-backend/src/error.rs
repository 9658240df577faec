//! Error types shared across the bot.
//!
//! Invalid user input is not an error: it is a normal branch of the number
//! handler (see `commands::log_eggs::EggInput`).

use egg_ledger_types::SchemaError;

/// Longest remote error body carried into an error message.
pub const MAX_ERROR_BODY: usize = 500;

/// Startup configuration problems. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// The ledger store could not be read or written.
///
/// Every variant is transient from the bot's point of view: the command
/// handler logs it and apologises, and nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("ledger store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("ledger store authentication failed: {0}")]
    Auth(String),

    #[error("ledger store returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("ledger sheet is malformed: {0}")]
    Schema(#[from] SchemaError),
}

/// Cut a remote error body down to [`MAX_ERROR_BODY`] bytes.
pub fn truncate_error(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
