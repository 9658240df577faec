use crate::error::ConfigError;
use crate::ledger::auth::ServiceAccountKey;
use std::env;
use std::fmt;
use std::net::SocketAddr;
use url::Url;

pub const DEFAULT_SHEET_NAME: &str = "EggLog";
pub const DEFAULT_WEBHOOK_PORT: u16 = 8443;

#[derive(Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub service_account: ServiceAccountKey,
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// `{WEBHOOK_URL}/{token}` when webhook delivery is configured.
    pub webhook_endpoint: Option<Url>,
    pub port: u16,
}

/// How Telegram updates reach the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Polling,
    Webhook { listen: SocketAddr, url: Url },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let telegram_bot_token = require("TELEGRAM_BOT_TOKEN")?;

        let credentials = require("GOOGLE_SERVICE_ACCOUNT_JSON")?;
        let service_account =
            ServiceAccountKey::from_json(&credentials).map_err(|reason| ConfigError::Invalid {
                key: "GOOGLE_SERVICE_ACCOUNT_JSON",
                reason,
            })?;

        let spreadsheet_id = require("GOOGLE_SHEETS_ID")?;
        let sheet_name = get("EGG_SHEET_NAME").unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string());

        let port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "PORT",
                reason: format!("'{}' is not a valid port number", raw),
            })?,
            None => DEFAULT_WEBHOOK_PORT,
        };

        let webhook_endpoint = get("WEBHOOK_URL")
            .map(|base| {
                let endpoint = format!("{}/{}", base.trim_end_matches('/'), telegram_bot_token);
                Url::parse(&endpoint).map_err(|e| ConfigError::Invalid {
                    key: "WEBHOOK_URL",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        Ok(Self {
            telegram_bot_token,
            service_account,
            spreadsheet_id,
            sheet_name,
            webhook_endpoint,
            port,
        })
    }

    pub fn delivery(&self) -> Delivery {
        match &self.webhook_endpoint {
            Some(url) => Delivery::Webhook {
                listen: SocketAddr::from(([0, 0, 0, 0], self.port)),
                url: url.clone(),
            },
            None => Delivery::Polling,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("telegram_bot_token", &"<redacted>")
            .field("service_account", &self.service_account)
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("sheet_name", &self.sheet_name)
            .field("webhook", &self.webhook_endpoint.is_some())
            .field("port", &self.port)
            .finish()
    }
}
