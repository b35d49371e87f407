//! Configuration management for the homework bot
//!
//! Non-secret settings come from defaults, an optional settings file and
//! `HOMEWORK_BOT_*` environment variables. The three secrets are read
//! separately through [`Credentials`] so they never end up in a settings file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::error::{Error, Result};

/// Default homework status endpoint
pub const PRACTICUM_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

/// Default Telegram Bot API base URL
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Environment variable holding the Practicum OAuth token
pub const PRACTICUM_TOKEN_VAR: &str = "PRACTICUM_TOKEN";
/// Environment variable holding the Telegram bot token
pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_TOKEN";
/// Environment variable holding the destination chat id
pub const TELEGRAM_CHAT_ID_VAR: &str = "TELEGRAM_CHAT_ID";

const ENV_PREFIX: &str = "HOMEWORK_BOT";

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Homework API configuration
    pub api: ApiConfig,

    /// Telegram configuration
    pub telegram: TelegramConfig,

    /// Polling loop configuration
    pub polling: PollingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// Later sources override earlier ones. Environment keys use a double
    /// underscore between section and field, e.g.
    /// `HOMEWORK_BOT_POLLING__RETRY_PERIOD=5m`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the bot cannot run with
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.api.endpoint)
            .map_err(|e| Error::config(format!("api.endpoint {:?}: {e}", self.api.endpoint)))?;
        Url::parse(&self.telegram.api_base).map_err(|e| {
            Error::config(format!("telegram.api_base {:?}: {e}", self.telegram.api_base))
        })?;

        if self.polling.retry_period.is_zero() {
            return Err(Error::config("polling.retry_period must be greater than zero"));
        }

        Ok(())
    }
}

/// Homework API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Status endpoint URL
    pub endpoint: String,
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: PRACTICUM_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Telegram configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot API base URL
    pub api_base: String,
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: TELEGRAM_API_BASE.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Polling loop configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Fixed sleep between cycles
    #[serde(with = "humantime_serde")]
    pub retry_period: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            retry_period: Duration::from_secs(600),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// The three secrets as read from the environment, any of which may be absent
#[derive(Clone, Default)]
pub struct Credentials {
    /// Practicum OAuth token
    pub practicum_token: Option<String>,
    /// Telegram bot token
    pub telegram_token: Option<String>,
    /// Destination chat id
    pub telegram_chat_id: Option<String>,
}

impl Credentials {
    /// Read the secrets from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the secrets through an arbitrary lookup function
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            practicum_token: lookup(PRACTICUM_TOKEN_VAR),
            telegram_token: lookup(TELEGRAM_TOKEN_VAR),
            telegram_chat_id: lookup(TELEGRAM_CHAT_ID_VAR),
        }
    }

    /// Names of the variables that were not set
    pub fn missing(&self) -> Vec<&'static str> {
        [
            (PRACTICUM_TOKEN_VAR, &self.practicum_token),
            (TELEGRAM_TOKEN_VAR, &self.telegram_token),
            (TELEGRAM_CHAT_ID_VAR, &self.telegram_chat_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| name)
        .collect()
    }

    /// True iff all three secrets are present. An empty value counts as present.
    pub fn tokens_present(&self) -> bool {
        self.missing().is_empty()
    }

    /// Turn the credentials into [`Secrets`], failing if any is absent
    pub fn require(self) -> Result<Secrets> {
        match (self.practicum_token, self.telegram_token, self.telegram_chat_id) {
            (Some(practicum_token), Some(telegram_token), Some(telegram_chat_id)) => Ok(Secrets {
                practicum_token,
                telegram_token,
                telegram_chat_id,
            }),
            (practicum_token, telegram_token, telegram_chat_id) => {
                let missing = Self {
                    practicum_token,
                    telegram_token,
                    telegram_chat_id,
                }
                .missing()
                .join(", ");
                Err(Error::config(format!(
                    "missing required environment variable(s): {missing}"
                )))
            }
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("practicum_token", &self.practicum_token.as_ref().map(|_| "<redacted>"))
            .field("telegram_token", &self.telegram_token.as_ref().map(|_| "<redacted>"))
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}

/// Validated secrets, all present
#[derive(Clone)]
pub struct Secrets {
    /// Practicum OAuth token
    pub practicum_token: String,
    /// Telegram bot token
    pub telegram_token: String,
    /// Destination chat id
    pub telegram_chat_id: String,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("practicum_token", &"<redacted>")
            .field("telegram_token", &"<redacted>")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_tokens_present_when_all_set() {
        let creds = Credentials::from_lookup(lookup_from(&[
            (PRACTICUM_TOKEN_VAR, "p"),
            (TELEGRAM_TOKEN_VAR, "t"),
            (TELEGRAM_CHAT_ID_VAR, "42"),
        ]));

        assert!(creds.tokens_present());
        assert!(creds.missing().is_empty());
    }

    #[test]
    fn test_tokens_absent_lists_missing() {
        let creds = Credentials::from_lookup(lookup_from(&[(TELEGRAM_TOKEN_VAR, "t")]));

        assert!(!creds.tokens_present());
        assert_eq!(creds.missing(), vec![PRACTICUM_TOKEN_VAR, TELEGRAM_CHAT_ID_VAR]);
    }

    #[test]
    fn test_empty_value_counts_as_present() {
        let creds = Credentials::from_lookup(lookup_from(&[
            (PRACTICUM_TOKEN_VAR, ""),
            (TELEGRAM_TOKEN_VAR, "t"),
            (TELEGRAM_CHAT_ID_VAR, "42"),
        ]));

        assert!(creds.tokens_present());
    }

    #[test]
    fn test_require_reports_missing_names() {
        let err = Credentials::from_lookup(lookup_from(&[(PRACTICUM_TOKEN_VAR, "p")]))
            .require()
            .unwrap_err();

        let text = err.to_string();
        assert!(text.contains(TELEGRAM_TOKEN_VAR));
        assert!(text.contains(TELEGRAM_CHAT_ID_VAR));
        assert!(!text.contains(PRACTICUM_TOKEN_VAR));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let secrets = Credentials::from_lookup(lookup_from(&[
            (PRACTICUM_TOKEN_VAR, "super-secret"),
            (TELEGRAM_TOKEN_VAR, "bot-secret"),
            (TELEGRAM_CHAT_ID_VAR, "42"),
        ]))
        .require()
        .unwrap();

        let printed = format!("{secrets:?}");
        assert!(!printed.contains("super-secret"));
        assert!(!printed.contains("bot-secret"));
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.api.endpoint, PRACTICUM_ENDPOINT);
        assert_eq!(config.polling.retry_period, Duration::from_secs(600));
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[polling]\nretry_period = \"2m\"\n\n[logging]\nformat = \"json\""
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();

        assert_eq!(config.polling.retry_period, Duration::from_secs(120));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.telegram.api_base, TELEGRAM_API_BASE);
    }

    #[test]
    fn test_zero_retry_period_rejected() {
        let mut config = Config::default();
        config.polling.retry_period = Duration::ZERO;

        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_bad_endpoint_rejected() {
        let mut config = Config::default();
        config.api.endpoint = "not a url".to_string();

        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
