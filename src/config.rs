use std::{net::SocketAddr, path::PathBuf};

use thiserror::Error;
use tracing::Level;
use url::Url;

const DEFAULT_QUESTIONS_DIR: &str = "questions";
const DEFAULT_LOG_LEVEL: Level = Level::ERROR;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} should be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

/// Where question pools are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankSource {
    Files(PathBuf),
    Postgres(String),
}

/// Public URL Telegram posts updates to, and the local address to listen on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Webhook {
    pub url: Url,
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub log_level: Level,
    pub bank: BankSource,
    pub webhook: Option<Webhook>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let token = get("TELOXIDE_TOKEN").ok_or(ConfigError::Missing("TELOXIDE_TOKEN"))?;

        let log_level = match get("LOG_LEVEL") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { key: "LOG_LEVEL", value })?,
            None => DEFAULT_LOG_LEVEL,
        };

        let bank = match get("DATABASE_URL") {
            Some(url) => BankSource::Postgres(url),
            None => BankSource::Files(
                get("QUESTIONS_DIR")
                    .unwrap_or_else(|| DEFAULT_QUESTIONS_DIR.to_owned())
                    .into(),
            ),
        };

        let webhook_url = get("NGROK_URL")
            .map(|value| value.parse::<Url>().map_err(|_| ConfigError::Invalid { key: "NGROK_URL", value }))
            .transpose()?;
        let webhook_addr = get("NGROK_ADDR")
            .map(|value| {
                value
                    .parse::<SocketAddr>()
                    .map_err(|_| ConfigError::Invalid { key: "NGROK_ADDR", value })
            })
            .transpose()?;

        let webhook = match (webhook_url, webhook_addr) {
            (Some(url), Some(addr)) => Some(Webhook { url, addr }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("NGROK_ADDR")),
            (None, Some(_)) => return Err(ConfigError::Missing("NGROK_URL")),
        };

        Ok(Self {
            token,
            log_level,
            bank,
            webhook,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("TELOXIDE_TOKEN", "123:abc")]).unwrap();
        assert_eq!(config.token, "123:abc");
        assert_eq!(config.log_level, Level::ERROR);
        assert_eq!(config.bank, BankSource::Files("questions".into()));
        assert_eq!(config.webhook, None);
    }

    #[test]
    fn test_missing_token() {
        assert!(matches!(config(&[]), Err(ConfigError::Missing("TELOXIDE_TOKEN"))));
    }

    #[test]
    fn test_database_url_selects_postgres() {
        let config = config(&[
            ("TELOXIDE_TOKEN", "t"),
            ("DATABASE_URL", "postgres://localhost/quiz"),
            ("QUESTIONS_DIR", "ignored"),
            ("LOG_LEVEL", "debug"),
        ])
        .unwrap();
        assert_eq!(config.bank, BankSource::Postgres("postgres://localhost/quiz".into()));
        assert_eq!(config.log_level, Level::DEBUG);
    }

    #[test]
    fn test_webhook_needs_both_values() {
        let config_ok = config(&[
            ("TELOXIDE_TOKEN", "t"),
            ("NGROK_URL", "https://example.ngrok.app/"),
            ("NGROK_ADDR", "127.0.0.1:8443"),
        ])
        .unwrap();
        let webhook = config_ok.webhook.unwrap();
        assert_eq!(webhook.addr.port(), 8443);

        assert!(matches!(
            config(&[("TELOXIDE_TOKEN", "t"), ("NGROK_URL", "https://example.ngrok.app/")]),
            Err(ConfigError::Missing("NGROK_ADDR"))
        ));
        assert!(matches!(
            config(&[("TELOXIDE_TOKEN", "t"), ("NGROK_ADDR", "nope")]),
            Err(ConfigError::Invalid { key: "NGROK_ADDR", .. })
        ));
    }

    #[test]
    fn test_invalid_log_level() {
        assert!(matches!(
            config(&[("TELOXIDE_TOKEN", "t"), ("LOG_LEVEL", "loud")]),
            Err(ConfigError::Invalid { key: "LOG_LEVEL", .. })
        ));
    }
}
