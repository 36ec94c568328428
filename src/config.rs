use std::net::SocketAddr;
use std::path::PathBuf;

use teloxide::types::UserId;
use thiserror::Error;
use url::Url;

const DEFAULT_DATABASE_URL: &str = "sqlite:kitobxon.db";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} should be set.")]
    Missing(&'static str),
    #[error("{name} can't be parsed: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Webhook {
    pub url: Url,
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub database_url: String,
    pub admin_id: Option<UserId>,
    pub library_seed: Option<PathBuf>,
    pub log_level: String,
    pub webhook: Option<Webhook>,
}

impl Config {
    /// Reads the configuration from the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let token = var("TELOXIDE_TOKEN").ok_or(ConfigError::Missing("TELOXIDE_TOKEN"))?;
        let database_url = var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());
        let log_level = var("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned());
        let library_seed = var("LIBRARY_SEED").map(PathBuf::from);

        let admin_id = var("ADMIN_ID")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map(UserId)
                    .map_err(|e| ConfigError::Invalid {
                        name: "ADMIN_ID",
                        reason: e.to_string(),
                    })
            })
            .transpose()?;

        let webhook_url = var("WEBHOOK_URL")
            .map(|raw| {
                raw.parse::<Url>().map_err(|e| ConfigError::Invalid {
                    name: "WEBHOOK_URL",
                    reason: e.to_string(),
                })
            })
            .transpose()?;
        let webhook_addr = var("WEBHOOK_ADDR")
            .map(|raw| {
                raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                    name: "WEBHOOK_ADDR",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let webhook = match (webhook_url, webhook_addr) {
            (Some(url), Some(addr)) => Some(Webhook { url, addr }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("WEBHOOK_ADDR")),
            (None, Some(_)) => return Err(ConfigError::Missing("WEBHOOK_URL")),
        };

        Ok(Self {
            token,
            database_url,
            admin_id,
            library_seed,
            log_level,
            webhook,
        })
    }

    pub fn is_admin(&self, user: UserId) -> bool {
        self.admin_id == Some(user)
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
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn token_is_required() {
        assert!(matches!(config(&[]), Err(ConfigError::Missing("TELOXIDE_TOKEN"))));
    }

    #[test]
    fn defaults_apply() {
        let cfg = config(&[("TELOXIDE_TOKEN", "123:abc")]).unwrap();
        assert_eq!(cfg.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.admin_id.is_none());
        assert!(cfg.webhook.is_none());
        assert!(!cfg.is_admin(UserId(1)));
    }

    #[test]
    fn admin_id_is_parsed() {
        let cfg = config(&[("TELOXIDE_TOKEN", "t"), ("ADMIN_ID", "6361665798")]).unwrap();
        assert!(cfg.is_admin(UserId(6361665798)));
        assert!(!cfg.is_admin(UserId(1)));
    }

    #[test]
    fn bad_admin_id_is_an_error() {
        let err = config(&[("TELOXIDE_TOKEN", "t"), ("ADMIN_ID", "admin")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "ADMIN_ID", .. }));
    }

    #[test]
    fn webhook_needs_both_halves() {
        let cfg = config(&[
            ("TELOXIDE_TOKEN", "t"),
            ("WEBHOOK_URL", "https://example.org/bot"),
            ("WEBHOOK_ADDR", "127.0.0.1:8443"),
        ])
        .unwrap();
        assert_eq!(cfg.webhook.unwrap().addr.port(), 8443);

        let err = config(&[("TELOXIDE_TOKEN", "t"), ("WEBHOOK_URL", "https://example.org")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("WEBHOOK_ADDR")));
    }
}
