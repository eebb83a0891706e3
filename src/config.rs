// Layered settings: defaults < TOML file < CCBOT_* env vars < CLI overrides
use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::engine::types::CrossPolicy;
use crate::execution::{Credentials, OrderType};
use crate::market_data::adapters::Venue;

pub const DEFAULT_CONFIG_PATH: &str = "ccbot.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("no API credentials configured for {0}")]
    MissingCredentials(Venue),
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub venue: Venue,
    pub symbol: String,
    pub depth: usize, // levels printed per update
    pub ws_url: Option<String>,
    pub rest_url: Option<String>,
    #[serde(default)]
    pub order_type: OrderType,
    pub trade_log: Option<PathBuf>,
    #[serde(default)]
    pub cross_policy: CrossPolicy,
    #[serde(default)]
    pub credentials: Credentials,
}

impl AppConfig {
    /// Load from `path` (optional file) and the process environment, then
    /// apply `overrides` as dotted `key = value` pairs.
    pub fn load(path: &Path, overrides: &[(&str, String)]) -> Result<Self, ConfigError> {
        Self::build(path, env_source(), overrides)
    }

    fn build(path: &Path, env: Environment, overrides: &[(&str, String)]) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("venue", "bitflyer")?
            .set_default("symbol", "FX_BTC_JPY")?
            .set_default("depth", 5)?
            .add_source(File::from(path).required(false))
            .add_source(env);
        for (key, value) in overrides {
            builder = builder.set_override(*key, value.as_str())?;
        }

        let settings: AppConfig = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("symbol must not be empty".into()));
        }
        if self.depth == 0 {
            return Err(ConfigError::Invalid("depth must be at least 1".into()));
        }
        Ok(())
    }

    pub fn ws_url(&self) -> &str {
        self.ws_url.as_deref().unwrap_or_else(|| self.venue.ws_url())
    }

    pub fn rest_url(&self) -> &str {
        self.rest_url.as_deref().unwrap_or_else(|| self.venue.rest_url())
    }

    /// Credentials for private endpoints. Only commands that trade or read the
    /// account need them, so their absence is checked here rather than on load.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        if self.credentials.is_complete() {
            Ok(self.credentials.clone())
        } else {
            Err(ConfigError::MissingCredentials(self.venue))
        }
    }
}

// CCBOT_SYMBOL, CCBOT_CREDENTIALS__API_KEY, ...
fn env_source() -> Environment {
    Environment::with_prefix("CCBOT")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        env_source().source(Some(map))
    }

    fn toml_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_without_file() {
        let settings = AppConfig::build(Path::new("does-not-exist.toml"), env(&[]), &[]).unwrap();
        assert_eq!(settings.venue, Venue::Bitflyer);
        assert_eq!(settings.symbol, "FX_BTC_JPY");
        assert_eq!(settings.depth, 5);
        assert_eq!(settings.order_type, OrderType::Limit);
        assert_eq!(settings.cross_policy, CrossPolicy::SinglePass);
        assert_eq!(settings.ws_url(), Venue::Bitflyer.ws_url());
        assert!(matches!(settings.credentials(), Err(ConfigError::MissingCredentials(Venue::Bitflyer))));
    }

    #[test]
    fn test_file_then_env_then_overrides() {
        let file = toml_file(
            r#"
venue = "gmo"
symbol = "BTC_JPY"
depth = 3
order_type = "MARKET"
cross_policy = "until_uncrossed"
rest_url = "http://localhost:9999"

[credentials]
api_key = "file-key"
secret_key = "file-secret"
"#,
        );

        let settings = AppConfig::build(
            file.path(),
            env(&[("CCBOT_DEPTH", "8"), ("CCBOT_CREDENTIALS__API_KEY", "env-key")]),
            &[("symbol", "ETH_JPY".to_string())],
        )
        .unwrap();

        assert_eq!(settings.venue, Venue::Gmo);
        assert_eq!(settings.symbol, "ETH_JPY");
        assert_eq!(settings.depth, 8);
        assert_eq!(settings.order_type, OrderType::Market);
        assert_eq!(settings.cross_policy, CrossPolicy::UntilUncrossed);
        assert_eq!(settings.rest_url(), "http://localhost:9999");
        assert_eq!(settings.ws_url(), Venue::Gmo.ws_url());

        let creds = settings.credentials().unwrap();
        assert_eq!(creds.api_key, "env-key");
        assert_eq!(creds.secret_key, "file-secret");
    }

    #[test]
    fn test_rejects_zero_depth_and_empty_symbol() {
        let err = AppConfig::build(Path::new("none.toml"), env(&[]), &[("depth", "0".into())]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = AppConfig::build(Path::new("none.toml"), env(&[]), &[("symbol", " ".into())]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_unknown_venue_fails_to_load() {
        let err = AppConfig::build(Path::new("none.toml"), env(&[("CCBOT_VENUE", "kraken")]), &[]).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }
}
