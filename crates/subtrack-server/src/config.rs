//! Server configuration.
//!
//! Layered with the `config` crate: built-in defaults, then a YAML file
//! (explicit `--config` path, or `subtrack.yaml` in the working
//! directory if present), then `SUBTRACK__SECTION__KEY` environment
//! variables.

use std::path::Path;

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use subtrack_auth::AuthConfig;
use subtrack_core::aggregation::DEFAULT_CURRENCY;
use subtrack_db::DbConfig;

const DEFAULT_FILE: &str = "subtrack.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthSettings,
    pub billing: BillingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let db = DbConfig::default();
        Self {
            url: db.url,
            namespace: db.namespace,
            database: db.database,
            username: db.username,
            password: db.password,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub token_lifetime_secs: u64,
    pub pepper: Option<String>,
    pub min_password_length: usize,
}

impl Default for AuthSettings {
    fn default() -> Self {
        let auth = AuthConfig::default();
        Self {
            jwt_secret: auth.jwt_secret,
            jwt_issuer: auth.jwt_issuer,
            token_lifetime_secs: auth.token_lifetime_secs,
            pepper: auth.pepper,
            min_password_length: auth.min_password_length,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Currency used when a subscription omits one, and as the summary
    /// currency for users with no subscriptions.
    pub default_currency: String,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            default_currency: DEFAULT_CURRENCY.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
        }
    }
}

fn environment() -> Environment {
    Environment::with_prefix("SUBTRACK")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with(path, environment())
    }

    fn load_with(path: Option<&Path>, env: Environment) -> Result<Self, ConfigError> {
        let mut builder =
            ConfigBuilder::builder().add_source(ConfigBuilder::try_from(&Config::default())?);

        match path {
            Some(path) => builder = builder.add_source(File::from(path)),
            None if Path::new(DEFAULT_FILE).exists() => {
                builder = builder.add_source(File::from(Path::new(DEFAULT_FILE)));
            }
            None => {}
        }

        builder = builder.add_source(env);

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Message(
                "auth.jwt_secret must be set (e.g. SUBTRACK__AUTH__JWT_SECRET)".into(),
            ));
        }
        if self.auth.token_lifetime_secs == 0 {
            return Err(ConfigError::Message(
                "auth.token_lifetime_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            jwt_secret: self.auth.jwt_secret.clone(),
            jwt_issuer: self.auth.jwt_issuer.clone(),
            token_lifetime_secs: self.auth.token_lifetime_secs,
            pepper: self.auth.pepper.clone(),
            min_password_length: self.auth.min_password_length,
        }
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.database.url.clone(),
            namespace: self.database.namespace.clone(),
            database: self.database.database.clone(),
            username: self.database.username.clone(),
            password: self.database.password.clone(),
        }
    }
}
