//! Configuration loading and representation.
//!
//! Sources, later ones winning:
//!
//! 1. `{config_dir}/default.toml`
//! 2. `{config_dir}/{APP_ENV}.toml` (`APP_ENV` defaults to `development`)
//! 3. `DRESSCODE_*` environment variables, `__` separating nested keys
//!    (`DRESSCODE_DATABASE__URL`, `DRESSCODE_JWT__SECRET`)
//!
//! Missing files are skipped, so a deployment can run on env vars alone.

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::Secret;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<Secret<String>>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// `false` keeps everything in process memory (dev and tests).
    #[serde(default)]
    pub use_persistent: bool,
}

fn default_max_connections() -> u32 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
            use_persistent: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    #[serde(default = "default_access_ttl")]
    pub access_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl_secs: u64,
}

fn default_access_ttl() -> u64 {
    15 * 60
}

fn default_refresh_ttl() -> u64 {
    15 * 24 * 60 * 60
}

/// Account created (or promoted) at startup so a fresh deployment has an admin.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub name: String,
    pub email: String,
    pub password: Secret<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub admin: Option<AdminConfig>,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let figment = Figment::new()
            .merge(Toml::file(format!("{config_dir}/default.toml")))
            .merge(Toml::file(format!("{config_dir}/{env}.toml")))
            .merge(Env::prefixed("DRESSCODE_").split("__"));

        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// In-memory configuration for local runs and tests.
    pub fn default_dev() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            jwt: JwtConfig {
                secret: Secret::new("dev-secret-change-me".to_string()),
                access_ttl_secs: default_access_ttl(),
                refresh_ttl_secs: default_refresh_ttl(),
            },
            admin: None,
            telemetry: TelemetryConfig::default(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.use_persistent && self.database.url.is_none() {
            return Err(ConfigError::Invalid(
                "database.url is required when database.use_persistent is set".to_string(),
            ));
        }
        if self.jwt.access_ttl_secs == 0 || self.jwt.refresh_ttl_secs == 0 {
            return Err(ConfigError::Invalid("token lifetimes must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn from_toml(s: &str) -> Result<AppConfig, ConfigError> {
        AppConfig::from_figment(Figment::new().merge(Toml::string(s)))
    }

    #[test]
    fn minimal_config_fills_defaults() {
        let config = from_toml(
            r#"
            [jwt]
            secret = "s3cret"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.jwt.access_ttl_secs, 900);
        assert_eq!(config.jwt.refresh_ttl_secs, 1_296_000);
        assert_eq!(config.jwt.secret.expose_secret(), "s3cret");
        assert!(!config.database.use_persistent);
        assert!(config.admin.is_none());
    }

    #[test]
    fn persistent_store_needs_a_url() {
        let err = from_toml(
            r#"
            [database]
            use_persistent = true
            [jwt]
            secret = "s"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn missing_jwt_secret_fails() {
        assert!(matches!(from_toml(""), Err(ConfigError::Load(_))));
    }
}
