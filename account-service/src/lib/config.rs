use std::env;

use auth::SettingsError;
use auth::TokenSettings;
use config::builder::DefaultState;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

/// Application configuration for account-service.
///
/// Loaded once at startup; the values are then treated as immutable.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    /// PostgreSQL store; the in-memory store is used when absent
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default = "default_access_token_expire_minutes")]
    pub access_token_expire_minutes: i64,
    #[serde(default = "default_refresh_token_expire_minutes")]
    pub refresh_token_expire_minutes: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("access_token_expire_minutes", &self.access_token_expire_minutes)
            .field("refresh_token_expire_minutes", &self.refresh_token_expire_minutes)
            .finish()
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_access_token_expire_minutes() -> i64 {
    TokenSettings::DEFAULT_ACCESS_MINUTES
}

fn default_refresh_token_expire_minutes() -> i64 {
    TokenSettings::DEFAULT_REFRESH_MINUTES
}

impl JwtConfig {
    /// Validate into the settings consumed by `auth::Authenticator`.
    pub fn token_settings(&self) -> Result<TokenSettings, SettingsError> {
        TokenSettings::new(
            self.secret.as_bytes(),
            &self.algorithm,
            self.access_token_expire_minutes,
            self.refresh_token_expire_minutes,
        )
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Flat variables SECRET_KEY, ALGORITHM, ACCESS_TOKEN_EXPIRE_MINUTES,
    ///    REFRESH_TOKEN_EXPIRE_MINUTES, DATABASE_URL
    /// 2. Environment variables (JWT__SECRET, SERVER__HTTP_PORT, etc.)
    /// 3. Environment-specific config file (config/{environment}.toml)
    /// 4. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = Self::defaults()?
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: JWT__SECRET=... overrides jwt.secret
            .add_source(Environment::default().separator("__"))
            .set_override_option("jwt.secret", env::var("SECRET_KEY").ok())?
            .set_override_option("jwt.algorithm", env::var("ALGORITHM").ok())?
            .set_override_option(
                "jwt.access_token_expire_minutes",
                env::var("ACCESS_TOKEN_EXPIRE_MINUTES").ok(),
            )?
            .set_override_option(
                "jwt.refresh_token_expire_minutes",
                env::var("REFRESH_TOKEN_EXPIRE_MINUTES").ok(),
            )?
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .build()?;

        configuration.try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<DefaultState>, ConfigError> {
        ConfigBuilder::builder().set_default("server.http_port", 8000)
    }
}
