use std::env;
use std::time::Duration;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub cookie: CookieConfig,
    #[serde(default)]
    pub password: PasswordConfig,
    pub email: EmailConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// "development" or "production"; production marks the session cookie `Secure`
    pub environment: String,
    /// Externally reachable base URL, used to build password reset links
    pub public_url: String,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
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

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

impl JwtConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.expiration_hours)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CookieConfig {
    pub expiration_days: i64,
}

/// Argon2 cost parameters
#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub from: String,
    #[serde(default = "default_email_timeout_secs")]
    pub timeout_secs: u64,
    /// Without SMTP settings outgoing mail is only logged
    pub smtp: Option<SmtpConfig>,
}

impl EmailConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

fn default_max_connections() -> u32 {
    5
}

fn default_email_timeout_secs() -> u64 {
    10
}

/// Secret shipped in `config/default.toml`; never acceptable in production.
pub const DEVELOPMENT_JWT_SECRET: &str = "change-me-development-secret-at-least-32-bytes";

/// HS256 secrets shorter than this are rejected at startup.
pub const MIN_JWT_SECRET_BYTES: usize = 32;

/// Variables such as `JWT__SECRET` override `jwt.secret`.
fn environment() -> Environment {
    Environment::default().separator("__")
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__SECRET, etc.)
    /// 2. Environment-specific config file (config/{RUN_MODE}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());
        Self::load_from(&run_mode, environment())
    }

    fn load_from(run_mode: &str, environment: Environment) -> Result<Self, ConfigError> {
        let configuration = ConfigBuilder::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            .add_source(environment)
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Refuse settings that would let anyone forge a session token.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.len() < MIN_JWT_SECRET_BYTES {
            return Err(ConfigError::Message(format!(
                "jwt.secret must be at least {} bytes",
                MIN_JWT_SECRET_BYTES
            )));
        }

        if self.app.is_production() && self.jwt.secret == DEVELOPMENT_JWT_SECRET {
            return Err(ConfigError::Message(
                "jwt.secret still holds the development default; set JWT__SECRET".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "an-operator-supplied-secret-of-more-than-32-bytes";

    fn variables(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn load(run_mode: &str, pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        Config::load_from(run_mode, environment().source(Some(variables(pairs))))
    }

    #[test]
    fn test_defaults_load_in_development() {
        let config = load("development", &[]).unwrap();

        assert_eq!(config.jwt.secret, DEVELOPMENT_JWT_SECRET);
        assert!(!config.app.is_production());
        assert_eq!(config.cookie.expiration_days, 90);
    }

    #[test]
    fn test_environment_overrides_files() {
        let config = load(
            "development",
            &[
                ("JWT__SECRET", SECRET),
                ("JWT__EXPIRATION_HOURS", "48"),
                ("COOKIE__EXPIRATION_DAYS", "7"),
                ("DATABASE__URL", "postgresql://db.internal/accounts"),
            ],
        )
        .unwrap();

        assert_eq!(config.jwt.secret, SECRET);
        assert_eq!(config.jwt.ttl(), chrono::Duration::hours(48));
        assert_eq!(config.cookie.expiration_days, 7);
        assert_eq!(config.database.url, "postgresql://db.internal/accounts");
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let result = load("development", &[("JWT__SECRET", "too-short")]);

        assert!(matches!(result, Err(ConfigError::Message(_))));
    }

    #[test]
    fn test_production_refuses_development_secret() {
        let result = load("production", &[]);
        assert!(matches!(result, Err(ConfigError::Message(_))));

        let config = load("production", &[("JWT__SECRET", SECRET)]).unwrap();
        assert!(config.app.is_production());
        assert_eq!(config.jwt.secret, SECRET);
    }
}
