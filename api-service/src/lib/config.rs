use std::env;
use std::time::Duration;

use auth::HashCost;
use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub password: PasswordConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Longest accepted token lifetime, one year.
pub const MAX_EXPIRATION_HOURS: i64 = 24 * 365;

#[derive(Deserialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_expiration_hours")]
    pub expiration_hours: i64,
}

/// Argon2id cost used for new password hashes.
#[derive(Debug, Deserialize, Clone)]
pub struct PasswordConfig {
    pub memory_cost_kib: u32,
    pub time_cost: u32,
    pub parallelism: u32,
}

/// Admission control window, applied per client to every route.
#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_seconds: u64,
    #[serde(default)]
    pub trust_forwarded_for: bool,
}

fn default_max_connections() -> u32 {
    5
}

fn default_expiration_hours() -> i64 {
    auth::Authenticator::DEFAULT_TOKEN_TTL_HOURS
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiration_hours", &self.expiration_hours)
            .finish()
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        let cost = HashCost::default();
        Self {
            memory_cost_kib: cost.memory_kib,
            time_cost: cost.iterations,
            parallelism: cost.parallelism,
        }
    }
}

impl PasswordConfig {
    pub fn hash_cost(&self) -> HashCost {
        HashCost {
            memory_kib: self.memory_cost_kib,
            iterations: self.time_cost,
            parallelism: self.parallelism,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_seconds: 60,
            trust_forwarded_for: false,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (APP_JWT__SECRET, APP_SERVER__HTTP_PORT, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default").required(false))
            // Layer on environment-specific configuration
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Layer on environment variables (with __ as separator)
            // Example: APP_DATABASE__URL=postgres://... overrides database.url
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Reject values that deserialize cleanly but cannot be used.
    ///
    /// # Errors
    /// * `Message` - `jwt.expiration_hours` is outside `1..=MAX_EXPIRATION_HOURS`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_EXPIRATION_HOURS).contains(&self.jwt.expiration_hours) {
            return Err(ConfigError::Message(format!(
                "jwt.expiration_hours must be between 1 and {}, got {}",
                MAX_EXPIRATION_HOURS, self.jwt.expiration_hours
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let configuration = ConfigBuilder::builder()
            .set_override("server.http_port", 8080)
            .unwrap()
            .set_override("jwt.secret", "test-secret-key-for-jwt-signing-at-least-32-bytes")
            .unwrap()
            .build()
            .unwrap();

        let config: Config = configuration.try_deserialize().unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.server.http_port, 8080);
        assert!(config.database.is_none());
        assert_eq!(config.jwt.expiration_hours, 24);
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.rate_limit.window(), Duration::from_secs(60));
        assert!(!config.rate_limit.trust_forwarded_for);
        assert_eq!(config.password.hash_cost(), HashCost::default());
    }

    #[test]
    fn test_rate_limit_override() {
        let configuration = ConfigBuilder::builder()
            .set_override("server.http_port", 8080)
            .unwrap()
            .set_override("jwt.secret", "test-secret-key-for-jwt-signing-at-least-32-bytes")
            .unwrap()
            .set_override("rate_limit.max_requests", 3)
            .unwrap()
            .set_override("rate_limit.window_seconds", 60)
            .unwrap()
            .build()
            .unwrap();

        let config: Config = configuration.try_deserialize().unwrap();
        assert_eq!(config.rate_limit.max_requests, 3);
    }

    fn config_with_expiration(hours: i64) -> Config {
        ConfigBuilder::builder()
            .set_override("server.http_port", 8080)
            .unwrap()
            .set_override("jwt.secret", "test-secret-key-for-jwt-signing-at-least-32-bytes")
            .unwrap()
            .set_override("jwt.expiration_hours", hours)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_expiration_hours_bounds() {
        assert!(config_with_expiration(1).validate().is_ok());
        assert!(config_with_expiration(MAX_EXPIRATION_HOURS).validate().is_ok());

        for hours in [0, -1, MAX_EXPIRATION_HOURS + 1, i64::MAX] {
            let err = config_with_expiration(hours).validate().unwrap_err();
            assert!(
                err.to_string().contains("jwt.expiration_hours"),
                "{}: {}",
                hours,
                err
            );
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let jwt = JwtConfig {
            secret: "super-secret-value".to_string(),
            expiration_hours: 1,
        };
        let rendered = format!("{:?}", jwt);
        assert!(!rendered.contains("super-secret-value"));
    }
}
