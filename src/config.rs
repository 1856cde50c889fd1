use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    /// Shared secret for gateway callback signatures; callbacks are refused without it.
    pub payment_hash_secret: Option<String>,
    pub hold_expiry: Duration,
    pub cleanup_interval: Duration,
    pub reminder_interval: Duration,
    pub hybrid_default_groups: usize,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

fn parse_or<T: std::str::FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
    expected: &str,
) -> Result<T, ConfigError> {
    env_map
        .get(key)
        .map(|s| s.as_str())
        .unwrap_or(default)
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue(key.to_string(), format!("must be {}", expected)))
}

fn positive_secs(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
) -> Result<Duration, ConfigError> {
    let secs: u64 = parse_or(env_map, key, default, "a whole number of seconds")?;
    if secs == 0 {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = parse_or::<u16>(&env_map, "PORT", "8080", "a valid u16")?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let payment_hash_secret = env_map
            .get("PAYMENT_HASH_SECRET")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let hold_expiry = positive_secs(&env_map, "HOLD_EXPIRY_SECS", "300")?;
        let cleanup_interval = positive_secs(&env_map, "CLEANUP_INTERVAL_SECS", "60")?;
        let reminder_interval = positive_secs(&env_map, "REMINDER_INTERVAL_SECS", "1800")?;

        let hybrid_default_groups =
            parse_or::<usize>(&env_map, "HYBRID_DEFAULT_GROUPS", "4", "a positive integer")?;
        if hybrid_default_groups == 0 {
            return Err(ConfigError::InvalidValue(
                "HYBRID_DEFAULT_GROUPS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Config {
            port,
            database_path,
            payment_hash_secret,
            hold_expiry,
            cleanup_interval,
            reminder_interval,
            hybrid_default_groups,
        })
    }

    /// Settings for tests and tools that only need a database.
    pub fn for_database(database_path: impl Into<String>) -> Self {
        Config {
            port: 8080,
            database_path: database_path.into(),
            payment_hash_secret: None,
            hold_expiry: Duration::from_secs(300),
            cleanup_interval: Duration::from_secs(60),
            reminder_interval: Duration::from_secs(1800),
            hybrid_default_groups: 4,
        }
    }
}
