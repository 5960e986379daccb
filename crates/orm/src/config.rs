//! Database configuration
//!
//! Connection settings come from the environment (`DATABASE_URL`,
//! `DB_MAX_CONNECTIONS`, `DB_MIN_CONNECTIONS`, `DB_ACQUIRE_TIMEOUT`) or from
//! any serde source.

use std::str::FromStr;

use serde::Deserialize;

use crate::backends::DatabaseBackendType;
use crate::error::{ModelError, ModelResult};

/// Connection pool configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    /// Seconds to wait for a free connection
    pub acquire_timeout: u64,
    pub idle_timeout: Option<u64>,
    pub max_lifetime: Option<u64>,
    pub test_before_acquire: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: 30,
            idle_timeout: Some(600), // 10 minutes
            max_lifetime: Some(1800), // 30 minutes
            test_before_acquire: true,
        }
    }
}

/// Database connection configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default)]
    pub pool: PoolConfig,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pool: PoolConfig::default(),
        }
    }

    /// Configuration for the in-memory backend
    pub fn memory() -> Self {
        Self::new("memory://default")
    }

    pub fn with_pool(mut self, pool: PoolConfig) -> Self {
        self.pool = pool;
        self
    }

    /// Read the configuration from process environment variables
    pub fn from_env() -> ModelResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> ModelResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ModelError::Configuration("DATABASE_URL is not set".to_string()))?;

        let defaults = PoolConfig::default();
        let pool = PoolConfig {
            max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS")?.unwrap_or(defaults.max_connections),
            min_connections: parse_var(&lookup, "DB_MIN_CONNECTIONS")?.unwrap_or(defaults.min_connections),
            acquire_timeout: parse_var(&lookup, "DB_ACQUIRE_TIMEOUT")?.unwrap_or(defaults.acquire_timeout),
            ..defaults
        };

        let config = Self { url, pool };
        config.validate()?;
        Ok(config)
    }

    /// Backend selected by the URL scheme
    pub fn backend(&self) -> ModelResult<DatabaseBackendType> {
        DatabaseBackendType::from_url(&self.url).map_err(ModelError::Configuration)
    }

    pub fn validate(&self) -> ModelResult<()> {
        self.backend()?;
        if self.pool.max_connections == 0 {
            return Err(ModelError::Configuration(
                "max_connections must be greater than zero".to_string(),
            ));
        }
        if self.pool.min_connections > self.pool.max_connections {
            return Err(ModelError::Configuration(format!(
                "min_connections ({}) exceeds max_connections ({})",
                self.pool.min_connections, self.pool.max_connections
            )));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> ModelResult<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| ModelError::Configuration(format!("Invalid value for {}: '{}' ({})", key, raw, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_reads_pool_settings() {
        let config = DatabaseConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/app"),
            ("DB_MAX_CONNECTIONS", "25"),
            ("DB_ACQUIRE_TIMEOUT", "5"),
        ]))
        .unwrap();

        assert_eq!(config.url, "postgres://localhost/app");
        assert_eq!(config.pool.max_connections, 25);
        assert_eq!(config.pool.min_connections, 1);
        assert_eq!(config.pool.acquire_timeout, 5);
        assert_eq!(config.backend().unwrap(), DatabaseBackendType::PostgreSQL);
    }

    #[test]
    fn test_missing_url_and_bad_numbers() {
        let err = DatabaseConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ModelError::Configuration(_)));

        let err = DatabaseConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "memory://test"),
            ("DB_MAX_CONNECTIONS", "lots"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
    }

    #[test]
    fn test_validate_rejects_unknown_scheme_and_inverted_bounds() {
        assert!(DatabaseConfig::new("mysql://localhost/app").validate().is_err());

        let pool = PoolConfig {
            min_connections: 20,
            max_connections: 5,
            ..PoolConfig::default()
        };
        assert!(DatabaseConfig::memory().with_pool(pool).validate().is_err());
        assert!(DatabaseConfig::memory().validate().is_ok());
    }

    #[test]
    fn test_deserialize_with_default_pool() {
        let config: DatabaseConfig = serde_json::from_value(serde_json::json!({
            "url": "postgresql://db/app",
            "pool": { "max_connections": 3 }
        }))
        .unwrap();
        assert_eq!(config.pool.max_connections, 3);
        assert_eq!(config.pool.acquire_timeout, 30);
    }
}
