//! Database seeding with environment controls
//!
//! Seeders are opaque units with a `run` entry point. `SeederRunner` invokes
//! them one after another in registration order and refuses to touch
//! environments that are not safe for seeding unless forced.

use std::convert::Infallible;
use std::str::FromStr;

use async_trait::async_trait;

use crate::database::Database;
use crate::error::ModelResult;

pub mod runner;
pub mod seeders;

pub use runner::{SeedOptions, SeedReport, SeederRunner};
pub use seeders::{CustomSeeder, FactorySeeder};

/// Environment types for seeding control
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Testing,
    Staging,
    Production,
    Custom(String),
}

impl Environment {
    pub fn as_str(&self) -> &str {
        match self {
            Environment::Development => "development",
            Environment::Testing => "testing",
            Environment::Staging => "staging",
            Environment::Production => "production",
            Environment::Custom(name) => name,
        }
    }

    /// Production and unknown environments need an explicit opt-in
    pub fn is_safe_for_seeding(&self) -> bool {
        matches!(
            self,
            Environment::Development | Environment::Testing | Environment::Staging
        )
    }

    /// Current environment from `QUARRY_ENV`, `APP_ENV` or `ENV`; development when unset
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        ["QUARRY_ENV", "APP_ENV", "ENV"]
            .iter()
            .find_map(|key| lookup(key).filter(|value| !value.trim().is_empty()))
            .map(|value| Environment::from(value.as_str()))
            .unwrap_or(Environment::Development)
    }
}

impl From<&str> for Environment {
    fn from(env: &str) -> Self {
        match env.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" => Environment::Development,
            "testing" | "test" => Environment::Testing,
            "staging" | "stage" => Environment::Staging,
            "production" | "prod" => Environment::Production,
            custom => Environment::Custom(custom.to_string()),
        }
    }
}

impl FromStr for Environment {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Environment::from(s))
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A unit of seed data
#[async_trait]
pub trait Seeder: Send + Sync {
    /// Name used for `SeedOptions::files` selection and logging
    fn name(&self) -> &str;

    /// Environments this seeder is limited to; empty means all
    fn environments(&self) -> Vec<Environment> {
        Vec::new()
    }

    fn should_run(&self, env: &Environment) -> bool {
        let environments = self.environments();
        environments.is_empty() || environments.contains(env)
    }

    async fn run(&self, db: &Database) -> ModelResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!(Environment::from("PROD"), Environment::Production);
        assert_eq!("test".parse::<Environment>().unwrap(), Environment::Testing);
        assert_eq!(Environment::from("qa"), Environment::Custom("qa".to_string()));
        assert_eq!(Environment::Staging.to_string(), "staging");
    }

    #[test]
    fn test_environment_safety() {
        assert!(Environment::Development.is_safe_for_seeding());
        assert!(Environment::Staging.is_safe_for_seeding());
        assert!(!Environment::Production.is_safe_for_seeding());
        assert!(!Environment::Custom("qa".to_string()).is_safe_for_seeding());
    }

    #[test]
    fn test_environment_lookup_precedence() {
        let env = Environment::from_lookup(|key| match key {
            "APP_ENV" => Some("production".to_string()),
            "ENV" => Some("testing".to_string()),
            _ => None,
        });
        assert_eq!(env, Environment::Production);
        assert_eq!(Environment::from_lookup(|_| None), Environment::Development);
    }
}
