//! Database Backend Abstractions
//!
//! PostgreSQL through sqlx, plus an in-memory backend that interprets
//! statements directly and records every statement it receives.

pub mod core;
pub mod memory;
pub mod postgres;

pub use self::core::*;
pub use self::memory::{MemoryPool, MemoryRow};
pub use self::postgres::{PostgresPool, PostgresRow};

/// Database backend type enumeration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DatabaseBackendType {
    PostgreSQL,
    Memory,
}

impl DatabaseBackendType {
    /// Detect the backend from a database URL scheme
    pub fn from_url(url: &str) -> Result<Self, String> {
        let parsed = url::Url::parse(url).map_err(|e| format!("Invalid database URL '{}': {}", url, e))?;
        parsed.scheme().parse()
    }
}

impl std::fmt::Display for DatabaseBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatabaseBackendType::PostgreSQL => write!(f, "postgresql"),
            DatabaseBackendType::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for DatabaseBackendType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgresql" | "postgres" => Ok(DatabaseBackendType::PostgreSQL),
            "memory" => Ok(DatabaseBackendType::Memory),
            _ => Err(format!("Unsupported database backend: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_detection_from_url() {
        assert_eq!(
            DatabaseBackendType::from_url("postgres://user:pw@localhost:5432/app").unwrap(),
            DatabaseBackendType::PostgreSQL
        );
        assert_eq!(
            DatabaseBackendType::from_url("memory://test").unwrap(),
            DatabaseBackendType::Memory
        );
        assert!(DatabaseBackendType::from_url("mysql://localhost/app").is_err());
        assert!(DatabaseBackendType::from_url("not a url").is_err());
    }
}
