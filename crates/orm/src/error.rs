//! Error types for the ORM system
//!
//! A single error enum covers persistence, model lifecycle, date casting,
//! factories and seeding.

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;

/// ORM error type alias
pub type OrmError = ModelError;

/// ORM result type alias
pub type OrmResult<T> = ModelResult<T>;

/// Error types for ORM operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Database connection or query error
    #[error("Database error: {0}")]
    Database(String),

    /// Record not found in database
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The instance was deleted and can no longer be mutated
    #[error("Cannot modify finalized instance of '{model}': the row was deleted")]
    FinalizedInstance { model: String },

    /// Primary key of a persisted instance changed through a plain attribute write
    #[error("Primary key '{column}' of a persisted '{model}' cannot be set directly, use reassign_primary_key")]
    ImmutablePrimaryKey { model: String, column: String },

    /// Primary key is missing or invalid
    #[error("Primary key is missing or invalid")]
    MissingPrimaryKey,

    /// Operation requires a row that has been persisted
    #[error("Instance of '{0}' has not been persisted yet")]
    NotPersisted(String),

    /// Date attribute could not be parsed
    #[error("Invalid date value for '{field}': {value}")]
    InvalidDate { field: String, value: String },

    /// Model validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Connection pool error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Transaction error
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Query building or execution error
    #[error("Query error: {0}")]
    Query(String),

    /// A lifecycle hook rejected the operation
    #[error("Event error: {0}")]
    Event(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No blueprint registered under the requested name
    #[error("No factory blueprint registered for '{0}'")]
    MissingBlueprint(String),

    /// Seeder failed or was refused
    #[error("Seeder error: {0}")]
    Seeder(String),
}

impl ModelError {
    /// Whether this is a "not found" error raised by a `*_or_fail` lookup
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelError::NotFound(_))
    }
}

// Convert from sqlx errors
impl From<sqlx::Error> for ModelError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ModelError::NotFound("row".to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                ModelError::Connection(err.to_string())
            }
            other => ModelError::Database(other.to_string()),
        }
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for ModelError {
    fn from(err: serde_json::Error) -> Self {
        ModelError::Serialization(err.to_string())
    }
}

// Seeder closures report arbitrary failures through anyhow
impl From<anyhow::Error> for ModelError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<ModelError>() {
            Ok(model_error) => model_error,
            Err(other) => ModelError::Seeder(format!("{:#}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ModelError::NotFound("users(7)".to_string());
        assert_eq!(err.to_string(), "Record not found: users(7)");
        assert!(err.is_not_found());

        let err = ModelError::FinalizedInstance { model: "User".to_string() };
        assert!(err.to_string().contains("finalized instance of 'User'"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_anyhow_conversion_keeps_model_errors() {
        let original = ModelError::MissingBlueprint("User".to_string());
        let converted: ModelError = anyhow::Error::new(original.clone()).into();
        assert_eq!(converted, original);

        let converted: ModelError = anyhow::anyhow!("disk full").into();
        assert_eq!(converted, ModelError::Seeder("disk full".to_string()));
    }

    #[test]
    fn test_serde_json_conversion() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let converted: ModelError = err.into();
        assert!(matches!(converted, ModelError::Serialization(_)));
    }
}
