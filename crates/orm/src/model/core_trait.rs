//! Core Model Trait - static configuration for database entities
//!
//! A model type carries no row data itself. It describes the table, its
//! conventions and its hooks; rows live in `ModelInstance<M>`.

use chrono::NaiveDateTime;
use serde_json::Value as JsonValue;

use crate::error::ModelResult;
use crate::model::attributes::AttributeMap;
use crate::model::lifecycle::ModelHooks;
use crate::model::naming;

/// Core trait for database models
pub trait Model: Send + Sync + Sized + 'static {
    /// Logical model name, used for blueprint lookup and error messages
    fn model_name() -> &'static str {
        naming::short_type_name(std::any::type_name::<Self>())
    }

    /// Table name for this model
    fn table_name() -> String {
        naming::table_name_for(Self::model_name())
    }

    /// Primary key column name
    fn primary_key_name() -> &'static str {
        "id"
    }

    /// Whether the database assigns primary keys. Models that assign their
    /// own keys (UUIDs, natural keys) return false and always insert when new.
    fn incrementing() -> bool {
        true
    }

    /// Check if this model maintains `created_at`/`updated_at`
    fn uses_timestamps() -> bool {
        true
    }

    fn created_at_column() -> &'static str {
        "created_at"
    }

    fn updated_at_column() -> &'static str {
        "updated_at"
    }

    /// Attributes never included in serialized output
    fn hidden() -> &'static [&'static str] {
        &[]
    }

    /// When non-empty, the only attributes included in serialized output
    fn visible() -> &'static [&'static str] {
        &[]
    }

    /// Extra date attributes beyond the timestamp columns
    fn dates() -> &'static [&'static str] {
        &[]
    }

    /// Every attribute cast as a date
    fn date_fields() -> Vec<&'static str> {
        let mut fields = vec![Self::created_at_column(), Self::updated_at_column()];
        for field in Self::dates() {
            if !fields.contains(field) {
                fields.push(*field);
            }
        }
        fields
    }

    /// Per-field display formatting for dates; `None` uses the storage format
    fn format_date_for_display(_field: &str, _value: &NaiveDateTime) -> Option<JsonValue> {
        None
    }

    /// Extra attributes appended when serializing
    fn computed(_attributes: &AttributeMap) -> AttributeMap {
        AttributeMap::new()
    }

    /// Accessor applied when an attribute is read
    fn get_attribute(_field: &str, value: JsonValue) -> JsonValue {
        value
    }

    /// Mutator applied when an attribute is staged
    fn set_attribute(_field: &str, value: JsonValue) -> ModelResult<JsonValue> {
        Ok(value)
    }

    /// Runs once per model type, the first time the model is used
    fn boot(_hooks: &mut ModelHooks<Self>) {}
}
