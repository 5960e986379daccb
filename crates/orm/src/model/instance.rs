//! Model instances - one row's attributes and its persistence lifecycle

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::backends::DatabaseRow;
use crate::database::Executor;
use crate::error::{ModelError, ModelResult};
use crate::events::ModelEvent;
use crate::model::attributes::{AttributeMap, Attributes};
use crate::model::core_trait::Model;
use crate::model::dates::{now_for_storage, DateCaster};
use crate::model::lifecycle::{hooks_for, ModelHooks};
use crate::query::QueryBuilder;

/// `table(key)` as used in not-found messages
pub(crate) fn describe_key(table: &str, key: &JsonValue) -> String {
    match key {
        JsonValue::String(s) => format!("{}({})", table, s),
        other => format!("{}({})", table, other),
    }
}

/// In-memory representation of one row of `M`
pub struct ModelInstance<M: Model> {
    attributes: Attributes,
    exists: bool,
    deleted: bool,
    /// Key the row is stored under; differs from the attribute after `reassign_primary_key`
    persisted_key: Option<JsonValue>,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> Default for ModelInstance<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> Clone for ModelInstance<M> {
    fn clone(&self) -> Self {
        Self {
            attributes: self.attributes.clone(),
            exists: self.exists,
            deleted: self.deleted,
            persisted_key: self.persisted_key.clone(),
            _model: PhantomData,
        }
    }
}

impl<M: Model> std::fmt::Debug for ModelInstance<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct(M::model_name())
            .field("attributes", self.attributes.current())
            .field("exists", &self.exists)
            .field("deleted", &self.deleted)
            .finish()
    }
}

impl<M: Model> ModelInstance<M> {
    /// A new, unsaved instance with no attributes
    pub fn new() -> Self {
        Self {
            attributes: Attributes::new(),
            exists: false,
            deleted: false,
            persisted_key: None,
            _model: PhantomData,
        }
    }

    /// A new, unsaved instance with the given attributes staged
    pub fn make(attributes: AttributeMap) -> ModelResult<Self> {
        let mut instance = Self::new();
        instance.merge(attributes)?;
        Ok(instance)
    }

    /// Hydrate an instance from a fetched row
    pub fn from_row(row: &dyn DatabaseRow) -> ModelResult<Self> {
        let mut instance = Self::new();
        instance.hydrate(row)?;
        Ok(instance)
    }

    fn hydrate(&mut self, row: &dyn DatabaseRow) -> ModelResult<()> {
        let mut values = match row.to_json()? {
            JsonValue::Object(map) => map,
            other => {
                return Err(ModelError::Serialization(format!(
                    "Expected a row object for {}, got {}",
                    M::model_name(),
                    other
                )))
            }
        };
        for field in M::date_fields() {
            if let Some(value) = values.get_mut(field) {
                // Unparseable stored values stay as loaded
                if let Ok(stored) = DateCaster::format_for_storage::<M>(field, value.clone()) {
                    *value = stored;
                }
            }
        }
        self.attributes = Attributes::from_persisted(values);
        self.exists = true;
        self.persisted_key = self.primary_key().cloned();
        Ok(())
    }

    fn ensure_mutable(&self) -> ModelResult<()> {
        if self.deleted {
            return Err(ModelError::FinalizedInstance {
                model: M::model_name().to_string(),
            });
        }
        Ok(())
    }

    fn stored_key(&self) -> ModelResult<JsonValue> {
        if !self.exists {
            return Err(ModelError::NotPersisted(M::model_name().to_string()));
        }
        self.persisted_key.clone().ok_or(ModelError::MissingPrimaryKey)
    }

    // Reads

    /// Attribute value after the model's accessor
    pub fn get(&self, field: &str) -> Option<JsonValue> {
        self.attributes
            .get(field)
            .map(|value| M::get_attribute(field, value.clone()))
    }

    /// Attribute value deserialized into `T`; a missing attribute reads as null
    pub fn get_as<T: DeserializeOwned>(&self, field: &str) -> ModelResult<T> {
        serde_json::from_value(self.get(field).unwrap_or(JsonValue::Null))
            .map_err(|e| ModelError::Serialization(format!("Attribute '{}' of {}: {}", field, M::model_name(), e)))
    }

    /// Stored attribute value, bypassing the accessor
    pub fn raw(&self, field: &str) -> Option<&JsonValue> {
        self.attributes.get(field)
    }

    pub fn attributes(&self) -> &AttributeMap {
        self.attributes.current()
    }

    /// Values as last persisted or loaded
    pub fn original(&self) -> &AttributeMap {
        self.attributes.original()
    }

    pub fn primary_key(&self) -> Option<&JsonValue> {
        self.attributes
            .get(M::primary_key_name())
            .filter(|value| !value.is_null())
    }

    pub fn is_new(&self) -> bool {
        !self.exists && !self.deleted
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn is_dirty(&self) -> bool {
        self.attributes.is_dirty()
    }

    pub fn is_field_dirty(&self, field: &str) -> bool {
        self.attributes.is_field_dirty(field)
    }

    /// Fields changed since the last save or load
    pub fn dirty(&self) -> AttributeMap {
        self.attributes.dirty()
    }

    // Writes

    /// Stage a value through the model's mutator
    pub fn set(&mut self, field: &str, value: impl Into<JsonValue>) -> ModelResult<()> {
        self.ensure_mutable()?;
        let value = value.into();

        if self.exists && field == M::primary_key_name() {
            if self.attributes.get(field) == Some(&value) {
                return Ok(());
            }
            return Err(ModelError::ImmutablePrimaryKey {
                model: M::model_name().to_string(),
                column: field.to_string(),
            });
        }

        let value = M::set_attribute(field, value)?;
        self.attributes.set(field, value);
        Ok(())
    }

    /// Stage several values
    pub fn merge<I, K>(&mut self, values: I) -> ModelResult<()>
    where
        I: IntoIterator<Item = (K, JsonValue)>,
        K: AsRef<str>,
    {
        for (field, value) in values {
            self.set(field.as_ref(), value)?;
        }
        Ok(())
    }

    /// Discard staged changes, then stage `values`
    pub fn fill<I, K>(&mut self, values: I) -> ModelResult<()>
    where
        I: IntoIterator<Item = (K, JsonValue)>,
        K: AsRef<str>,
    {
        self.ensure_mutable()?;
        self.attributes.discard_changes();
        self.merge(values)
    }

    /// Change the primary key of a persisted row on the next save
    pub fn reassign_primary_key(&mut self, value: impl Into<JsonValue>) -> ModelResult<()> {
        self.ensure_mutable()?;
        self.attributes.set(M::primary_key_name(), value.into());
        Ok(())
    }

    fn should_insert(&self) -> bool {
        !self.exists && (self.primary_key().is_none() || !M::incrementing())
    }

    fn normalize_dates(&mut self) -> ModelResult<()> {
        for field in M::date_fields() {
            if let Some(value) = self.attributes.get(field).cloned() {
                let stored = DateCaster::format_for_storage::<M>(field, value.clone())?;
                if stored != value {
                    self.attributes.set(field, stored);
                }
            }
        }
        Ok(())
    }

    // Persistence

    /// Persist staged changes.
    ///
    /// New instances are inserted; existing ones get an UPDATE of the dirty
    /// fields only. Nothing is sent when nothing changed. Returns whether a
    /// statement was issued.
    pub async fn save<'e>(&mut self, executor: impl Into<Executor<'e>>) -> ModelResult<bool> {
        self.ensure_mutable()?;
        let mut exec = executor.into();
        let hooks = hooks_for::<M>()?;

        if self.should_insert() {
            self.perform_insert(&mut exec, &hooks).await
        } else {
            self.perform_update(&mut exec, &hooks).await
        }
    }

    async fn perform_insert(&mut self, exec: &mut Executor<'_>, hooks: &ModelHooks<M>) -> ModelResult<bool> {
        hooks.dispatch(ModelEvent::Creating, self).await?;
        hooks.dispatch(ModelEvent::Saving, self).await?;

        if M::uses_timestamps() {
            let now = now_for_storage();
            let created_at = M::created_at_column();
            if self.attributes.get(created_at).map_or(true, JsonValue::is_null) {
                self.attributes.set(created_at, now.clone());
            }
            self.attributes.set(M::updated_at_column(), now);
        }
        self.normalize_dates()?;

        let pk = M::primary_key_name();
        let table = M::table_name();
        let values = self
            .attributes
            .current()
            .iter()
            .filter(|(column, value)| !(M::incrementing() && column.as_str() == pk && value.is_null()))
            .map(|(column, value)| (column.clone(), value.clone()));

        let query = QueryBuilder::new()
            .insert_into(&table)
            .set_values(values)
            .returning(pk);

        debug!("Inserting {} into {}", M::model_name(), table);
        if let Some(row) = exec.fetch_optional(&query).await? {
            let key = row.get_by_name(pk)?.to_json();
            if !key.is_null() {
                self.attributes.set(pk, key);
            }
        }

        self.attributes.sync_original();
        self.exists = true;
        self.persisted_key = self.primary_key().cloned();

        hooks.dispatch(ModelEvent::Saved, self).await?;
        hooks.dispatch(ModelEvent::Created, self).await?;
        Ok(true)
    }

    async fn perform_update(&mut self, exec: &mut Executor<'_>, hooks: &ModelHooks<M>) -> ModelResult<bool> {
        let pk = M::primary_key_name();
        let key = self
            .persisted_key
            .clone()
            .or_else(|| self.primary_key().cloned())
            .ok_or(ModelError::MissingPrimaryKey)?;

        hooks.dispatch(ModelEvent::Updating, self).await?;
        hooks.dispatch(ModelEvent::Saving, self).await?;
        self.normalize_dates()?;

        let issued = if self.attributes.is_dirty() {
            let mut changes = self.attributes.dirty();
            if M::uses_timestamps() {
                let now = now_for_storage();
                self.attributes.set(M::updated_at_column(), now.clone());
                changes.insert(M::updated_at_column().to_string(), now);
            }

            let table = M::table_name();
            let query = QueryBuilder::new()
                .update(&table)
                .set_values(changes)
                .where_eq(pk, key.clone());

            debug!("Updating {} {}", M::model_name(), describe_key(&table, &key));
            if exec.execute(&query).await? == 0 {
                return Err(ModelError::NotFound(describe_key(&table, &key)));
            }

            self.attributes.sync_original();
            self.exists = true;
            self.persisted_key = self.primary_key().cloned();
            true
        } else {
            debug!("{} has no changes, skipping update", M::model_name());
            false
        };

        hooks.dispatch(ModelEvent::Saved, self).await?;
        hooks.dispatch(ModelEvent::Updated, self).await?;
        Ok(issued)
    }

    /// Delete the row. The instance becomes read-only afterwards.
    pub async fn delete<'e>(&mut self, executor: impl Into<Executor<'e>>) -> ModelResult<()> {
        self.ensure_mutable()?;
        let key = self.stored_key()?;
        let mut exec = executor.into();
        let hooks = hooks_for::<M>()?;

        hooks.dispatch(ModelEvent::Deleting, self).await?;

        let table = M::table_name();
        let query = QueryBuilder::new()
            .delete_from(&table)
            .where_eq(M::primary_key_name(), key.clone());
        debug!("Deleting {}", describe_key(&table, &key));
        if exec.execute(&query).await? == 0 {
            return Err(ModelError::NotFound(describe_key(&table, &key)));
        }

        self.deleted = true;
        self.exists = false;

        hooks.dispatch(ModelEvent::Deleted, self).await
    }

    /// Re-fetch the row, replacing every attribute and dropping staged changes
    pub async fn reload<'e>(&mut self, executor: impl Into<Executor<'e>>) -> ModelResult<()> {
        self.ensure_mutable()?;
        let key = self.stored_key()?;
        let mut exec = executor.into();

        let table = M::table_name();
        let query = QueryBuilder::table(&table)
            .where_eq(M::primary_key_name(), key.clone())
            .limit(1);

        let row = exec
            .fetch_optional(&query)
            .await?
            .ok_or_else(|| ModelError::NotFound(describe_key(&table, &key)))?;
        self.hydrate(row.as_ref())
    }

    // Serialization

    /// Serialized form: hidden fields removed, `visible` applied, dates
    /// formatted for display, computed attributes appended
    pub fn to_json(&self) -> JsonValue {
        let hidden = M::hidden();
        let visible = M::visible();
        let include = |field: &str| {
            !hidden.contains(&field) && (visible.is_empty() || visible.contains(&field))
        };

        let mut output = AttributeMap::new();
        for (field, value) in self.attributes.current() {
            if include(field.as_str()) {
                let value = M::get_attribute(field, value.clone());
                output.insert(field.clone(), DateCaster::format_for_display::<M>(field, &value));
            }
        }
        for (field, value) in M::computed(self.attributes.current()) {
            if !hidden.contains(&field.as_str()) {
                output.insert(field, value);
            }
        }

        JsonValue::Object(output)
    }
}

impl<M: Model> Serialize for ModelInstance<M> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Account;

    impl Model for Account {
        fn hidden() -> &'static [&'static str] {
            &["password"]
        }

        fn computed(attributes: &AttributeMap) -> AttributeMap {
            let mut extra = AttributeMap::new();
            if let Some(JsonValue::String(email)) = attributes.get("email") {
                extra.insert("domain".to_string(), json!(email.split('@').nth(1)));
            }
            extra
        }

        fn set_attribute(field: &str, value: JsonValue) -> ModelResult<JsonValue> {
            match (field, &value) {
                ("email", JsonValue::String(email)) => Ok(json!(email.to_lowercase())),
                _ => Ok(value),
            }
        }

        fn get_attribute(field: &str, value: JsonValue) -> JsonValue {
            match (field, &value) {
                ("name", JsonValue::String(name)) => json!(name.to_uppercase()),
                _ => value,
            }
        }
    }

    fn persisted(values: JsonValue) -> ModelInstance<Account> {
        let mut instance = ModelInstance::new();
        if let JsonValue::Object(map) = values {
            instance.attributes = Attributes::from_persisted(map);
        }
        instance.exists = true;
        instance.persisted_key = instance.primary_key().cloned();
        instance
    }

    #[test]
    fn test_mutators_and_accessors() {
        let mut account = ModelInstance::<Account>::new();
        account.set("email", "Ada@Example.COM").unwrap();
        account.set("name", "ada").unwrap();

        assert_eq!(account.raw("email"), Some(&json!("ada@example.com")));
        assert_eq!(account.get("name"), Some(json!("ADA")));
        assert_eq!(account.raw("name"), Some(&json!("ada")));
        assert_eq!(account.get_as::<Option<String>>("missing").unwrap(), None);
        assert!(account.is_new());
    }

    #[test]
    fn test_primary_key_is_immutable_once_persisted() {
        let mut account = persisted(json!({"id": 7, "email": "a@b.c"}));

        let err = account.set("id", 8).unwrap_err();
        assert!(matches!(err, ModelError::ImmutablePrimaryKey { .. }));
        account.set("id", 7).unwrap();
        assert!(!account.is_dirty());

        account.reassign_primary_key(8).unwrap();
        assert_eq!(account.primary_key(), Some(&json!(8)));
        assert_eq!(account.persisted_key, Some(json!(7)));
    }

    #[test]
    fn test_fill_discards_staged_changes() {
        let mut account = persisted(json!({"id": 1, "email": "a@b.c", "name": "ann"}));
        account.set("name", "bob").unwrap();
        account.fill(vec![("email", json!("X@Y.Z"))]).unwrap();

        let dirty = account.dirty();
        assert_eq!(dirty.len(), 1);
        assert_eq!(dirty.get("email"), Some(&json!("x@y.z")));
    }

    #[test]
    fn test_serialization_hides_and_computes() {
        let account = persisted(json!({
            "id": 1,
            "email": "ann@example.com",
            "name": "ann",
            "password": "secret",
            "created_at": "2024-01-02 03:04:05"
        }));

        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["name"], json!("ANN"));
        assert_eq!(json["domain"], json!("example.com"));
        assert_eq!(json["created_at"], json!("2024-01-02 03:04:05"));
    }

    #[test]
    fn test_describe_key() {
        assert_eq!(describe_key("users", &json!(5)), "users(5)");
        assert_eq!(describe_key("users", &json!("abc")), "users(abc)");
    }
}
