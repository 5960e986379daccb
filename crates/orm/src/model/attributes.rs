//! Attribute storage with dirty tracking

use serde_json::{Map, Value as JsonValue};

/// Column name to value mapping
pub type AttributeMap = Map<String, JsonValue>;

/// Current attribute values alongside the last persisted values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    current: AttributeMap,
    original: AttributeMap,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes that mirror a persisted row
    pub fn from_persisted(values: AttributeMap) -> Self {
        Self {
            original: values.clone(),
            current: values,
        }
    }

    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.current.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: JsonValue) {
        self.current.insert(field.into(), value);
    }

    pub fn current(&self) -> &AttributeMap {
        &self.current
    }

    pub fn original(&self) -> &AttributeMap {
        &self.original
    }

    /// Drop staged changes
    pub fn discard_changes(&mut self) {
        self.current = self.original.clone();
    }

    /// Fields whose current value differs from the persisted one
    pub fn dirty(&self) -> AttributeMap {
        self.current
            .iter()
            .filter(|(key, value)| self.original.get(*key) != Some(*value))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    pub fn is_dirty(&self) -> bool {
        self.current
            .iter()
            .any(|(key, value)| self.original.get(key) != Some(value))
    }

    pub fn is_field_dirty(&self, field: &str) -> bool {
        self.current.get(field).is_some() && self.current.get(field) != self.original.get(field)
    }

    /// Mark the current values as persisted
    pub fn sync_original(&mut self) {
        self.original = self.current.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dirty_tracking() {
        let mut row = AttributeMap::new();
        row.insert("id".to_string(), json!(1));
        row.insert("name".to_string(), json!("Alice"));
        let mut attributes = Attributes::from_persisted(row);
        assert!(!attributes.is_dirty());

        attributes.set("name", json!("Alice"));
        assert!(!attributes.is_dirty());

        attributes.set("name", json!("Alicia"));
        attributes.set("email", json!("alicia@example.com"));
        let dirty = attributes.dirty();
        assert_eq!(dirty.len(), 2);
        assert!(attributes.is_field_dirty("email"));
        assert!(!attributes.is_field_dirty("id"));

        attributes.sync_original();
        assert!(attributes.dirty().is_empty());
    }

    #[test]
    fn test_discard_changes() {
        let mut attributes = Attributes::new();
        attributes.set("name", json!("draft"));
        attributes.discard_changes();
        assert!(attributes.current().is_empty());
    }
}
