//! Database Factory System
//!
//! Blueprints are named generators of fake attribute sets. They are kept in
//! a `FactoryRegistry` (a process-wide one is available through the free
//! functions in this module) and turned into model or table factories that
//! build and insert rows.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use serde_json::Value as JsonValue;

use crate::error::{ModelError, ModelResult};
use crate::model::{AttributeMap, Model};

pub mod faker;
pub mod model_factory;
pub mod table_factory;

pub use faker::Faker;
pub use model_factory::ModelFactory;
pub use table_factory::TableFactory;

type Generator = dyn Fn(&mut Faker, usize, &JsonValue) -> AttributeMap + Send + Sync;

/// Named generator of fake attribute sets.
///
/// The generator receives the faker, the index of the row within the
/// current batch and the caller's override data. Merging the override data
/// is up to the generator.
#[derive(Clone)]
pub struct Blueprint {
    name: String,
    generator: Arc<Generator>,
}

impl Blueprint {
    pub fn new<F>(name: impl Into<String>, generator: F) -> Self
    where
        F: Fn(&mut Faker, usize, &JsonValue) -> AttributeMap + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            generator: Arc::new(generator),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn generate(&self, faker: &mut Faker, index: usize, data: &JsonValue) -> AttributeMap {
        (self.generator)(faker, index, data)
    }
}

impl std::fmt::Debug for Blueprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Blueprint").field("name", &self.name).finish()
    }
}

/// Factory configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FactoryConfig {
    /// Fixed seed for reproducible output; entropy when `None`
    pub seed: Option<u64>,
}

impl FactoryConfig {
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }
}

/// Registry of blueprints keyed by model or table name
#[derive(Clone, Default)]
pub struct FactoryRegistry {
    blueprints: Arc<RwLock<HashMap<String, Blueprint>>>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the blueprint stored under `name`
    pub fn blueprint<F>(&self, name: &str, generator: F) -> &Self
    where
        F: Fn(&mut Faker, usize, &JsonValue) -> AttributeMap + Send + Sync + 'static,
    {
        self.blueprints
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Blueprint::new(name, generator));
        self
    }

    pub fn get(&self, name: &str) -> ModelResult<Blueprint> {
        self.blueprints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| ModelError::MissingBlueprint(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.blueprints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn remove(&self, name: &str) -> bool {
        self.blueprints
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some()
    }

    pub fn clear(&self) {
        self.blueprints
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.blueprints.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .blueprints
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Factory for `M`, using the blueprint registered under its model name or table name
    pub fn model<M: Model>(&self) -> ModelResult<ModelFactory<M>> {
        self.model_with(FactoryConfig::default())
    }

    pub fn model_with<M: Model>(&self, config: FactoryConfig) -> ModelResult<ModelFactory<M>> {
        let blueprint = self
            .get(M::model_name())
            .or_else(|_| self.get(&M::table_name()))
            .map_err(|_| ModelError::MissingBlueprint(M::model_name().to_string()))?;
        Ok(ModelFactory::new(blueprint, config))
    }

    /// Factory that inserts straight into the table named like the blueprint
    pub fn table(&self, name: &str) -> ModelResult<TableFactory> {
        self.table_with(name, FactoryConfig::default())
    }

    pub fn table_with(&self, name: &str, config: FactoryConfig) -> ModelResult<TableFactory> {
        Ok(TableFactory::new(self.get(name)?, config))
    }
}

impl std::fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryRegistry").field("blueprints", &self.names()).finish()
    }
}

static REGISTRY: Lazy<FactoryRegistry> = Lazy::new(FactoryRegistry::new);

/// The process-wide registry
pub fn registry() -> &'static FactoryRegistry {
    &REGISTRY
}

/// Register a blueprint in the process-wide registry
pub fn blueprint<F>(name: &str, generator: F)
where
    F: Fn(&mut Faker, usize, &JsonValue) -> AttributeMap + Send + Sync + 'static,
{
    REGISTRY.blueprint(name, generator);
}

pub fn model<M: Model>() -> ModelResult<ModelFactory<M>> {
    REGISTRY.model::<M>()
}

pub fn table(name: &str) -> ModelResult<TableFactory> {
    REGISTRY.table(name)
}

/// Remove every blueprint from the process-wide registry
pub fn clear() {
    REGISTRY.clear();
}

/// Copy the top-level keys of `data` over the generated `attributes`
pub fn merge_data(mut attributes: AttributeMap, data: &JsonValue) -> AttributeMap {
    if let JsonValue::Object(overrides) = data {
        for (key, value) in overrides {
            attributes.insert(key.clone(), value.clone());
        }
    }
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Author;
    impl Model for Author {}

    fn author_blueprint(faker: &mut Faker, index: usize, data: &JsonValue) -> AttributeMap {
        let mut attributes = AttributeMap::new();
        attributes.insert("name".to_string(), json!(faker.name()));
        attributes.insert("position".to_string(), json!(index));
        merge_data(attributes, data)
    }

    #[test]
    fn test_registry_crud() {
        let registry = FactoryRegistry::new();
        assert!(registry.is_empty());

        registry.blueprint("Author", author_blueprint);
        registry.blueprint("tags", |_, _, _| AttributeMap::new());
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("Author"));
        assert_eq!(registry.names(), vec!["Author".to_string(), "tags".to_string()]);

        assert!(registry.remove("tags"));
        assert!(!registry.remove("tags"));

        let err = registry.get("Missing").unwrap_err();
        assert_eq!(err, ModelError::MissingBlueprint("Missing".to_string()));

        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_model_lookup_falls_back_to_table_name() {
        let registry = FactoryRegistry::new();
        assert!(matches!(registry.model::<Author>(), Err(ModelError::MissingBlueprint(_))));

        registry.blueprint("authors", author_blueprint);
        assert!(registry.model::<Author>().is_ok());
    }

    #[test]
    fn test_same_seed_and_data_give_identical_attributes() {
        let blueprint = Blueprint::new("Author", author_blueprint);
        let data = json!({"bio": "fixed"});

        let first = blueprint.generate(&mut Faker::seeded(99), 3, &data);
        let second = blueprint.generate(&mut Faker::seeded(99), 3, &data);
        assert_eq!(first, second);
        assert_eq!(first.get("bio"), Some(&json!("fixed")));
        assert_eq!(first.get("position"), Some(&json!(3)));
    }
}
