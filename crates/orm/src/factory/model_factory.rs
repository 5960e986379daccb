//! Factories that build model instances from a blueprint

use std::marker::PhantomData;

use serde_json::Value as JsonValue;
use tracing::debug;

use super::{Blueprint, FactoryConfig, Faker};
use crate::database::Executor;
use crate::error::ModelResult;
use crate::model::{AttributeMap, CrudOperations, Model, ModelInstance};

/// Builds and persists `ModelInstance<M>` values
pub struct ModelFactory<M: Model> {
    blueprint: Blueprint,
    faker: Faker,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> ModelFactory<M> {
    pub fn new(blueprint: Blueprint, config: FactoryConfig) -> Self {
        Self {
            blueprint,
            faker: Faker::from_seed(config.seed),
            _model: PhantomData,
        }
    }

    /// Restart the generator from a fixed seed
    pub fn seed(mut self, seed: u64) -> Self {
        self.faker = Faker::seeded(seed);
        self
    }

    pub fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }

    /// Raw attributes for the row at `index`
    pub fn attributes(&mut self, index: usize, data: &JsonValue) -> AttributeMap {
        self.blueprint.generate(&mut self.faker, index, data)
    }

    /// One unsaved instance
    pub fn make(&mut self, data: JsonValue) -> ModelResult<ModelInstance<M>> {
        ModelInstance::make(self.attributes(0, &data))
    }

    /// `count` unsaved instances, indices `0..count`
    pub fn make_many(&mut self, count: usize, data: JsonValue) -> ModelResult<Vec<ModelInstance<M>>> {
        (0..count)
            .map(|index| ModelInstance::make(self.attributes(index, &data)))
            .collect()
    }

    /// One inserted instance
    pub async fn create<'e>(
        &mut self,
        executor: impl Into<Executor<'e>>,
        data: JsonValue,
    ) -> ModelResult<ModelInstance<M>> {
        let mut instance = self.make(data)?;
        instance.save(executor).await?;
        Ok(instance)
    }

    /// `count` inserted instances, indices `0..count`
    pub async fn create_many<'e>(
        &mut self,
        executor: impl Into<Executor<'e>>,
        count: usize,
        data: JsonValue,
    ) -> ModelResult<Vec<ModelInstance<M>>> {
        let mut exec = executor.into();
        let mut created = Vec::with_capacity(count);
        for index in 0..count {
            let mut instance = ModelInstance::make(self.attributes(index, &data))?;
            instance.save(exec.reborrow()).await?;
            created.push(instance);
        }
        debug!("Factory {} created {} rows", self.blueprint.name(), created.len());
        Ok(created)
    }

    /// Delete every row of the model's table
    pub async fn reset<'e>(&self, executor: impl Into<Executor<'e>>) -> ModelResult<u64> {
        M::truncate(executor).await
    }
}
