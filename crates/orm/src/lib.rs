//! # quarry-orm: active-record models for PostgreSQL
//!
//! Models are plain marker types implementing [`Model`]; rows live in
//! [`ModelInstance`], which tracks dirty attributes, lifecycle hooks and the
//! deleted state. Persistence calls take an [`Executor`], either the pool or an
//! open [`Transaction`]. Factories generate fake attribute sets from registered
//! blueprints and the seed runner invokes seeders in order.

pub mod backends;
pub mod config;
pub mod database;
pub mod error;
pub mod events;
pub mod factory;
pub mod model;
pub mod query;
pub mod seeding;
pub mod transaction;


pub use backends::{DatabaseBackendType, DatabaseRow, DatabaseRowExt, DatabaseValue, MemoryPool, SqlDialect};
pub use config::{DatabaseConfig, PoolConfig};
pub use database::{Database, Executor};
pub use error::{ModelError, ModelResult, OrmError, OrmResult};
pub use events::{ModelEvent, ModelObserver};
pub use factory::{Blueprint, FactoryConfig, FactoryRegistry, Faker, ModelFactory, TableFactory};
pub use model::{AttributeMap, CrudOperations, DateCaster, Model, ModelHooks, ModelInstance, ModelQuery};
pub use query::{OrderDirection, QueryBuilder, QueryOperator};
pub use seeding::{CustomSeeder, Environment, FactorySeeder, SeedOptions, SeedReport, Seeder, SeederRunner};
pub use transaction::{IsolationLevel, Transaction, TransactionConfig};
