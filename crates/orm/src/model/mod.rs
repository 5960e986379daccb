//! Model System - active-record models split by concern
//!
//! - `core_trait`: the `Model` configuration trait
//! - `naming`: table-name conventions
//! - `attributes`: attribute storage and dirty tracking
//! - `dates`: storage/display date casting
//! - `lifecycle`: hooks and the boot-once registry
//! - `instance`: `ModelInstance`, one row and its persistence lifecycle
//! - `crud_operations`: static lookups and creation
//! - `query_methods`: typed queries

pub mod attributes;
pub mod core_trait;
pub mod crud_operations;
pub mod dates;
pub mod instance;
pub mod lifecycle;
pub mod naming;
pub mod query_methods;

pub use attributes::{AttributeMap, Attributes};
pub use core_trait::Model;
pub use crud_operations::CrudOperations;
pub use dates::{DateCaster, STORAGE_FORMAT};
pub use instance::ModelInstance;
pub use lifecycle::{hooks_for, is_booted, ModelHooks};
pub use query_methods::ModelQuery;
