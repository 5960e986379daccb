//! Model lifecycle - per-type hooks and the boot-once registry

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::{Lazy, OnceCell};
use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::events::{ModelEvent, ModelObserver};
use crate::model::core_trait::Model;
use crate::model::instance::ModelInstance;

type Callback<M> = Arc<dyn Fn(&mut ModelInstance<M>) -> ModelResult<()> + Send + Sync>;

/// Hooks registered for one model type
pub struct ModelHooks<M: Model> {
    observers: Vec<Arc<dyn ModelObserver<M>>>,
    callbacks: Vec<(ModelEvent, Callback<M>)>,
}

impl<M: Model> Default for ModelHooks<M> {
    fn default() -> Self {
        Self {
            observers: Vec::new(),
            callbacks: Vec::new(),
        }
    }
}

impl<M: Model> ModelHooks<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer; observers run in registration order
    pub fn observe<O>(&mut self, observer: O) -> &mut Self
    where
        O: ModelObserver<M> + 'static,
    {
        self.observers.push(Arc::new(observer));
        self
    }

    /// Register a synchronous callback for a single event
    pub fn on<F>(&mut self, event: ModelEvent, callback: F) -> &mut Self
    where
        F: Fn(&mut ModelInstance<M>) -> ModelResult<()> + Send + Sync + 'static,
    {
        self.callbacks.push((event, Arc::new(callback)));
        self
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty() && self.callbacks.is_empty()
    }

    /// Fire `event`: observers first, then callbacks
    pub(crate) async fn dispatch(&self, event: ModelEvent, model: &mut ModelInstance<M>) -> ModelResult<()> {
        for observer in &self.observers {
            match event {
                ModelEvent::Creating => observer.creating(model).await?,
                ModelEvent::Created => observer.created(model).await?,
                ModelEvent::Updating => observer.updating(model).await?,
                ModelEvent::Updated => observer.updated(model).await?,
                ModelEvent::Saving => observer.saving(model).await?,
                ModelEvent::Saved => observer.saved(model).await?,
                ModelEvent::Deleting => observer.deleting(model).await?,
                ModelEvent::Deleted => observer.deleted(model).await?,
            }
        }

        for (registered, callback) in &self.callbacks {
            if *registered == event {
                callback(model)?;
            }
        }

        Ok(())
    }
}

type BootCell = Arc<OnceCell<Arc<dyn Any + Send + Sync>>>;

static BOOTED: Lazy<DashMap<TypeId, BootCell>> = Lazy::new(DashMap::new);

/// Hooks for `M`, running `M::boot` the first time any caller asks.
///
/// `M::boot` must not use `M` itself, which would wait on its own boot.
pub fn hooks_for<M: Model>() -> ModelResult<Arc<ModelHooks<M>>> {
    // Clone the cell out so the map shard is unlocked while boot runs
    let cell = BOOTED.entry(TypeId::of::<M>()).or_default().clone();

    let hooks = cell.get_or_init(|| {
        let mut hooks = ModelHooks::<M>::new();
        M::boot(&mut hooks);
        debug!("Booted model {}", M::model_name());
        Arc::new(hooks) as Arc<dyn Any + Send + Sync>
    });

    hooks
        .clone()
        .downcast::<ModelHooks<M>>()
        .map_err(|_| ModelError::Event(format!("Boot registry holds the wrong hooks for {}", M::model_name())))
}

/// Whether `M::boot` has already run in this process
pub fn is_booted<M: Model>() -> bool {
    BOOTED
        .get(&TypeId::of::<M>())
        .map_or(false, |cell| cell.get().is_some())
}
