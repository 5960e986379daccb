//! Model events and observers
//!
//! Observers are registered in `Model::boot` and see every instance of the
//! model. A hook returning an error aborts the operation that fired it.

use async_trait::async_trait;

use crate::error::ModelResult;
use crate::model::{Model, ModelInstance};

/// Lifecycle points at which hooks fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelEvent {
    Creating,
    Created,
    Updating,
    Updated,
    Saving,
    Saved,
    Deleting,
    Deleted,
}

impl ModelEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ModelEvent::Creating => "creating",
            ModelEvent::Created => "created",
            ModelEvent::Updating => "updating",
            ModelEvent::Updated => "updated",
            ModelEvent::Saving => "saving",
            ModelEvent::Saved => "saved",
            ModelEvent::Deleting => "deleting",
            ModelEvent::Deleted => "deleted",
        }
    }

    /// Whether the event fires before the statement is issued
    pub fn is_before(&self) -> bool {
        matches!(
            self,
            ModelEvent::Creating | ModelEvent::Updating | ModelEvent::Saving | ModelEvent::Deleting
        )
    }
}

impl std::fmt::Display for ModelEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[async_trait]
pub trait ModelObserver<M: Model>: Send + Sync {
    async fn creating(&self, _model: &mut ModelInstance<M>) -> ModelResult<()> {
        Ok(())
    }

    async fn created(&self, _model: &ModelInstance<M>) -> ModelResult<()> {
        Ok(())
    }

    async fn updating(&self, _model: &mut ModelInstance<M>) -> ModelResult<()> {
        Ok(())
    }

    async fn updated(&self, _model: &ModelInstance<M>) -> ModelResult<()> {
        Ok(())
    }

    async fn saving(&self, _model: &mut ModelInstance<M>) -> ModelResult<()> {
        Ok(())
    }

    async fn saved(&self, _model: &ModelInstance<M>) -> ModelResult<()> {
        Ok(())
    }

    async fn deleting(&self, _model: &ModelInstance<M>) -> ModelResult<()> {
        Ok(())
    }

    async fn deleted(&self, _model: &ModelInstance<M>) -> ModelResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_and_phase() {
        assert_eq!(ModelEvent::Creating.to_string(), "creating");
        assert_eq!(ModelEvent::Deleted.name(), "deleted");
        assert!(ModelEvent::Saving.is_before());
        assert!(!ModelEvent::Saved.is_before());
    }
}
