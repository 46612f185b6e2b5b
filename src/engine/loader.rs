//! Model loading through a registry of engine factories.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{Result, SynthError};

use super::{reference, EngineFailure, InferenceEngine, ModelLoader};

/// What a factory receives when asked to build an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineContext {
    /// The id the engine is loaded for.
    pub model_id: String,
    /// Directory where this model's weights live (`<model root>/<model id>`).
    pub model_dir: PathBuf,
}

/// Builds an engine for a model id.
pub type EngineFactory =
    Box<dyn Fn(&EngineContext) -> std::result::Result<Box<dyn InferenceEngine>, EngineFailure>>;

/// Maps model ids to engine factories.
pub struct EngineRegistry {
    model_root: PathBuf,
    factories: BTreeMap<String, EngineFactory>,
}

impl EngineRegistry {
    /// Creates an empty registry rooted at `model_root`.
    pub fn new(model_root: impl Into<PathBuf>) -> Self {
        Self {
            model_root: model_root.into(),
            factories: BTreeMap::new(),
        }
    }

    /// Creates a registry with the procedural reference engines registered.
    pub fn with_reference_engines(model_root: impl Into<PathBuf>) -> Self {
        let mut registry = Self::new(model_root);
        reference::register(&mut registry);
        registry
    }

    /// Registers (or replaces) the factory for `model_id`.
    pub fn register<F>(&mut self, model_id: impl Into<String>, factory: F)
    where
        F: Fn(&EngineContext) -> std::result::Result<Box<dyn InferenceEngine>, EngineFailure> + 'static,
    {
        self.factories.insert(model_id.into(), Box::new(factory));
    }

    /// Registered ids in sorted order.
    pub fn model_ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

impl ModelLoader for EngineRegistry {
    fn load(&self, model_id: &str) -> Result<Box<dyn InferenceEngine>> {
        let factory = self
            .factories
            .get(model_id)
            .ok_or_else(|| SynthError::model_not_found(model_id))?;

        let context = EngineContext {
            model_id: model_id.to_string(),
            model_dir: self.model_root.join(model_id),
        };

        tracing::info!(model_id, model_dir = %context.model_dir.display(), "loading model");
        factory(&context).map_err(|failure| SynthError::model_load_failed(failure.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::CannedEngine;
    use crate::error::ErrorCode;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn unknown_model_is_not_found() {
        let registry = EngineRegistry::new("/models");
        let err = registry.load("nobody/nothing").err().unwrap();
        assert_eq!(err.code, ErrorCode::ModelNotFound);
        assert!(err.message.contains("nobody/nothing"));
    }

    #[test]
    fn factory_receives_model_dir() {
        let seen = Rc::new(RefCell::new(None));
        let mut registry = EngineRegistry::new("/models");
        let sink = Rc::clone(&seen);
        registry.register("org/model", move |ctx: &EngineContext| {
            *sink.borrow_mut() = Some(ctx.clone());
            Ok(Box::new(CannedEngine::image(8, 8)) as Box<dyn InferenceEngine>)
        });

        assert!(registry.load("org/model").is_ok());
        let ctx = seen.borrow().clone().unwrap();
        assert_eq!(ctx.model_id, "org/model");
        assert_eq!(ctx.model_dir, PathBuf::from("/models/org/model"));
    }

    #[test]
    fn factory_failure_is_load_failure() {
        let mut registry = EngineRegistry::new("/models");
        registry.register("broken", |_: &EngineContext| {
            Err(EngineFailure::Internal("weights truncated".into()))
        });
        let err = registry.load("broken").err().unwrap();
        assert_eq!(err.code, ErrorCode::ModelLoadFailed);
        assert!(err.message.contains("weights truncated"));
    }

    #[test]
    fn reference_engines_are_registered() {
        let registry = EngineRegistry::with_reference_engines("/models");
        let ids: Vec<&str> = registry.model_ids().collect();
        assert_eq!(ids, vec!["reference/audio", "reference/edit", "reference/image"]);
    }
}
