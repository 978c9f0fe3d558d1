use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::mediator::{AdMediator, MediatorFactory};
use crate::{Error, Result};

/// Registry of integrator-supplied mediator factories, keyed by mediator id.
///
/// Registration stores the factory only; no mediator is constructed until a placement bound to
/// the id is first initialized. Re-registering an id silently replaces the prior factory
/// (last-write-wins), which supports hot-reloading a test mediator.
#[derive(Default)]
pub struct MediatorRegistry {
    factories: RwLock<HashMap<String, MediatorFactory>>,
}

impl MediatorRegistry {
    /// Create a new empty registry.
    pub fn new() -> MediatorRegistry {
        MediatorRegistry::default()
    }

    /// Store `factory` under `id`, replacing any prior registration.
    pub fn register(&self, id: impl Into<String>, factory: MediatorFactory) {
        let id = id.into();
        let mut factories = self
            .factories
            .write()
            .expect("thread holding mediator registry lock should not panic");

        if factories.insert(id.clone(), factory).is_some() {
            log::debug!(target: "admix", mediator = id.as_str(); "replaced mediator factory");
        }
    }

    /// Construct a fresh mediator instance for `id`.
    ///
    /// Fails with [`Error::UnknownMediator`] if `id` was never registered. Callers are expected
    /// to cache the instance; the registry itself constructs on every call.
    pub fn create(&self, id: &str) -> Result<Arc<dyn AdMediator>> {
        let factories = self
            .factories
            .read()
            .expect("thread holding mediator registry lock should not panic");

        let factory = factories
            .get(id)
            .ok_or_else(|| Error::UnknownMediator { id: id.to_owned() })?;

        Ok(factory())
    }

    /// Whether a factory is registered under `id`.
    pub fn is_registered(&self, id: &str) -> bool {
        self.factories
            .read()
            .expect("thread holding mediator registry lock should not panic")
            .contains_key(id)
    }
}
