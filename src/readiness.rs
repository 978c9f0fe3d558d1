use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use crate::ads_config::ResolvedPlacement;
use crate::events::{AdEvent, AdEventObserver};
use crate::mediator::AdMediator;
use crate::registry::MediatorRegistry;
use crate::Result;

/// Runtime readiness state of a single placement.
///
/// Created lazily on first access and kept for the lifetime of the client; it is only reset when
/// the ads configuration is hot-swapped or the bound mediator is re-registered.
#[derive(Debug, Clone, Default)]
pub struct PlacementRuntimeState {
    /// Mediator id the placement was initialized with.
    pub mediator_id: String,
    /// Whether the mediator's `init` has completed for this placement.
    pub initialized: bool,
    /// Whether ad content is currently loaded for this placement.
    pub loaded: bool,
}

/// Owns per-placement readiness state and the shared mediator-instance cache.
///
/// Factories are invoked once per distinct mediator id; the resulting instance is cached here
/// and reused across placements bound to the same id. Only this tracker mutates the cache.
pub(crate) struct ReadinessTracker {
    registry: Arc<MediatorRegistry>,
    observer: Arc<dyn AdEventObserver + Send + Sync>,
    states: Mutex<HashMap<String, PlacementRuntimeState>>,
    instances: Mutex<HashMap<String, Arc<dyn AdMediator>>>,
}

impl ReadinessTracker {
    pub(crate) fn new(
        registry: Arc<MediatorRegistry>,
        observer: Arc<dyn AdEventObserver + Send + Sync>,
    ) -> ReadinessTracker {
        ReadinessTracker {
            registry,
            observer,
            states: Mutex::new(HashMap::new()),
            instances: Mutex::new(HashMap::new()),
        }
    }

    /// Construct (or fetch the cached) mediator for the placement and run its `init` if this
    /// placement hasn't been initialized yet. Idempotent: repeated calls after success are
    /// no-ops.
    pub(crate) async fn ensure_initialized(
        &self,
        placement_key: &str,
        resolved: &ResolvedPlacement,
    ) -> Result<Arc<dyn AdMediator>> {
        let mediator = self.mediator_instance(&resolved.mediator_id)?;

        if self.is_initialized(placement_key) {
            return Ok(mediator);
        }

        mediator.init().await?;

        let mut states = self.lock_states();
        let state = states.entry(placement_key.to_owned()).or_default();
        state.mediator_id = resolved.mediator_id.clone();
        state.initialized = true;

        Ok(mediator)
    }

    /// Load ad content for the placement, initializing the mediator first if needed.
    ///
    /// Loading is best-effort: a load failure is recorded and reported on the event bus but does
    /// not raise, so an unready ad simply causes the next show to attempt a just-in-time load.
    /// Initialization failures do raise.
    pub(crate) async fn ensure_loaded(
        &self,
        placement_key: &str,
        resolved: &ResolvedPlacement,
    ) -> Result<()> {
        if self.is_loaded(placement_key) {
            return Ok(());
        }

        let mediator = self.ensure_initialized(placement_key, resolved).await?;

        match mediator.load().await {
            Ok(()) => {
                let mut states = self.lock_states();
                states.entry(placement_key.to_owned()).or_default().loaded = true;
            }
            Err(error) => {
                log::warn!(target: "admix",
                           placement = placement_key,
                           error:% = error;
                           "ad load failed; next show will attempt a just-in-time load");
                self.observer.on_ad_event(AdEvent::AdLoadFailed {
                    placement: placement_key.to_owned(),
                    mediator: resolved.mediator_id.clone(),
                    error: error.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }

        Ok(())
    }

    pub(crate) fn is_loaded(&self, placement_key: &str) -> bool {
        self.lock_states()
            .get(placement_key)
            .is_some_and(|state| state.loaded)
    }

    fn is_initialized(&self, placement_key: &str) -> bool {
        self.lock_states()
            .get(placement_key)
            .is_some_and(|state| state.initialized)
    }

    /// Snapshot of the runtime state for a placement, if it has been touched.
    pub(crate) fn placement_state(&self, placement_key: &str) -> Option<PlacementRuntimeState> {
        self.lock_states().get(placement_key).cloned()
    }

    /// Evict the cached instance for a mediator id and clear readiness of every placement bound
    /// to it, so the next `ensure_initialized` constructs from the current factory.
    pub(crate) fn forget_mediator(&self, id: &str) {
        self.instances
            .lock()
            .expect("thread holding mediator cache lock should not panic")
            .remove(id);

        let mut states = self.lock_states();
        for state in states.values_mut() {
            if state.mediator_id == id {
                state.initialized = false;
                state.loaded = false;
            }
        }
    }

    /// Drop all runtime state and cached instances. Called on configuration hot-swap.
    pub(crate) fn reset(&self) {
        self.lock_states().clear();
        self.instances
            .lock()
            .expect("thread holding mediator cache lock should not panic")
            .clear();
    }

    fn mediator_instance(&self, id: &str) -> Result<Arc<dyn AdMediator>> {
        let mut instances = self
            .instances
            .lock()
            .expect("thread holding mediator cache lock should not panic");

        if let Some(mediator) = instances.get(id) {
            return Ok(mediator.clone());
        }

        let mediator = self.registry.create(id)?;
        instances.insert(id.to_owned(), mediator.clone());

        Ok(mediator)
    }

    fn lock_states(&self) -> std::sync::MutexGuard<'_, HashMap<String, PlacementRuntimeState>> {
        self.states
            .lock()
            .expect("thread holding placement state lock should not panic")
    }
}
