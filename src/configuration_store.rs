//! A thread-safe holder for the currently installed ads configuration. [`AdsConfigStore`]
//! provides concurrent access for readers (placement resolution) and the writer (configuration
//! hot-swap).
use std::sync::{Arc, RwLock};

use crate::AdsConfig;

/// `AdsConfigStore` is the central authority on which ads configuration is currently active.
///
/// The installed `AdsConfig` is immutable and can only be replaced completely. Readers receive a
/// snapshot that is unaffected by later replacements, so a show cycle always operates on one
/// consistent configuration.
#[derive(Default)]
pub struct AdsConfigStore {
    config: RwLock<Option<Arc<AdsConfig>>>,
}

impl AdsConfigStore {
    /// Create a new empty store.
    pub fn new() -> AdsConfigStore {
        AdsConfigStore::default()
    }

    /// Get the currently installed configuration. Returns `None` if the integrator hasn't
    /// installed one yet.
    pub fn get_config(&self) -> Option<Arc<AdsConfig>> {
        // Err() is possible only if the lock is poisoned (writer panicked while holding the
        // lock), which should never happen.
        let config = self
            .config
            .read()
            .expect("thread holding ads config lock should not panic");

        config.clone()
    }

    /// Install a new configuration, replacing any prior one.
    pub fn set_config(&self, config: Arc<AdsConfig>) {
        let mut slot = self
            .config
            .write()
            .expect("thread holding ads config lock should not panic");

        *slot = Some(config);
    }
}
