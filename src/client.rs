use std::sync::Arc;

use chrono::Utc;

use crate::{
    ads_config::{AdType, AdsConfig},
    configuration_store::AdsConfigStore,
    events::{AdEvent, AdEventObserver},
    mediator::{AdMediator, AdResult},
    readiness::{PlacementRuntimeState, ReadinessTracker},
    registry::MediatorRegistry,
    show, ClientConfig, Error, Result,
};

/// The facade over ad mediation: registers mediators, owns the installed ads configuration and
/// per-placement readiness state, and dispatches show requests.
///
/// In order to create a client instance, first create a [`ClientConfig`].
///
/// Typical integration order: install the ads configuration with
/// [`set_ads_config`](AdsClient::set_ads_config), register one or more mediators, call
/// [`init_ads`](AdsClient::init_ads), then show ads with [`show_ad`](AdsClient::show_ad).
///
/// A second `show_ad` for the same placement while the first is still delegated to the mediator
/// has undefined mediator-level behavior: any such exclusion is owned by the mediator, not the
/// dispatcher. This is a known limitation.
///
/// # Examples
/// ```no_run
/// # use admix::{AdsClient, ClientConfig};
/// let client = ClientConfig::for_environment("web").to_client();
/// ```
pub struct AdsClient {
    config_store: Arc<AdsConfigStore>,
    registry: Arc<MediatorRegistry>,
    readiness: ReadinessTracker,
    environment: String,
    observer: Arc<dyn AdEventObserver + Send + Sync>,
}

impl AdsClient {
    /// Create a new `AdsClient` using the specified configuration.
    pub fn new(config: ClientConfig) -> AdsClient {
        let registry = Arc::new(MediatorRegistry::new());
        AdsClient {
            config_store: Arc::new(AdsConfigStore::new()),
            readiness: ReadinessTracker::new(registry.clone(), config.observer.clone()),
            registry,
            environment: config.environment,
            observer: config.observer,
        }
    }

    /// Install or replace the ads configuration.
    ///
    /// Replacing the configuration wholesale between show cycles is legal (hot-swap). It drops
    /// all per-placement readiness state and cached mediator instances, so the next
    /// [`init_ads`](AdsClient::init_ads) or show re-initializes against the new configuration.
    pub fn set_ads_config(&self, config: AdsConfig) {
        self.config_store.set_config(Arc::new(config));
        self.readiness.reset();
    }

    /// Get the currently installed ads configuration, if any.
    pub fn ads_config(&self) -> Option<Arc<AdsConfig>> {
        self.config_store.get_config()
    }

    /// Register a mediator factory under `id`.
    ///
    /// No mediator is constructed at registration time; construction happens on first use of the
    /// id and the instance is shared across placements bound to it. Re-registering an id
    /// replaces the prior factory (last-write-wins) and clears readiness of placements bound to
    /// it, so the next initialization uses the new factory's instance.
    pub fn register_mediator(
        &self,
        id: impl Into<String>,
        factory: impl Fn() -> Arc<dyn AdMediator> + Send + Sync + 'static,
    ) {
        let id = id.into();
        self.registry.register(id.clone(), Box::new(factory));
        self.readiness.forget_mediator(&id);
    }

    /// Initialize mediators for every placement in the installed configuration, eagerly loading
    /// ad content where preloading is enabled.
    ///
    /// Placements are processed sequentially and failures are isolated: one placement's mediator
    /// failing to initialize does not abort the iteration. Such failures are surfaced as
    /// [`AdEvent::MediatorInitFailed`] on the event observer, not returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationMissing`] if no configuration has been installed, or
    /// [`Error::AdsDisabled`] if the configuration disables ads.
    pub async fn init_ads(&self) -> Result<()> {
        let config = self
            .config_store
            .get_config()
            .ok_or(Error::ConfigurationMissing)?;
        if !config.enabled {
            return Err(Error::AdsDisabled);
        }

        for (placement_key, placement) in &config.placements {
            let resolved = match config.resolve_placement(placement_key, &self.environment) {
                Ok(resolved) => resolved,
                Err(error) => {
                    log::warn!(target: "admix",
                               placement = placement_key.as_str(),
                               error:% = error;
                               "placement is unusable in this environment");
                    self.observer.on_ad_event(AdEvent::MediatorInitFailed {
                        placement: placement_key.clone(),
                        mediator: None,
                        error: error.to_string(),
                        timestamp: Utc::now(),
                    });
                    continue;
                }
            };

            match self
                .readiness
                .ensure_initialized(placement_key, &resolved)
                .await
            {
                Ok(_mediator) => {
                    if config.should_preload(placement) {
                        // Load failures inside are best-effort; only registry errors can come
                        // back here and initialization above already ruled them out.
                        let _ = self.readiness.ensure_loaded(placement_key, &resolved).await;
                    }
                }
                Err(error) => {
                    log::warn!(target: "admix",
                               placement = placement_key.as_str(),
                               mediator = resolved.mediator_id.as_str(),
                               error:% = error;
                               "mediator failed to initialize");
                    self.observer.on_ad_event(AdEvent::MediatorInitFailed {
                        placement: placement_key.clone(),
                        mediator: Some(resolved.mediator_id.clone()),
                        error: error.to_string(),
                        timestamp: Utc::now(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Show an ad for the given placement and return the settled [`AdResult`].
    ///
    /// Never fails: configuration and mediator failures are normalized into an `AdResult` with
    /// `SHOW_FAILED` (or `TIMEOUT`) status, since a failed ad is an expected outcome, not an
    /// exceptional one. Reward fields in the result are the mediator's self-report, forwarded
    /// verbatim.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use admix::{AdsClient, AdType};
    /// # async fn test(client: &AdsClient) {
    /// let result = client.show_ad(AdType::Rewarded, "reward_after_level").await;
    /// if result.can_reward {
    ///     // grant result.reward_type / result.reward_amount
    /// }
    /// # }
    /// ```
    pub async fn show_ad(&self, ad_type: AdType, placement_key: &str) -> AdResult {
        show::dispatch_show(
            self.config_store.get_config(),
            &self.environment,
            &self.readiness,
            &self.observer,
            ad_type,
            placement_key,
        )
        .await
    }

    /// Like [`show_ad`](AdsClient::show_ad), but additionally delivers the result through
    /// `callback`. The callback and the returned value carry identical payloads.
    pub async fn show_ad_with_callback(
        &self,
        ad_type: AdType,
        placement_key: &str,
        callback: impl FnOnce(AdResult) + Send,
    ) -> AdResult {
        let result = self.show_ad(ad_type, placement_key).await;
        callback(result.clone());
        result
    }

    /// Snapshot of a placement's runtime readiness state, if the placement has been touched by
    /// initialization or a show request.
    pub fn placement_state(&self, placement_key: &str) -> Option<PlacementRuntimeState> {
        self.readiness.placement_state(placement_key)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tokio::time::Duration;

    use crate::mediator::DoneCallback;
    use crate::{
        AdEvent, AdMediator, AdResult, AdType, AdsClient, AdsConfig, AdsDefaults, ClientConfig,
        EnvironmentBinding, Error, MediatorError, PlacementConfig,
    };

    /// Test mediator that settles every show with a scripted result, or holds the callback
    /// forever when given none.
    #[derive(Default)]
    struct ScriptedMediator {
        inits: AtomicUsize,
        loads: AtomicUsize,
        shows: AtomicUsize,
        result: Option<AdResult>,
        held: Mutex<Vec<DoneCallback>>,
    }

    impl ScriptedMediator {
        fn settling_with(result: AdResult) -> ScriptedMediator {
            ScriptedMediator {
                result: Some(result),
                ..ScriptedMediator::default()
            }
        }

        fn never_settling() -> ScriptedMediator {
            ScriptedMediator::default()
        }
    }

    #[async_trait]
    impl AdMediator for ScriptedMediator {
        async fn init(&self) -> Result<(), MediatorError> {
            self.inits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn load(&self) -> Result<(), MediatorError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn show(&self, _ad_type: AdType, _placement: &PlacementConfig, done: DoneCallback) {
            self.shows.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Some(result) => done(result.clone()),
                // Keep the callback alive so the request stays unsettled.
                None => self.held.lock().unwrap().push(done),
            }
        }
    }

    fn rewarded_config(timeout_ms: Option<u64>, preload_on_start: bool) -> AdsConfig {
        AdsConfig {
            enabled: true,
            defaults: AdsDefaults {
                preload_on_start,
                timeout_ms,
            },
            placements: [(
                "reward_after_level".to_owned(),
                PlacementConfig {
                    ad_type: AdType::Rewarded,
                    reward_type: Some("coins".to_owned()),
                    reward_amount: Some(50.0),
                    preload: None,
                    environments: [(
                        "web".to_owned(),
                        EnvironmentBinding {
                            mediator: "fake".to_owned(),
                            mediator_options: None,
                        },
                    )]
                    .into(),
                },
            )]
            .into(),
        }
    }

    fn register(client: &AdsClient, id: &str, mediator: &Arc<ScriptedMediator>) {
        let instance: Arc<dyn AdMediator> = mediator.clone();
        client.register_mediator(id, move || instance.clone());
    }

    #[tokio::test]
    async fn delivers_mediator_result_verbatim_to_both_channels() {
        let client = ClientConfig::for_environment("web").to_client();
        client.set_ads_config(rewarded_config(None, false));
        let mediator = Arc::new(ScriptedMediator::settling_with(AdResult::reward_granted(
            "coins", 50.0,
        )));
        register(&client, "fake", &mediator);
        client.init_ads().await.unwrap();

        let delivered = Arc::new(Mutex::new(None));
        let slot = delivered.clone();
        let result = client
            .show_ad_with_callback(AdType::Rewarded, "reward_after_level", move |result| {
                *slot.lock().unwrap() = Some(result);
            })
            .await;

        assert_eq!(result, AdResult::reward_granted("coins", 50.0));
        assert_eq!(delivered.lock().unwrap().clone(), Some(result));
        assert_eq!(mediator.shows.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn show_fails_without_touching_mediator_when_ads_disabled() {
        let client = ClientConfig::for_environment("web").to_client();
        let mut config = rewarded_config(None, false);
        config.enabled = false;
        client.set_ads_config(config);
        let mediator = Arc::new(ScriptedMediator::settling_with(AdResult::cancelled()));
        register(&client, "fake", &mediator);

        let result = client.show_ad(AdType::Rewarded, "reward_after_level").await;

        assert_eq!(result, AdResult::show_failed());
        assert_eq!(mediator.inits.load(Ordering::SeqCst), 0);
        assert_eq!(mediator.shows.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn show_fails_for_unknown_placement() {
        let client = ClientConfig::for_environment("web").to_client();
        client.set_ads_config(rewarded_config(None, false));
        let mediator = Arc::new(ScriptedMediator::settling_with(AdResult::cancelled()));
        register(&client, "fake", &mediator);

        let result = client.show_ad(AdType::Rewarded, "no_such_slot").await;

        assert_eq!(result, AdResult::show_failed());
        assert_eq!(mediator.shows.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn settles_with_timeout_when_mediator_never_calls_done() {
        let _ = env_logger::builder().is_test(true).try_init();

        let client = ClientConfig::for_environment("web").to_client();
        client.set_ads_config(rewarded_config(Some(100), false));
        let mediator = Arc::new(ScriptedMediator::never_settling());
        register(&client, "fake", &mediator);
        client.init_ads().await.unwrap();

        let started = tokio::time::Instant::now();
        let result = client.show_ad(AdType::Rewarded, "reward_after_level").await;

        assert_eq!(result, AdResult::timed_out());
        assert!(started.elapsed() >= Duration::from_millis(100));
        assert_eq!(mediator.shows.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn re_registered_mediator_serves_the_next_show() {
        let client = ClientConfig::for_environment("web").to_client();
        client.set_ads_config(rewarded_config(None, false));
        let first = Arc::new(ScriptedMediator::settling_with(AdResult::cancelled()));
        register(&client, "fake", &first);
        client.init_ads().await.unwrap();

        assert_eq!(
            client.show_ad(AdType::Rewarded, "reward_after_level").await,
            AdResult::cancelled()
        );

        let second = Arc::new(ScriptedMediator::settling_with(AdResult::reward_granted(
            "coins", 50.0,
        )));
        register(&client, "fake", &second);

        let result = client.show_ad(AdType::Rewarded, "reward_after_level").await;

        assert_eq!(result, AdResult::reward_granted("coins", 50.0));
        assert_eq!(second.inits.load(Ordering::SeqCst), 1);
        assert_eq!(first.shows.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn init_ads_preloads_when_enabled() {
        let client = ClientConfig::for_environment("web").to_client();
        client.set_ads_config(rewarded_config(None, true));
        let mediator = Arc::new(ScriptedMediator::settling_with(AdResult::cancelled()));
        register(&client, "fake", &mediator);

        client.init_ads().await.unwrap();

        assert_eq!(mediator.inits.load(Ordering::SeqCst), 1);
        assert_eq!(mediator.loads.load(Ordering::SeqCst), 1);
        let state = client.placement_state("reward_after_level").unwrap();
        assert!(state.initialized);
        assert!(state.loaded);
    }

    #[tokio::test]
    async fn init_ads_isolates_placement_failures() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let client = ClientConfig::for_environment("web")
            .event_observer(move |event| sink.lock().unwrap().push(event))
            .to_client();

        let mut config = rewarded_config(None, false);
        config.placements.insert(
            "broken_slot".to_owned(),
            PlacementConfig {
                ad_type: AdType::Interstitial,
                reward_type: None,
                reward_amount: None,
                preload: None,
                environments: [(
                    "web".to_owned(),
                    EnvironmentBinding {
                        mediator: "missing".to_owned(),
                        mediator_options: None,
                    },
                )]
                .into(),
            },
        );
        client.set_ads_config(config);
        let mediator = Arc::new(ScriptedMediator::settling_with(AdResult::cancelled()));
        register(&client, "fake", &mediator);

        client.init_ads().await.unwrap();

        assert!(client
            .placement_state("reward_after_level")
            .unwrap()
            .initialized);
        assert!(client.placement_state("broken_slot").is_none());

        let events = events.lock().unwrap();
        assert!(events.iter().any(|event| matches!(
            event,
            AdEvent::MediatorInitFailed { placement, mediator: Some(id), .. }
                if placement == "broken_slot" && id == "missing"
        )));
    }

    #[tokio::test]
    async fn emits_one_event_per_show_transition() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let client = ClientConfig::for_environment("web")
            .event_observer(move |event| sink.lock().unwrap().push(event))
            .to_client();
        client.set_ads_config(rewarded_config(None, false));
        let mediator = Arc::new(ScriptedMediator::settling_with(AdResult::reward_granted(
            "coins", 50.0,
        )));
        register(&client, "fake", &mediator);

        let shown = client.show_ad(AdType::Rewarded, "reward_after_level").await;

        let events = events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[0],
            AdEvent::ShowRequested { placement, .. } if placement == "reward_after_level"
        ));
        assert!(matches!(
            &events[1],
            AdEvent::ShowStarted { placement, mediator, .. }
                if placement == "reward_after_level" && mediator == "fake"
        ));
        assert!(matches!(
            &events[2],
            AdEvent::ShowSettled { result, .. } if *result == shown
        ));
    }

    #[tokio::test]
    async fn show_settles_failed_when_no_configuration_installed() {
        let client = ClientConfig::for_environment("web").to_client();

        let result = client.show_ad(AdType::Rewarded, "reward_after_level").await;

        assert_eq!(result, AdResult::show_failed());
    }

    #[tokio::test]
    async fn init_ads_requires_an_enabled_configuration() {
        let client = ClientConfig::for_environment("web").to_client();
        assert_eq!(client.init_ads().await.unwrap_err(), Error::ConfigurationMissing);

        let mut config = rewarded_config(None, false);
        config.enabled = false;
        client.set_ads_config(config);
        assert_eq!(client.init_ads().await.unwrap_err(), Error::AdsDisabled);
    }

    #[tokio::test]
    async fn hot_swapping_config_resets_readiness() {
        let client = ClientConfig::for_environment("web").to_client();
        client.set_ads_config(rewarded_config(None, false));
        let mediator = Arc::new(ScriptedMediator::settling_with(AdResult::cancelled()));
        register(&client, "fake", &mediator);
        client.init_ads().await.unwrap();
        assert_eq!(mediator.inits.load(Ordering::SeqCst), 1);

        client.set_ads_config(rewarded_config(None, false));
        assert!(client.placement_state("reward_after_level").is_none());

        client.init_ads().await.unwrap();
        assert_eq!(mediator.inits.load(Ordering::SeqCst), 2);
    }
}
