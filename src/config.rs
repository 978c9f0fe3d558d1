use std::sync::Arc;

use crate::events::{AdEventObserver, NoopAdEventObserver};
use crate::AdsClient;

/// Configuration for [`AdsClient`].
///
/// # Examples
/// ```
/// # use admix::ClientConfig;
/// let client = ClientConfig::for_environment("web")
///     .event_observer(|event| {
///         println!("{:?}", event);
///     })
///     .to_client();
/// ```
pub struct ClientConfig {
    pub(crate) environment: String,
    pub(crate) observer: Arc<dyn AdEventObserver + Send + Sync>,
}

impl ClientConfig {
    /// Create a configuration for the given runtime environment tag (e.g. `"web"` or
    /// `"webview_ios"`).
    ///
    /// The tag selects which [`EnvironmentBinding`](crate::EnvironmentBinding) applies when a
    /// placement is resolved. It is expected to come from the host's environment detection.
    ///
    /// ```
    /// # use admix::ClientConfig;
    /// ClientConfig::for_environment("web");
    /// ```
    pub fn for_environment(environment: impl Into<String>) -> Self {
        ClientConfig {
            environment: environment.into(),
            observer: Arc::new(NoopAdEventObserver),
        }
    }

    /// Install an observer for mediation lifecycle events, e.g. to forward them onto the game's
    /// event bus.
    ///
    /// ```
    /// # use admix::ClientConfig;
    /// let config = ClientConfig::for_environment("web").event_observer(|event| {
    ///     println!("{:?}", event);
    /// });
    /// ```
    pub fn event_observer(
        mut self,
        observer: impl AdEventObserver + Send + Sync + 'static,
    ) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Create a new [`AdsClient`] using this configuration.
    ///
    /// ```
    /// # use admix::{AdsClient, ClientConfig};
    /// let client: AdsClient = ClientConfig::for_environment("web").to_client();
    /// ```
    pub fn to_client(self) -> AdsClient {
        AdsClient::new(self)
    }
}
