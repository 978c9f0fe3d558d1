use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ads_config::AdType;
use crate::mediator::AdResult;

/// Lifecycle notifications emitted by the mediation subsystem.
///
/// One event fires per state transition of a show request, plus failure notifications from
/// `init_ads` preloading. Subscribe through [`ClientConfig::event_observer`](crate::ClientConfig::event_observer).
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum AdEvent {
    /// A mediator failed to initialize for a placement during `init_ads`. The failure is
    /// isolated: sibling placements are still initialized.
    #[serde(rename_all = "camelCase")]
    MediatorInitFailed {
        /// Placement the mediator was being initialized for.
        placement: String,
        /// Mediator id, when resolution got far enough to know it.
        #[serde(skip_serializing_if = "Option::is_none")]
        mediator: Option<String>,
        /// Message describing the failure.
        error: String,
        /// When the failure was observed.
        timestamp: DateTime<Utc>,
    },

    /// A mediator failed to preload ad content. Non-fatal: the next show attempts a just-in-time
    /// load.
    #[serde(rename_all = "camelCase")]
    AdLoadFailed {
        /// Placement the content was being loaded for.
        placement: String,
        /// Mediator id serving the placement.
        mediator: String,
        /// Message describing the failure.
        error: String,
        /// When the failure was observed.
        timestamp: DateTime<Utc>,
    },

    /// A show request entered resolution.
    #[serde(rename_all = "camelCase")]
    ShowRequested {
        /// Placement being shown.
        placement: String,
        /// Kind of ad requested.
        ad_type: AdType,
        /// When the request arrived.
        timestamp: DateTime<Utc>,
    },

    /// A show request was delegated to a mediator.
    #[serde(rename_all = "camelCase")]
    ShowStarted {
        /// Placement being shown.
        placement: String,
        /// Mediator id the request was delegated to.
        mediator: String,
        /// Kind of ad requested.
        ad_type: AdType,
        /// When delegation happened.
        timestamp: DateTime<Utc>,
    },

    /// A show request settled. Fires exactly once per show request, on every path (mediator
    /// callback, validation failure, timeout).
    #[serde(rename_all = "camelCase")]
    ShowSettled {
        /// Placement that was shown.
        placement: String,
        /// The canonical result delivered to the caller.
        result: AdResult,
        /// When the request settled.
        timestamp: DateTime<Utc>,
    },
}

/// A trait for observing mediation lifecycle events, e.g. to forward them onto the game's event
/// bus or analytics pipeline.
///
/// # Examples
///
/// ```no_run
/// # use admix::{AdEvent, AdEventObserver};
/// struct BusForwarder;
///
/// impl AdEventObserver for BusForwarder {
///     fn on_ad_event(&self, event: AdEvent) {
///         // Publish to the game's event bus here.
///     }
/// }
/// ```
///
/// # Errors
///
/// Implementations should not panic; the SDK calls observers synchronously on the show path.
pub trait AdEventObserver {
    /// Called once per emitted lifecycle event.
    fn on_ad_event(&self, event: AdEvent);
}

pub(crate) struct NoopAdEventObserver;
impl AdEventObserver for NoopAdEventObserver {
    fn on_ad_event(&self, _event: AdEvent) {}
}

impl<T: Fn(AdEvent)> AdEventObserver for T {
    fn on_ad_event(&self, event: AdEvent) {
        self(event);
    }
}
