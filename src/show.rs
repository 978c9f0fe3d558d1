//! The show dispatcher: drives a show request from configuration resolution to a settled
//! result.
//!
//! Each request moves through resolving, readiness check, delegation and settlement. Settlement
//! happens exactly once, via one of: the mediator's `done` callback, a validation failure, or
//! the configured timeout. Every failure path resolves to an [`AdResult`] value; nothing on the
//! show path raises.
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::oneshot;
use tokio::time::{timeout, Duration};

use crate::ads_config::{AdType, AdsConfig};
use crate::events::{AdEvent, AdEventObserver};
use crate::mediator::{AdResult, DoneCallback};
use crate::readiness::ReadinessTracker;
use crate::Error;

pub(crate) async fn dispatch_show(
    config: Option<Arc<AdsConfig>>,
    environment: &str,
    tracker: &ReadinessTracker,
    observer: &Arc<dyn AdEventObserver + Send + Sync>,
    ad_type: AdType,
    placement_key: &str,
) -> AdResult {
    observer.on_ad_event(AdEvent::ShowRequested {
        placement: placement_key.to_owned(),
        ad_type,
        timestamp: Utc::now(),
    });

    // Resolving. Validation failures are reported as the canonical failed-result shape, not as
    // errors, so callers have one place to inspect outcomes.
    let resolution = config
        .as_deref()
        .ok_or(Error::ConfigurationMissing)
        .and_then(|config| config.resolve_placement(placement_key, environment));
    let resolved = match resolution {
        Ok(resolved) => resolved,
        Err(error) => {
            log::warn!(target: "admix",
                       placement = placement_key,
                       error:% = error;
                       "cannot resolve placement for show request");
            return settle(observer, placement_key, AdResult::show_failed());
        }
    };

    // Readiness check. The mediator is initialized just-in-time if `init_ads` didn't get to it.
    let mediator = match tracker.ensure_initialized(placement_key, &resolved).await {
        Ok(mediator) => mediator,
        Err(error) => {
            log::warn!(target: "admix",
                       placement = placement_key,
                       mediator = resolved.mediator_id.as_str(),
                       error:% = error;
                       "mediator is not ready for show request");
            return settle(observer, placement_key, AdResult::show_failed());
        }
    };
    if !tracker.is_loaded(placement_key) {
        // A load failure does not abort the request: whether to show or refuse is the
        // mediator's call, since some mediators can show without an explicit prior load.
        if let Err(error) = tracker.ensure_loaded(placement_key, &resolved).await {
            log::debug!(target: "admix",
                        placement = placement_key,
                        error:% = error;
                        "just-in-time load failed; delegating anyway");
        }
    }

    // Delegating.
    observer.on_ad_event(AdEvent::ShowStarted {
        placement: placement_key.to_owned(),
        mediator: resolved.mediator_id.clone(),
        ad_type,
        timestamp: Utc::now(),
    });

    let (done_tx, done_rx) = oneshot::channel();
    let done: DoneCallback = Box::new(move |result| {
        if done_tx.send(result).is_err() {
            // The timeout already settled this request; the late result is dropped.
            log::debug!(target: "admix", "late ad result ignored; show request already settled");
        }
    });
    mediator.show(ad_type, &resolved.placement, done);

    let timeout_ms = config
        .as_deref()
        .and_then(|config| config.defaults.timeout_ms);
    let result = match timeout_ms {
        Some(ms) => match timeout(Duration::from_millis(ms), done_rx).await {
            Ok(settled) => settled.unwrap_or_else(|_| dropped_without_result(placement_key)),
            Err(_elapsed) => {
                log::warn!(target: "admix",
                           placement = placement_key,
                           timeout_ms = ms;
                           "mediator did not settle show request in time");
                AdResult::timed_out()
            }
        },
        None => done_rx
            .await
            .unwrap_or_else(|_| dropped_without_result(placement_key)),
    };

    settle(observer, placement_key, result)
}

/// The mediator dropped the `done` callback without invoking it, so the request can never be
/// settled by it. Treated as a show failure.
fn dropped_without_result(placement_key: &str) -> AdResult {
    log::warn!(target: "admix",
               placement = placement_key;
               "mediator dropped the done callback without settling");
    AdResult::show_failed()
}

fn settle(
    observer: &Arc<dyn AdEventObserver + Send + Sync>,
    placement_key: &str,
    result: AdResult,
) -> AdResult {
    log::trace!(target: "admix",
                placement = placement_key,
                result:serde = result;
                "show request settled");
    observer.on_ad_event(AdEvent::ShowSettled {
        placement: placement_key.to_owned(),
        result: result.clone(),
        timestamp: Utc::now(),
    });
    result
}
