use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ads_config::{AdType, PlacementConfig};

/// Failure reported by an integrator-supplied mediator.
///
/// The SDK treats this as opaque: it carries whatever message the underlying ad network SDK
/// produced.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct MediatorError(pub String);

impl MediatorError {
    /// Create a mediator error with the given message.
    pub fn new(message: impl Into<String>) -> MediatorError {
        MediatorError(message.into())
    }
}

/// Status of a settled show request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdStatus {
    /// The user completed the ad and the mediator considers the reward earned.
    RewardGranted,
    /// The user dismissed the ad before completion.
    Cancelled,
    /// The ad could not be shown (configuration problem, no fill, mediator failure).
    ShowFailed,
    /// The mediator did not settle the show request within the configured timeout.
    Timeout,
}

/// Canonical outcome of every [`show_ad`](crate::AdsClient::show_ad) call, regardless of which
/// mediator served it.
///
/// Reward fields are whatever the mediator self-reported in its `done` callback; the SDK forwards
/// them verbatim and does not validate them against the placement configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdResult {
    /// What happened to the show request.
    pub status: AdStatus,
    /// Whether the integrator should grant the reward.
    pub can_reward: bool,
    /// Kind of reward to grant (e.g. `"coins"`), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_type: Option<String>,
    /// Amount of reward to grant, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_amount: Option<f64>,
}

impl AdResult {
    /// Result for a show request that failed before or during presentation.
    pub fn show_failed() -> AdResult {
        AdResult {
            status: AdStatus::ShowFailed,
            can_reward: false,
            reward_type: None,
            reward_amount: None,
        }
    }

    /// Result for a show request the mediator never settled in time.
    pub fn timed_out() -> AdResult {
        AdResult {
            status: AdStatus::Timeout,
            can_reward: false,
            reward_type: None,
            reward_amount: None,
        }
    }

    /// Result for an ad the user dismissed before completion.
    pub fn cancelled() -> AdResult {
        AdResult {
            status: AdStatus::Cancelled,
            can_reward: false,
            reward_type: None,
            reward_amount: None,
        }
    }

    /// Result for a completed ad with an earned reward.
    pub fn reward_granted(reward_type: impl Into<String>, reward_amount: f64) -> AdResult {
        AdResult {
            status: AdStatus::RewardGranted,
            can_reward: true,
            reward_type: Some(reward_type.into()),
            reward_amount: Some(reward_amount),
        }
    }
}

/// Callback a mediator must invoke exactly once to settle a show request.
///
/// `FnOnce` enforces the exactly-once contract at the type level. If the dispatcher has already
/// settled the request (e.g. by timeout), the call is ignored and logged at debug level.
pub type DoneCallback = Box<dyn FnOnce(AdResult) + Send>;

/// Capability contract implemented by integrator-supplied ad mediators.
///
/// A mediator adapts one real ad network SDK to the three operations below. The SDK never calls
/// any other method on it and never inspects which concrete mediator it is talking to.
///
/// # Examples
///
/// ```no_run
/// use admix::{AdMediator, AdResult, AdType, DoneCallback, MediatorError, PlacementConfig};
///
/// struct HouseAds;
///
/// #[async_trait::async_trait]
/// impl AdMediator for HouseAds {
///     async fn init(&self) -> Result<(), MediatorError> {
///         Ok(())
///     }
///
///     async fn load(&self) -> Result<(), MediatorError> {
///         Ok(())
///     }
///
///     fn show(&self, _ad_type: AdType, placement: &PlacementConfig, done: DoneCallback) {
///         let reward_type = placement.reward_type.clone().unwrap_or_default();
///         let reward_amount = placement.reward_amount.unwrap_or(0.0);
///         done(AdResult::reward_granted(reward_type, reward_amount));
///     }
/// }
/// ```
#[async_trait]
pub trait AdMediator: Send + Sync {
    /// Initialize the underlying ad network SDK. Called once per placement before the first
    /// load/show.
    async fn init(&self) -> std::result::Result<(), MediatorError>;

    /// Preload ad content. Best-effort: a failure here is recorded, and the next show attempts a
    /// just-in-time load instead.
    async fn load(&self) -> std::result::Result<(), MediatorError>;

    /// Present an ad and report the outcome through `done`.
    ///
    /// The resolved placement configuration (including reward parameters) is passed in so the
    /// mediator can report rewards without placement-specific knowledge in the SDK.
    fn show(&self, ad_type: AdType, placement: &PlacementConfig, done: DoneCallback);
}

/// Factory producing mediator instances.
///
/// Factories are invoked lazily: registration stores the factory, construction happens on first
/// use of the mediator id, and the resulting instance is cached and shared across placements
/// bound to the same id.
pub type MediatorFactory = Box<dyn Fn() -> Arc<dyn AdMediator> + Send + Sync>;
