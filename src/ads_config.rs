use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Integrator-supplied ads configuration. It's the central piece that defines which placements
/// exist and which mediator serves each of them.
///
/// The configuration is installed before [`init_ads`](crate::AdsClient::init_ads), is immutable
/// during a show cycle, and may be replaced wholesale between cycles (hot-swap).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdsConfig {
    /// Master switch. When `false`, every placement resolution fails.
    pub enabled: bool,
    /// Defaults applying to all placements.
    #[serde(default)]
    pub defaults: AdsDefaults,
    /// Placement key to placement configuration.
    #[serde(default)]
    pub placements: HashMap<String, PlacementConfig>,
}

/// Defaults applying to all placements unless overridden per placement.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdsDefaults {
    /// Eagerly load ad content for every placement during `init_ads`.
    #[serde(default)]
    pub preload_on_start: bool,
    /// How long a show request may stay unsettled before the dispatcher settles it with a
    /// `TIMEOUT` result. No timeout when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

/// Kind of ad a placement serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdType {
    /// Ad granting an in-game reward on completion.
    Rewarded,
    /// Full-screen ad between game scenes.
    Interstitial,
    /// Inline banner ad.
    Banner,
}

/// Configuration of a single named ad slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementConfig {
    /// Kind of ad served at this placement.
    #[serde(rename = "type")]
    pub ad_type: AdType,
    /// Kind of reward granted on completion (e.g. `"coins"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_type: Option<String>,
    /// Amount of reward granted on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_amount: Option<f64>,
    /// Per-placement override of [`AdsDefaults::preload_on_start`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preload: Option<bool>,
    /// Runtime environment tag to mediator binding. A placement is unusable in environments it
    /// has no binding for.
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentBinding>,
}

/// Binding of a placement to a mediator for one runtime environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentBinding {
    /// Registered mediator id serving the placement in this environment.
    pub mediator: String,
    /// Opaque options forwarded to the mediator, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mediator_options: Option<serde_json::Value>,
}

/// A placement resolved for the active runtime environment.
#[derive(Debug, Clone)]
pub struct ResolvedPlacement {
    /// The placement configuration, including reward parameters.
    pub placement: PlacementConfig,
    /// Mediator id bound to the placement in the active environment.
    pub mediator_id: String,
    /// Mediator options from the binding, if any.
    pub mediator_options: Option<serde_json::Value>,
}

impl AdsConfig {
    /// Resolve a placement for the given runtime environment tag.
    ///
    /// Pure given the environment tag: reads only this configuration. Fails with
    /// [`Error::AdsDisabled`], [`Error::UnknownPlacement`] or [`Error::NoEnvironmentBinding`].
    pub fn resolve_placement(
        &self,
        placement_key: &str,
        environment: &str,
    ) -> Result<ResolvedPlacement> {
        if !self.enabled {
            return Err(Error::AdsDisabled);
        }

        let placement = self
            .placements
            .get(placement_key)
            .ok_or_else(|| Error::UnknownPlacement {
                placement: placement_key.to_owned(),
            })?;

        let binding =
            placement
                .environments
                .get(environment)
                .ok_or_else(|| Error::NoEnvironmentBinding {
                    placement: placement_key.to_owned(),
                    environment: environment.to_owned(),
                })?;

        Ok(ResolvedPlacement {
            placement: placement.clone(),
            mediator_id: binding.mediator.clone(),
            mediator_options: binding.mediator_options.clone(),
        })
    }

    /// Whether ad content for `placement` should be loaded eagerly during `init_ads`.
    pub(crate) fn should_preload(&self, placement: &PlacementConfig) -> bool {
        placement.preload.unwrap_or(self.defaults.preload_on_start)
    }
}
