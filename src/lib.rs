//! Ad-mediation layer for browser and mobile-webview game clients.
//!
//! # Overview
//!
//! The SDK revolves around an [`AdsClient`] that decouples the game from concrete third-party ad
//! SDKs. The integrator installs an [`AdsConfig`] describing named placements, registers one or
//! more mediators (adapters for real ad networks) implementing [`AdMediator`], initializes them
//! with [`AdsClient::init_ads`], and shows ads with [`AdsClient::show_ad`]. Every show request
//! settles with a canonical [`AdResult`], regardless of which mediator served it.
//!
//! # Mediators
//!
//! A mediator adapts one real ad network SDK to a three-operation contract: `init`, `load` and
//! `show`. Mediators are supplied entirely by the integrator and registered by id; the
//! configuration binds each placement to a mediator id per runtime environment. The SDK never
//! enumerates or inspects mediator variants beyond invoking the contract.
//!
//! # Event observer
//!
//! An [`AdEventObserver`] may be provided to receive lifecycle notifications (initialization
//! failures, show start, show settlement) for forwarding onto the game's event bus.
//!
//! ```
//! # use admix::ClientConfig;
//! let config = ClientConfig::for_environment("web").event_observer(|event| {
//!     println!("{:?}", event);
//! });
//! ```
//!
//! # Error handling
//!
//! Setup errors (bad configuration, unregistered mediator ids) are represented by the [`Error`]
//! enum. Show outcomes are never errors: a failed or timed-out ad is an expected result and is
//! delivered as an [`AdResult`] with the corresponding status.
//!
//! # Logging
//!
//! The package uses the [`log`](https://docs.rs/log/latest/log/) crate for logging
//! messages. Consider integrating a `log`-compatible logger implementation for better visibility
//! into SDK operations.

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]

mod ads_config;
mod client;
mod config;
mod configuration_store;
mod error;
mod events;
mod mediator;
mod readiness;
mod registry;
mod show;

pub use ads_config::{
    AdType, AdsConfig, AdsDefaults, EnvironmentBinding, PlacementConfig, ResolvedPlacement,
};
pub use client::AdsClient;
pub use config::ClientConfig;
pub use configuration_store::AdsConfigStore;
pub use error::{Error, Result};
pub use events::{AdEvent, AdEventObserver};
pub use mediator::{AdMediator, AdResult, AdStatus, DoneCallback, MediatorError, MediatorFactory};
pub use readiness::PlacementRuntimeState;
pub use registry::MediatorRegistry;
