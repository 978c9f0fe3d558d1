use thiserror::Error;

use crate::mediator::MediatorError;

/// Result type used throughout the SDK, with [`Error`] as the error variant.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while setting up ad mediation.
///
/// These are configuration/registration errors: they indicate that the integrator needs to
/// correct the ads configuration or register a missing mediator. Outcomes of showing an ad
/// ("the ad failed", "the user closed it") are not errors; they are reported as
/// [`AdResult`](crate::AdResult) values.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// No ads configuration has been installed yet.
    #[error("ads configuration missing")]
    ConfigurationMissing,

    /// Ads are disabled in the current configuration.
    #[error("ads are disabled by configuration")]
    AdsDisabled,

    /// The requested placement key is absent from the configuration.
    #[error("unknown placement {placement:?}")]
    UnknownPlacement {
        /// The placement key that was requested.
        placement: String,
    },

    /// The placement has no mediator binding for the active runtime environment.
    #[error("placement {placement:?} has no mediator binding for environment {environment:?}")]
    NoEnvironmentBinding {
        /// The placement key that was requested.
        placement: String,
        /// The active runtime environment tag.
        environment: String,
    },

    /// The mediator id was never registered.
    #[error("unknown mediator {id:?}")]
    UnknownMediator {
        /// The mediator id the configuration refers to.
        id: String,
    },

    /// A mediator reported a failure from one of its lifecycle operations.
    #[error(transparent)]
    Mediator(#[from] MediatorError),
}
