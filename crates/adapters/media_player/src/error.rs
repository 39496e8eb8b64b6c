//! Media-player adapter error types.

use meural_client::MeuralError;
use meural_domain::error::HubError;

/// Errors specific to the media-player adapter.
#[derive(Debug, thiserror::Error)]
pub enum MediaPlayerError {
    /// A cloud or local API call failed.
    #[error("Meural API call failed")]
    Client(#[from] MeuralError),

    /// The frame could not be initialised and is not driven.
    #[error("frame {alias} is unavailable, setup was aborted")]
    Aborted {
        /// Frame alias.
        alias: String,
    },

    /// A domain-level error (validation, not-found, etc.).
    #[error("domain error")]
    Domain(#[from] HubError),
}

impl MediaPlayerError {
    /// Convert into a [`HubError`] for propagation across port boundaries.
    #[must_use]
    pub fn into_domain(self) -> HubError {
        match self {
            Self::Domain(err) => err,
            other => HubError::Integration(Box::new(other)),
        }
    }
}

impl From<MediaPlayerError> for HubError {
    fn from(err: MediaPlayerError) -> Self {
        err.into_domain()
    }
}

impl From<meural_domain::error::ValidationError> for MediaPlayerError {
    fn from(err: meural_domain::error::ValidationError) -> Self {
        Self::Domain(err.into())
    }
}

impl From<meural_domain::error::NotFoundError> for MediaPlayerError {
    fn from(err: meural_domain::error::NotFoundError) -> Self {
        Self::Domain(err.into())
    }
}
