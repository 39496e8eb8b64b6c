//! Client error types.

/// Errors returned by the cloud and local clients.
#[derive(Debug, thiserror::Error)]
pub enum MeuralError {
    /// The cloud rejected the username/password pair.
    #[error("invalid Meural credentials")]
    InvalidAuth,

    /// Authentication failed for any reason other than bad credentials
    /// (timeout, network error, non-2xx status).
    #[error("cannot connect to the Meural cloud")]
    CannotConnect(#[source] reqwest::Error),

    /// The frame could not be reached on the LAN (refused or unreachable).
    #[error("Meural frame is turned off or not on the network")]
    DeviceTurnedOff(#[source] reqwest::Error),

    /// The device descriptor carries no local IP address.
    #[error("Meural frame {alias:?} has no local IP address")]
    NoLocalAddress {
        /// Alias of the frame.
        alias: String,
    },

    /// Any other transport or HTTP status error, passed through unchanged.
    #[error("HTTP request failed")]
    Http(#[from] reqwest::Error),

    /// A response body was not the JSON shape we expected.
    #[error("failed to decode Meural response")]
    Decode(#[from] serde_json::Error),
}

impl MeuralError {
    /// HTTP status carried by the underlying error, if any.
    #[must_use]
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::CannotConnect(err) | Self::DeviceTurnedOff(err) | Self::Http(err) => {
                err.status()
            }
            _ => None,
        }
    }

    /// Whether this error means the frame is unreachable on the LAN.
    #[must_use]
    pub fn is_device_off(&self) -> bool {
        matches!(self, Self::DeviceTurnedOff(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_invalid_auth_error() {
        assert_eq!(
            MeuralError::InvalidAuth.to_string(),
            "invalid Meural credentials"
        );
    }

    #[test]
    fn should_display_decode_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{{bad").unwrap_err();
        let err = MeuralError::Decode(json_err);
        assert_eq!(err.to_string(), "failed to decode Meural response");
        assert!(err.status().is_none());
    }

    #[test]
    fn should_display_missing_address_with_alias() {
        let err = MeuralError::NoLocalAddress {
            alias: "Hall".to_string(),
        };
        assert_eq!(err.to_string(), "Meural frame \"Hall\" has no local IP address");
        assert!(!err.is_device_off());
    }
}
