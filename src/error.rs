//! Error types for the credit relay.

/// Configuration-related errors. All of these surface at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Outbound messaging errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The provider did not accept the message. `reason` never carries the
    /// provider's response body.
    #[error("Failed to send message on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Invalid provider response on channel {name}: {reason}")]
    InvalidResponse { name: String, reason: String },
}

/// Errors raised while handling a single webhook event.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Malformed inbound event: missing {field}")]
    MalformedEvent { field: &'static str },

    #[error("Correlation key {key} is already pending")]
    DuplicateCorrelation { key: String },

    #[error("Delivery failed: {0}")]
    Delivery(#[from] ChannelError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_error_wraps_channel_error() {
        let err: RelayError = ChannelError::SendFailed {
            name: "twilio".into(),
            reason: "HTTP 401".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Delivery failed: Failed to send message on channel twilio: HTTP 401"
        );
    }

    #[test]
    fn malformed_event_names_field() {
        let err = RelayError::MalformedEvent { field: "From" };
        assert_eq!(err.to_string(), "Malformed inbound event: missing From");
    }
}
