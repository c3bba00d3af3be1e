//! Error types for the scripted DNS simulator.

use thiserror::Error;

/// Errors that can occur while running or probing the simulator.
#[derive(Error, Debug)]
pub enum SimError {
    /// DNS server failed to bind or stopped abnormally.
    #[error("dns server error: {0}")]
    Server(String),

    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),

    /// A TXT lookup failed for a reason other than an empty answer.
    #[error("dns lookup failed: {0}")]
    Resolve(String),

    /// The expected TXT value never became visible.
    #[error("{name} not propagated after {attempts} attempts")]
    PropagationTimeout { name: String, attempts: u32 },

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_propagation_timeout_message() {
        let err = SimError::PropagationTimeout {
            name: "_acme-challenge.example.com.".into(),
            attempts: 4,
        };
        assert_eq!(
            err.to_string(),
            "_acme-challenge.example.com. not propagated after 4 attempts"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let err: SimError = std::io::Error::new(std::io::ErrorKind::AddrInUse, "busy").into();
        assert!(matches!(err, SimError::Io(_)));
    }
}
