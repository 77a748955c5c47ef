//! Error types for the Gixen client.
//!
//! # Design
//! `Service` is the only variant produced by the remote service itself: it
//! is built from an `ERROR (<code>): <text>` sentinel line. `Network` covers
//! everything that went wrong before a body could be read and is never
//! inspected for sentinel text. `InvalidParameter` and `InvalidConfig` are
//! raised locally before any request leaves the process.

use std::error::Error as StdError;

use thiserror::Error;

/// Errors returned by `GixenClient` build, parse and round-trip methods.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection, DNS, TLS handshake or timeout failure in the transport.
    #[error("network error: {0}")]
    Network(#[source] Box<dyn StdError + Send + Sync>),

    /// The service answered with an error sentinel line.
    #[error("{code} - {message}")]
    Service { code: u32, message: String },

    /// A request parameter was rejected before encoding.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The client configuration could not be turned into a transport.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A listing answered with a non-2xx status and no error sentinel.
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
}

impl Error {
    /// Wrap any transport-level failure as `Error::Network`.
    pub fn network<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Error::Network(Box::new(err))
    }

    /// The service error code, if this error came from an error sentinel.
    pub fn service_code(&self) -> Option<u32> {
        match self {
            Error::Service { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        Error::network(err)
    }
}

/// Result type for Gixen client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_displays_code_and_message() {
        let err = Error::Service {
            code: 42,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "42 - boom");
        assert_eq!(err.service_code(), Some(42));
    }

    #[test]
    fn network_error_keeps_its_source() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "deadline elapsed");
        let err = Error::network(io);
        assert!(err.to_string().contains("deadline elapsed"));
        assert!(err.source().is_some());
        assert_eq!(err.service_code(), None);
    }
}
