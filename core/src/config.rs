//! Client configuration.
//!
//! # Design
//! TLS verification is an explicit choice at construction: there is no
//! default `TlsMode`, so an embedding application always states whether it
//! verifies (optionally against a pinned certificate) or skips verification.
//! The struct is `Deserialize` so hosts can read it from their own config.

use std::time::Duration;

use serde::Deserialize;

use crate::params::Credentials;

/// Production endpoint of the service.
pub const DEFAULT_BASE_URL: &str = "https://www.gixen.com/api.php";

/// How the transport treats the server certificate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TlsMode {
    /// Verify the server. With `ca_pem` set, only certificates chaining to
    /// the given PEM material are trusted; otherwise the bundled web roots.
    Verify {
        #[serde(default)]
        ca_pem: Option<String>,
    },
    /// Accept any certificate.
    SkipVerification,
}

impl TlsMode {
    pub fn verify() -> Self {
        TlsMode::Verify { ca_pem: None }
    }

    pub fn pinned(ca_pem: impl Into<String>) -> Self {
        TlsMode::Verify {
            ca_pem: Some(ca_pem.into()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(flatten)]
    pub credentials: Credentials,
    pub tls: TlsMode,
    /// Overall deadline for one request, handed to the transport as-is.
    #[serde(default, with = "opt_secs")]
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(username: impl Into<String>, password: impl Into<String>, tls: TlsMode) -> Self {
        Self {
            base_url: default_base_url(),
            credentials: Credentials::new(username, password),
            tls,
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

mod opt_secs {
    use std::time::Duration;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<f64>::deserialize(deserializer)?
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(D::Error::custom))
            .transpose()
    }
}
