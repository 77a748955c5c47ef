//! HTTP transport for the Gixen client.
//!
//! # Design
//! `HttpRequest` and `HttpResponse` describe one round trip as plain data.
//! `GixenClient::build_*` produces the request and `GixenClient::parse_*`
//! consumes the response, so a host can run the I/O itself. The `Transport`
//! trait is the seam used by the composed operations; `UreqTransport` is the
//! blocking implementation shipped with the crate.
//!
//! Transport failures surface as `Error::Network` and are never scanned for
//! sentinel text. Non-2xx statuses are returned as data, not errors.

use std::sync::Arc;

use ureq::tls::{parse_pem, Certificate, PemItem, RootCerts, TlsConfig};
use ureq::Agent;

use crate::config::{ClientConfig, TlsMode};
use crate::error::{Error, Result};

/// A GET request described as plain data. `url` includes the query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
}

/// Status and body text of one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Executes one HTTP GET and returns the raw response.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by a `ureq::Agent`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// Build an agent honouring the TLS mode and timeout of `config`.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let tls = tls_config(&config.tls)?;
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(config.timeout)
            .tls_config(tls)
            .build()
            .new_agent();
        Ok(Self { agent })
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let mut response = self.agent.get(&request.url).call()?;
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string()?;
        Ok(HttpResponse { status, body })
    }
}

fn tls_config(mode: &TlsMode) -> Result<TlsConfig> {
    let builder = TlsConfig::builder();
    let builder = match mode {
        TlsMode::SkipVerification => builder.disable_verification(true),
        TlsMode::Verify { ca_pem: None } => builder,
        TlsMode::Verify { ca_pem: Some(pem) } => {
            builder.root_certs(RootCerts::Specific(Arc::new(pem_certificates(pem)?)))
        }
    };
    Ok(builder.build())
}

/// Every certificate in a PEM bundle. Private keys are skipped.
fn pem_certificates(pem: &str) -> Result<Vec<Certificate<'static>>> {
    let mut certs = Vec::new();
    for item in parse_pem(pem.as_bytes()) {
        let item = item.map_err(|e| Error::InvalidConfig(format!("bad certificate: {e}")))?;
        if let PemItem::Certificate(cert) = item {
            certs.push(cert.to_owned());
        }
    }
    if certs.is_empty() {
        return Err(Error::InvalidConfig("no certificate in PEM material".to_string()));
    }
    Ok(certs)
}
