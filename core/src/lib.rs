//! Blocking client for the Gixen auction-sniping API.
//!
//! # Overview
//! Places and removes snipes, lists snipes on the main and mirror servers,
//! and purges completed ones. Every operation is one synchronous HTTPS GET
//! with the account credentials in the query string; results come back as
//! plain-text sentinel lines.
//!
//! # Design
//! - `GixenClient` owns an immutable `ClientConfig` and a `Transport`.
//! - Each operation is split into `build_*` (produces `HttpRequest`) and
//!   `parse_*` (consumes `HttpResponse`), so hosts with their own HTTP stack
//!   can drive the I/O; the plain methods compose the two over `ureq`.
//! - No retries, caching or logging by default. Enable the `tracing`
//!   feature for debug events around each round trip.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod params;
pub mod parse;
pub mod types;

pub use client::GixenClient;
pub use config::{ClientConfig, TlsMode, DEFAULT_BASE_URL};
pub use error::{Error, Result};
pub use http::{HttpRequest, HttpResponse, Transport, UreqTransport};
pub use params::Credentials;
pub use types::{Server, SnipeOptions, SnipeRecord};
