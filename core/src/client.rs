//! Request builder, response parser and composed operations for the Gixen API.
//!
//! # Design
//! `GixenClient` owns an immutable `ClientConfig` and a `Transport`. Each
//! operation is split into a `build_*` method that produces an `HttpRequest`
//! and a `parse_*` method that consumes an `HttpResponse`; the plain method
//! (`snipe`, `unsnipe`, ...) runs exactly one round trip between them. There
//! is no retry, caching or state carried between calls.

use url::Url;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::{HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::params::encode_query;
use crate::parse::{check_error, confirms, parse_listing};
use crate::types::{Server, SnipeOptions, SnipeRecord};

/// Blocking client for one Gixen account.
#[derive(Debug, Clone)]
pub struct GixenClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl GixenClient<UreqTransport> {
    /// Build a client with the default ureq transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = UreqTransport::new(&config)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> GixenClient<T> {
    /// Build a client around a caller-supplied transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        Url::parse(&config.base_url)
            .map_err(|e| Error::InvalidConfig(format!("base url `{}`: {e}", config.base_url)))?;
        Ok(Self { config, transport })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Composed operations
    // -----------------------------------------------------------------------

    /// Place a snipe for `bid` (currency-neutral, e.g. "23.50") on `item`.
    ///
    /// Returns `true` only when the service answers `OK <item> ADDED`; any
    /// other non-error body is `false`.
    pub fn snipe(&self, item: &str, bid: &str, options: &SnipeOptions) -> Result<bool> {
        let request = self.build_snipe(item, bid, options)?;
        self.parse_snipe(item, self.send("snipe", &request)?)
    }

    /// Remove the snipe on `item`. `true` only for `OK <item> DELETED`.
    pub fn unsnipe(&self, item: &str) -> Result<bool> {
        let request = self.build_unsnipe(item)?;
        self.parse_unsnipe(item, self.send("unsnipe", &request)?)
    }

    /// Snipes on the main server, in service order.
    pub fn main_snipes(&self) -> Result<Vec<SnipeRecord>> {
        self.list(Server::Main)
    }

    /// Snipes on the mirror server, in service order.
    pub fn mirror_snipes(&self) -> Result<Vec<SnipeRecord>> {
        self.list(Server::Mirror)
    }

    /// Main server snipes followed by mirror server snipes.
    pub fn snipes(&self) -> Result<Vec<SnipeRecord>> {
        let mut all = self.main_snipes()?;
        all.extend(self.mirror_snipes()?);
        Ok(all)
    }

    pub fn list(&self, server: Server) -> Result<Vec<SnipeRecord>> {
        let request = self.build_list(server)?;
        self.parse_list(self.send(server.list_key(), &request)?)
    }

    /// Clear completed snipes. Returns the service's confirmation text as-is.
    pub fn purge(&self) -> Result<String> {
        let request = self.build_purge()?;
        self.parse_purge(self.send("purge", &request)?)
    }

    fn send(&self, operation: &str, request: &HttpRequest) -> Result<HttpResponse> {
        #[cfg(feature = "tracing")]
        tracing::debug!(operation, "sending gixen request");
        let response = self.transport.execute(request)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(
            operation,
            status = response.status,
            bytes = response.body.len(),
            "gixen response received"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = operation;
        Ok(response)
    }

    // -----------------------------------------------------------------------
    // Request builders
    // -----------------------------------------------------------------------

    pub fn build_snipe(
        &self,
        item: &str,
        bid: &str,
        options: &SnipeOptions,
    ) -> Result<HttpRequest> {
        let mut params = vec![
            ("itemid".to_string(), item.to_string()),
            ("maxbid".to_string(), bid.to_string()),
        ];
        params.extend(options.to_pairs());
        self.request(params)
    }

    pub fn build_unsnipe(&self, item: &str) -> Result<HttpRequest> {
        self.request([("ditemid", item)])
    }

    pub fn build_list(&self, server: Server) -> Result<HttpRequest> {
        self.request([(server.list_key(), "1")])
    }

    pub fn build_purge(&self) -> Result<HttpRequest> {
        self.request([("purgecompleted", "1")])
    }

    fn request<I, K, V>(&self, params: I) -> Result<HttpRequest>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let query = encode_query(&self.config.credentials, params)?;
        Ok(HttpRequest {
            url: format!("{}?{query}", self.config.base_url),
        })
    }

    // -----------------------------------------------------------------------
    // Response parsers
    // -----------------------------------------------------------------------

    pub fn parse_snipe(&self, item: &str, response: HttpResponse) -> Result<bool> {
        confirms(&response.body, item, "ADDED")
    }

    pub fn parse_unsnipe(&self, item: &str, response: HttpResponse) -> Result<bool> {
        confirms(&response.body, item, "DELETED")
    }

    /// A non-2xx body without an error sentinel is not a listing, so it
    /// fails with `Error::Status` instead of decoding into records.
    pub fn parse_list(&self, response: HttpResponse) -> Result<Vec<SnipeRecord>> {
        check_error(&response.body)?;
        if !response.is_success() {
            return Err(Error::Status {
                status: response.status,
                body: response.body,
            });
        }
        parse_listing(&response.body)
    }

    pub fn parse_purge(&self, response: HttpResponse) -> Result<String> {
        check_error(&response.body)?;
        Ok(response.body)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use url::form_urlencoded;

    use super::*;
    use crate::config::TlsMode;

    /// Replays canned responses and records every request URL.
    #[derive(Debug)]
    struct Scripted {
        responses: RefCell<Vec<Result<HttpResponse>>>,
        seen: RefCell<Vec<String>>,
    }

    impl Scripted {
        fn new(responses: Vec<Result<HttpResponse>>) -> Self {
            Self {
                responses: RefCell::new(responses),
                seen: RefCell::new(Vec::new()),
            }
        }

        fn bodies(bodies: &[&str]) -> Self {
            Self::new(bodies.iter().map(|b| Ok(HttpResponse::ok(*b))).collect())
        }
    }

    impl Transport for Scripted {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse> {
            self.seen.borrow_mut().push(request.url.clone());
            self.responses.borrow_mut().remove(0)
        }
    }

    const BASE: &str = "https://gixen.test/api.php";

    fn config() -> ClientConfig {
        ClientConfig::new("bidder", "pw", TlsMode::verify()).with_base_url(BASE)
    }

    fn client(transport: Scripted) -> GixenClient<Scripted> {
        GixenClient::with_transport(config(), transport).unwrap()
    }

    fn query_of(url: &str) -> Vec<(String, String)> {
        let (_, query) = url.split_once('?').unwrap();
        form_urlencoded::parse(query.as_bytes()).into_owned().collect()
    }

    #[test]
    fn build_snipe_produces_expected_url() {
        let c = client(Scripted::bodies(&[]));
        let opts = SnipeOptions::new().snipe_group(1).bid_offset(6);
        let req = c.build_snipe("123456789", "23.50", &opts).unwrap();
        assert_eq!(
            req.url,
            "https://gixen.test/api.php?username=bidder&password=pw&notags=1\
             &bidoffset=6&itemid=123456789&maxbid=23.50&snipegroup=1"
        );
    }

    #[test]
    fn build_list_uses_server_flag() {
        let c = client(Scripted::bodies(&[]));
        let main = query_of(&c.build_list(Server::Main).unwrap().url);
        let mirror = query_of(&c.build_list(Server::Mirror).unwrap().url);
        assert!(main.contains(&("listsnipesmain".to_string(), "1".to_string())));
        assert!(mirror.contains(&("listsnipesmirror".to_string(), "1".to_string())));
    }

    #[test]
    fn build_unsnipe_and_purge_keys() {
        let c = client(Scripted::bodies(&[]));
        let unsnipe = query_of(&c.build_unsnipe("77").unwrap().url);
        assert_eq!(unsnipe.last().unwrap(), &("ditemid".to_string(), "77".to_string()));
        let purge = query_of(&c.build_purge().unwrap().url);
        assert_eq!(purge.last().unwrap(), &("purgecompleted".to_string(), "1".to_string()));
    }

    #[test]
    fn option_colliding_with_item_is_rejected_before_sending() {
        let transport = Scripted::bodies(&[]);
        let c = client(transport);
        let opts = SnipeOptions::new().extra("itemid", "other");
        let err = c.snipe("1", "1.00", &opts).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter(_)));
        assert!(c.transport.seen.borrow().is_empty());
    }

    #[test]
    fn snipe_matches_submitted_item() {
        let c = client(Scripted::bodies(&["OK 123456789 ADDED\n"]));
        let opts = SnipeOptions::new().snipe_group(1);
        assert!(c.snipe("123456789", "23.50", &opts).unwrap());
    }

    #[test]
    fn snipe_for_other_item_is_false() {
        let c = client(Scripted::bodies(&["OK 555 ADDED"]));
        assert!(!c.snipe("123456789", "23.50", &SnipeOptions::new()).unwrap());
    }

    #[test]
    fn unsnipe_requires_deleted_sentinel() {
        let c = client(Scripted::bodies(&["OK 42 DELETED", "OK 42 ADDED"]));
        assert!(c.unsnipe("42").unwrap());
        assert!(!c.unsnipe("42").unwrap());
    }

    #[test]
    fn service_error_from_any_operation() {
        let body = "ERROR (5): invalid user";
        let c = client(Scripted::bodies(&[body, body, body, body]));
        assert_eq!(c.snipe("1", "1", &SnipeOptions::new()).unwrap_err().service_code(), Some(5));
        assert_eq!(c.unsnipe("1").unwrap_err().service_code(), Some(5));
        assert_eq!(c.main_snipes().unwrap_err().service_code(), Some(5));
        assert_eq!(c.purge().unwrap_err().service_code(), Some(5));
    }

    #[test]
    fn snipes_concatenates_main_then_mirror() {
        let c = client(Scripted::bodies(&[
            "1|#!#|a\n2|#!#|b\nOK MAIN LISTED",
            "3|#!#|c\n<br />OK MIRROR LISTED",
        ]));
        let ids: Vec<_> = c.snipes().unwrap().into_iter().map(|r| r.item_id).collect();
        assert_eq!(ids, ["1", "2", "3"]);
        let seen = c.transport.seen.borrow();
        assert!(seen[0].ends_with("listsnipesmain=1"));
        assert!(seen[1].ends_with("listsnipesmirror=1"));
    }

    #[test]
    fn main_snipes_single_record() {
        let body = "1|#!#|2024-01-01T00:00:00|#!#|23.50|#!#|OK|#!#||#!#|Lamp|#!#|0|#!#|1|#!#|6\n\
                    OK MAIN LISTED\n";
        let c = client(Scripted::bodies(&[body]));
        let records = c.main_snipes().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].item_id, "1");
        assert_eq!(records[0].max_bid.as_deref(), Some("23.50"));
    }

    #[test]
    fn purge_returns_raw_body() {
        let c = client(Scripted::bodies(&["OK COMPLETED PURGED\n"]));
        assert_eq!(c.purge().unwrap(), "OK COMPLETED PURGED\n");
    }

    #[test]
    fn network_error_is_not_parsed() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "ERROR (1): refused");
        let c = client(Scripted::new(vec![Err(Error::network(io))]));
        let err = c.purge().unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }

    fn status(status: u16, body: &str) -> Result<HttpResponse> {
        Ok(HttpResponse {
            status,
            body: body.to_string(),
        })
    }

    #[test]
    fn scalar_operations_ignore_status() {
        let c = client(Scripted::new(vec![
            status(503, "maintenance"),
            status(503, "maintenance"),
            status(502, "bad gateway"),
        ]));
        assert!(!c.snipe("1", "1.00", &SnipeOptions::new()).unwrap());
        assert!(!c.unsnipe("1").unwrap());
        assert_eq!(c.purge().unwrap(), "bad gateway");
    }

    #[test]
    fn empty_error_message_is_still_an_error() {
        let c = client(Scripted::bodies(&["ERROR (5): \n", "ERROR (5): "]));
        match c.purge().unwrap_err() {
            Error::Service { code, message } => {
                assert_eq!(code, 5);
                assert!(message.is_empty());
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let err = c.snipe("1", "1.00", &SnipeOptions::new()).unwrap_err();
        assert_eq!(err.service_code(), Some(5));
    }

    #[test]
    fn listing_non_success_status_without_sentinel() {
        let c = client(Scripted::new(vec![status(503, "maintenance")]));
        let err = c.main_snipes().unwrap_err();
        assert!(matches!(err, Error::Status { status: 503, .. }));
    }

    #[test]
    fn sentinel_takes_precedence_over_status() {
        let c = client(Scripted::new(vec![Ok(HttpResponse {
            status: 500,
            body: "ERROR (9): database down".to_string(),
        })]));
        assert_eq!(c.purge().unwrap_err().service_code(), Some(9));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let config = config().with_base_url("not a url");
        let err = GixenClient::with_transport(config, Scripted::bodies(&[])).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
