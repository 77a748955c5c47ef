//! Query-string encoding for Gixen requests.
//!
//! Every request carries `username`, `password` and `notags=1` first, then the
//! operation parameters in sorted key order. Values are form-urlencoded.

use std::collections::BTreeMap;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use url::form_urlencoded;

use crate::error::{Error, Result};

/// Parameter names the encoder always supplies itself.
pub const RESERVED_KEYS: [&str; 3] = ["username", "password", "notags"];

/// eBay credentials forwarded verbatim on every request.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    #[serde(deserialize_with = "secret_from_string")]
    pub password: SecretString,
}

fn secret_from_string<'de, D>(deserializer: D) -> std::result::Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Encode `params` into a query string behind the fixed auth/control keys.
///
/// Fails with `InvalidParameter` for an empty key, a key that shadows one of
/// the reserved names, or a value carrying control characters.
pub fn encode_query<I, K, V>(credentials: &Credentials, params: I) -> Result<String>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut sorted = BTreeMap::new();
    for (key, value) in params {
        let key = key.into();
        let value = value.into();
        validate(&key, &value)?;
        if sorted.insert(key.clone(), value).is_some() {
            return Err(Error::InvalidParameter(format!("duplicate parameter `{key}`")));
        }
    }

    let mut query = form_urlencoded::Serializer::new(String::new());
    query
        .append_pair("username", &credentials.username)
        .append_pair("password", credentials.password.expose_secret())
        .append_pair("notags", "1");
    for (key, value) in &sorted {
        query.append_pair(key, value);
    }
    Ok(query.finish())
}

fn validate(key: &str, value: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidParameter("empty parameter name".to_string()));
    }
    if RESERVED_KEYS.contains(&key) {
        return Err(Error::InvalidParameter(format!(
            "`{key}` is set by the client and cannot be overridden"
        )));
    }
    if value.chars().any(char::is_control) {
        return Err(Error::InvalidParameter(format!(
            "value for `{key}` contains control characters"
        )));
    }
    Ok(())
}
