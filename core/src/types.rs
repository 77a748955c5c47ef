//! Domain types for the Gixen API.
//!
//! # Design
//! `SnipeOptions` carries the well-known optional snipe fields plus an
//! `extra` map that is forwarded verbatim, so parameters the service adds
//! later can be sent without a client release. Nothing here applies
//! defaults: an unset option is simply not sent and the service decides.
//!
//! `SnipeRecord` is the decoded form of one listing line. Fields are
//! positional on the wire; any field past the ninth is kept in `extra`
//! under its zero-based index.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which Gixen backend a listing request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Server {
    Main,
    Mirror,
}

impl Server {
    /// Query key that asks this server for its snipe list.
    pub fn list_key(self) -> &'static str {
        match self {
            Server::Main => "listsnipesmain",
            Server::Mirror => "listsnipesmirror",
        }
    }
}

impl fmt::Display for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Server::Main => write!(f, "main"),
            Server::Mirror => write!(f, "mirror"),
        }
    }
}

/// Optional snipe metadata sent alongside item id and max bid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnipeOptions {
    /// Snipe group number. The service treats 0 as "no group".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snipe_group: Option<u32>,

    /// Item quantity. Obsolete on the service side but still accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,

    /// Seconds before auction end to bid on the main server
    /// (service accepts 3, 6, 8, 10 or 15; default 6).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_offset: Option<u32>,

    /// Same as `bid_offset`, for the mirror server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_offset_mirror: Option<u32>,

    /// Parameters forwarded as-is under their own names.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl SnipeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snipe_group(mut self, group: u32) -> Self {
        self.snipe_group = Some(group);
        self
    }

    pub fn quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn bid_offset(mut self, seconds: u32) -> Self {
        self.bid_offset = Some(seconds);
        self
    }

    pub fn bid_offset_mirror(mut self, seconds: u32) -> Self {
        self.bid_offset_mirror = Some(seconds);
        self
    }

    /// Forward an arbitrary parameter. Later calls with the same key win.
    pub fn extra(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.extra.insert(key.into(), value.to_string());
        self
    }

    /// Flatten into wire parameter pairs, well-known keys first.
    pub(crate) fn to_pairs(&self) -> Vec<(String, String)> {
        let known = [
            ("snipegroup", self.snipe_group),
            ("quantity", self.quantity),
            ("bidoffset", self.bid_offset),
            ("bidoffsetmirror", self.bid_offset_mirror),
        ];
        known
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key.to_string(), v.to_string())))
            .chain(self.extra.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect()
    }
}

/// One snipe as reported by a listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnipeRecord {
    pub item_id: String,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub max_bid: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub snipe_group: Option<String>,
    #[serde(default)]
    pub quantity: Option<String>,
    #[serde(default)]
    pub bid_offset: Option<String>,
    /// Fields beyond the ninth, keyed by zero-based position.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<usize, String>,
}

impl SnipeRecord {
    /// Number of named positional fields on a listing line.
    pub const NAMED_FIELDS: usize = 9;

    /// Build a record from the fields of one listing line, in wire order.
    ///
    /// Returns `None` when there are no fields at all.
    pub fn from_fields<I, S>(fields: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fields = fields.into_iter().map(Into::into);
        let mut record = SnipeRecord {
            item_id: fields.next()?,
            ..SnipeRecord::default()
        };
        for (index, value) in fields.enumerate().map(|(i, v)| (i + 1, v)) {
            let slot = match index {
                1 => &mut record.end_time,
                2 => &mut record.max_bid,
                3 => &mut record.status,
                4 => &mut record.message,
                5 => &mut record.title,
                6 => &mut record.snipe_group,
                7 => &mut record.quantity,
                8 => &mut record.bid_offset,
                _ => {
                    record.extra.insert(index, value);
                    continue;
                }
            };
            *slot = Some(value);
        }
        Some(record)
    }
}
