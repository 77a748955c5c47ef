//! Response body parsing.
//!
//! The service reports everything through sentinel lines in a plain-text
//! body. Error detection is line-anchored (`ERROR (<code>): <text>` at the
//! start of a line, leading whitespace ignored), so a title or message that
//! merely contains "ERROR" is never mistaken for a failure. Error detection
//! always runs before any success matching or list decoding.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};
use crate::types::SnipeRecord;

/// Separator between fields of one listing line.
pub const FIELD_DELIMITER: &str = "|#!#|";

static ERROR_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ERROR \(([0-9]+)\): (.*)$").expect("valid regex"));

static LISTED_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:<br[^>]*>)?OK M(?:AIN|IRROR) LISTED(?:<br[^>]*>)?$").expect("valid regex")
});

/// Fail with `Error::Service` if any line of `body` is an error sentinel.
///
/// The first matching line wins.
pub fn check_error(body: &str) -> Result<()> {
    for line in body.lines() {
        // Only the start is trimmed: the message after `: ` may be empty.
        if let Some(caps) = ERROR_LINE.captures(line.trim_start()) {
            // Codes too large for u32 saturate rather than hide the error.
            let code = caps[1].parse().unwrap_or(u32::MAX);
            return Err(Error::Service {
                code,
                message: caps[2].trim_end().to_string(),
            });
        }
    }
    Ok(())
}

/// True if some trimmed line of `body` is exactly `OK <item> <verb>`.
///
/// Anything else that is not an error resolves to `false`.
pub fn confirms(body: &str, item: &str, verb: &str) -> Result<bool> {
    check_error(body)?;
    let expected = format!("OK {item} {verb}");
    Ok(body.lines().any(|line| line.trim() == expected))
}

/// Decode a listing body into records, in the order the service sent them.
///
/// Blank lines and the `OK MAIN LISTED` / `OK MIRROR LISTED` terminator are
/// skipped.
pub fn parse_listing(body: &str) -> Result<Vec<SnipeRecord>> {
    check_error(body)?;
    let records = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !LISTED_LINE.is_match(line))
        .filter_map(|line| SnipeRecord::from_fields(line.split(FIELD_DELIMITER)))
        .collect();
    Ok(records)
}
