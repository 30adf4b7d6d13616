//! Patterns for the recent-changes IRC feed.
//!
//! Each edit arrives as one line with mIRC colour codes (`\x03NN`) separating the
//! fields:
//!
//! ```text
//! \x0314[[\x0307Page\x0314]]\x034 FLAGS\x0310 \x0302URL\x03 \x035*\x03 \x0303User\x03 \x035*\x03 (+12) \x0310Comment\x03
//! ```
//!
//! All patterns are compiled once and shared.

use crate::error::FormatError;
use once_cell::sync::Lazy;
use regex::Regex;

static EDIT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"\A\x0314\[\[\x0307(.+?)\x0314\]\]\x034 (.*?)\x0310.*\x0302(http.+?)\x03.+",
        r"\x0303(.+?)\x03.+\x03 (\(([+-][0-9]+)\).*|.+) \x0310(.+)\x03\z",
    ))
    .unwrap()
});

static CHANNEL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A#([A-Za-z0-9_]{2})\..*\z").unwrap());

// Loose on purpose: any separator character, no octet range check.
static ANONYMOUS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A[0-9]+.[0-9]+.[0-9]+.[0-9]+\z").unwrap());

/// Fields captured from a single feed line, borrowed from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditFields<'a> {
    pub page: &'a str,
    pub flags: &'a str,
    pub diff_url: &'a str,
    pub user: &'a str,
    pub summary: &'a str,
    pub delta: Option<&'a str>,
    pub comment: &'a str,
}

/// Matches the whole line against the edit grammar.
pub fn parse_edit(text: &str) -> Result<EditFields<'_>, FormatError> {
    let caps = EDIT_REGEX.captures(text).ok_or(FormatError::LineMismatch)?;
    let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());

    Ok(EditFields {
        page: group(1),
        flags: group(2),
        diff_url: group(3),
        user: group(4),
        summary: group(5),
        delta: caps.get(6).map(|m| m.as_str()),
        comment: group(7),
    })
}

/// Two-character language code from a channel such as `#en.wikipedia`.
pub fn channel_language(channel: &str) -> Option<&str> {
    CHANNEL_REGEX
        .captures(channel)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// True when the editor name looks like a dotted-quad address.
pub fn looks_anonymous(user: &str) -> bool {
    ANONYMOUS_REGEX.is_match(user)
}

/// Title as it appears in page URLs: ASCII whitespace replaced by underscores.
pub fn page_url(page: &str) -> String {
    page.chars()
        .map(|c| match c {
            ' ' | '\t' | '\n' | '\x0B' | '\x0C' | '\r' => '_',
            other => other,
        })
        .collect()
}
