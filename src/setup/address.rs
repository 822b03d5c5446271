//! Server address normalization and auto-correction diffing.
//!
//! The user types an address in whatever shape they remember it; the probe
//! may answer from a different one (another scheme, an explicit port, a
//! `/youtrack` context path). [`AddressDiff`] tells the caller which pieces
//! of the typed address were corrected so it can highlight them.

use std::fmt;

use reqwest::Url;
use thiserror::Error;

/// Scheme assumed when the user omits one.
pub const DEFAULT_SCHEME: &str = "http";

const RECOGNIZED_PREFIXES: [&str; 2] = ["http://", "https://"];

/// Errors produced while parsing a server address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// The text is not a URL at all.
    #[error("malformed address '{address}': {reason}")]
    Malformed { address: String, reason: String },

    /// The URL has no host part (e.g. `http:///path`).
    #[error("address '{0}' has no host")]
    MissingHost(String),
}

/// Normalize user input into an address with a scheme.
///
/// Surrounding whitespace and trailing slashes are dropped. If the text does
/// not start with `http://` or `https://` (any case), `http://` is prepended.
/// No other validation happens here.
pub fn normalize_address(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if has_recognized_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("{}://{}", DEFAULT_SCHEME, trimmed)
    }
}

/// Whether the text already starts with a scheme we know how to probe.
pub fn has_recognized_scheme(address: &str) -> bool {
    let lower = address.to_ascii_lowercase();
    RECOGNIZED_PREFIXES
        .iter()
        .any(|prefix| lower.starts_with(prefix))
}

/// A server address split into the components the diff compares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    /// Lowercase scheme, e.g. `https`.
    pub scheme: String,
    /// Host name or IP literal (IPv6 in brackets).
    pub host: String,
    /// Port, only when written out in the address text.
    pub port: Option<u16>,
    /// Path exactly as written, empty when absent.
    pub path: String,
}

impl ServerAddress {
    /// Parse a full address.
    ///
    /// The URL parser decides whether the text is well formed and supplies
    /// the scheme and host. Port and path are taken from the text itself, so
    /// an explicit default port (`https://host:443`) is kept and a missing
    /// path stays empty rather than becoming `/`.
    pub fn parse(address: &str) -> Result<Self, AddressError> {
        let url = Url::parse(address).map_err(|e| AddressError::Malformed {
            address: address.to_string(),
            reason: e.to_string(),
        })?;

        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| AddressError::MissingHost(address.to_string()))?
            .to_string();

        let after_scheme = address
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or_default();
        let authority_end = after_scheme
            .find(['/', '?', '#'])
            .unwrap_or(after_scheme.len());
        let (authority, remainder) = after_scheme.split_at(authority_end);

        let port = if has_explicit_port(authority) {
            url.port_or_known_default()
        } else {
            None
        };

        let path = if remainder.starts_with('/') {
            let end = remainder.find(['?', '#']).unwrap_or(remainder.len());
            remainder[..end].to_string()
        } else {
            String::new()
        };

        Ok(Self {
            scheme: url.scheme().to_string(),
            host,
            port,
            path,
        })
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        write!(f, "{}", self.path)
    }
}

fn has_explicit_port(authority: &str) -> bool {
    let host_port = authority
        .rsplit_once('@')
        .map(|(_, host_port)| host_port)
        .unwrap_or(authority);

    if let Some(rest) = host_port.strip_prefix('[') {
        rest.split_once(']')
            .map(|(_, after)| after.starts_with(':'))
            .unwrap_or(false)
    } else {
        host_port.contains(':')
    }
}

/// Which components of the canonical address differ from the typed one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressDiff {
    pub scheme: bool,
    pub host: bool,
    pub port: bool,
    pub path: bool,
}

impl AddressDiff {
    /// Compare the pre-probe address with the canonical one.
    ///
    /// The port only counts when the canonical address names one; the path
    /// only counts when the canonical path is non-empty.
    pub fn between(before: &ServerAddress, after: &ServerAddress) -> Self {
        Self {
            scheme: before.scheme != after.scheme,
            host: before.host != after.host,
            port: after.port.is_some() && before.port != after.port,
            path: !after.path.is_empty() && before.path != after.path,
        }
    }

    /// Whether anything was corrected.
    pub fn has_changes(&self) -> bool {
        self.scheme || self.host || self.port || self.path
    }
}

/// One piece of the canonical address ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub changed: bool,
}

impl Segment {
    fn new(text: impl Into<String>, changed: bool) -> Self {
        Self {
            text: text.into(),
            changed,
        }
    }
}

/// Split `canonical` into display segments tagged with the diff.
///
/// Separators share the flag of the component they introduce.
pub fn segments(canonical: &ServerAddress, diff: &AddressDiff) -> Vec<Segment> {
    let mut out = vec![
        Segment::new(canonical.scheme.clone(), diff.scheme),
        Segment::new("://", diff.scheme),
        Segment::new(canonical.host.clone(), diff.host),
    ];
    if let Some(port) = canonical.port {
        out.push(Segment::new(":", diff.port));
        out.push(Segment::new(port.to_string(), diff.port));
    }
    if !canonical.path.is_empty() {
        out.push(Segment::new(canonical.path.clone(), diff.path));
    }
    out
}
