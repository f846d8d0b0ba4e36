use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{MentionGraphError, Result};

/// Comparable form of a URL. Equal strings denote equivalent addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Returns the lowercased host, or `None` if the value is not an absolute URL.
    pub fn hostname(&self) -> Option<String> {
        Url::parse(&self.0)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
    }

    /// Byte-prefix test on the canonical strings; not path-segment aware.
    pub fn starts_with(&self, prefix: &CanonicalUrl) -> bool {
        self.0.as_bytes().starts_with(prefix.0.as_bytes())
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Hostname extracted from a bare host string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawHost {
    pub hostname: String,
    /// The synthesized root URL, e.g. `http://example.com/`.
    pub url: CanonicalUrl,
}

/// Canonicalizes a URL.
///
/// Scheme and host are lowercased, default ports dropped, fragments and empty
/// queries removed, and trailing path separators trimmed (the root path keeps
/// its single `/`). Input that does not parse as an absolute URL is returned
/// trimmed but otherwise untouched, which keeps the function total and
/// idempotent.
pub fn normalize(url: &str) -> CanonicalUrl {
    let trimmed = url.trim();
    match Url::parse(trimmed) {
        Ok(parsed) => CanonicalUrl(canonicalize(parsed)),
        Err(_) => CanonicalUrl(trimmed.to_string()),
    }
}

/// Builds a root URL around a bare hostname and returns its normalized host.
///
/// Fails on input that yields no parseable host. Callers matching targets
/// treat the failure as "no match".
pub fn normalize_raw(raw_host: &str) -> Result<RawHost> {
    let trimmed = raw_host.trim();
    if trimmed.is_empty() {
        return Err(MentionGraphError::InvalidUrl {
            message: "empty hostname".to_string(),
            input: raw_host.to_string(),
        });
    }

    let parsed =
        Url::parse(&format!("http://{trimmed}/")).map_err(|e| MentionGraphError::InvalidUrl {
            message: format!("failed to parse hostname: {e}"),
            input: raw_host.to_string(),
        })?;

    let hostname = match parsed.host_str() {
        Some(host) if !host.is_empty() => host.to_string(),
        _ => {
            return Err(MentionGraphError::InvalidUrl {
                message: "no hostname".to_string(),
                input: raw_host.to_string(),
            })
        }
    };

    Ok(RawHost {
        hostname,
        url: CanonicalUrl(canonicalize(parsed)),
    })
}

fn canonicalize(mut url: Url) -> String {
    url.set_fragment(None);
    if url.query() == Some("") {
        url.set_query(None);
    }

    if !url.cannot_be_a_base() {
        let path = url.path();
        if path.len() > 1 && path.ends_with('/') {
            let trimmed = match path.trim_end_matches('/') {
                "" => "/".to_string(),
                rest => rest.to_string(),
            };
            url.set_path(&trimmed);
        }
    }

    url.into()
}
