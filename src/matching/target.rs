use tracing::warn;

use super::canonical::{normalize, normalize_raw, CanonicalUrl};
use crate::types::TargetQuery;

/// Returns `true` if `value` looks like a bare hostname: ASCII letters,
/// digits, dots and hyphens only.
pub fn is_valid_hostname(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

/// Returns `true` if `candidate` satisfies `target`.
///
/// Builds a throwaway [`TargetMatcher`]; prefer constructing one when testing
/// many candidates against the same target.
pub fn matches(candidate: &str, target: &TargetQuery) -> bool {
    TargetMatcher::new(target).matches(candidate)
}

/// A target with every configured value canonicalized up front.
///
/// The three classes (`url`, `site`, `path`) are OR'd together, as are the
/// values within a class. Blank values and invalid hostnames are dropped at
/// construction, so a class that ends up empty never contributes a match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetMatcher {
    urls: Vec<CanonicalUrl>,
    hostnames: Vec<String>,
    paths: Vec<CanonicalUrl>,
}

impl TargetMatcher {
    pub fn new(target: &TargetQuery) -> Self {
        let urls = canonical_values(&target.url);
        let paths = canonical_values(&target.path);

        let mut hostnames: Vec<String> = Vec::new();
        for site in target.site.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            if !is_valid_hostname(site) {
                warn!(site, "ignoring site target that is not a bare hostname");
                continue;
            }
            match normalize_raw(site) {
                Ok(raw) => {
                    if !hostnames.contains(&raw.hostname) {
                        hostnames.push(raw.hostname);
                    }
                }
                Err(e) => warn!(site, error = %e, "ignoring unparseable site target"),
            }
        }

        Self {
            urls,
            hostnames,
            paths,
        }
    }

    /// Returns `true` when no usable value remains in any class.
    pub fn is_empty(&self) -> bool {
        self.urls.is_empty() && self.hostnames.is_empty() && self.paths.is_empty()
    }

    pub fn urls(&self) -> &[CanonicalUrl] {
        &self.urls
    }

    pub fn hostnames(&self) -> &[String] {
        &self.hostnames
    }

    pub fn paths(&self) -> &[CanonicalUrl] {
        &self.paths
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.matches_canonical(&normalize(candidate))
    }

    /// Like [`matches`](Self::matches) for an already canonical candidate.
    pub fn matches_canonical(&self, candidate: &CanonicalUrl) -> bool {
        if self.urls.iter().any(|url| url == candidate) {
            return true;
        }

        if !self.hostnames.is_empty() {
            if let Some(host) = candidate.hostname() {
                if self.hostnames.iter().any(|h| *h == host) {
                    return true;
                }
            }
        }

        self.paths.iter().any(|prefix| candidate.starts_with(prefix))
    }
}

/// Canonicalizes the non-blank values of one class, dropping duplicates.
fn canonical_values(values: &[String]) -> Vec<CanonicalUrl> {
    let mut out: Vec<CanonicalUrl> = Vec::new();
    for value in values.iter().filter(|v| !v.trim().is_empty()) {
        let canonical = normalize(value);
        if !out.contains(&canonical) {
            out.push(canonical);
        }
    }
    out
}
