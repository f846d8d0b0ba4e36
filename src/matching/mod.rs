/// URL canonicalization.
pub mod canonical;

/// Matching candidate URLs against a requested target.
pub mod target;

pub use canonical::{normalize, normalize_raw, CanonicalUrl, RawHost};
pub use target::{is_valid_hostname, matches, TargetMatcher};
