use crate::matching::{normalize, TargetMatcher};
use crate::types::DistilledMention;

/// Returns a copy of `mention` whose `targets` and `removedTargets` keep only
/// the values matching `matcher`.
///
/// The input is never touched, so one fetched batch can be narrowed against
/// several targets independently.
pub fn distill_targets(mention: &DistilledMention, matcher: &TargetMatcher) -> DistilledMention {
    let mut narrowed = mention.clone();
    narrowed.targets.retain(|t| matcher.matches(t));
    if let Some(removed) = narrowed.removed_targets.as_mut() {
        removed.retain(|t| matcher.matches(t));
    }
    narrowed
}

/// Canonicalizes the removed-target list, when there is one.
pub fn normalize_removed_targets(mut mention: DistilledMention) -> DistilledMention {
    if let Some(removed) = mention.removed_targets.take() {
        let mut canonical: Vec<String> = Vec::with_capacity(removed.len());
        for url in removed {
            let url = normalize(&url).into_string();
            if !canonical.contains(&url) {
                canonical.push(url);
            }
        }
        mention.removed_targets = Some(canonical);
    }
    mention
}
