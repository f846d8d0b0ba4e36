/// Projection of raw store rows into distilled mentions.
pub mod distill;

/// Non-destructive narrowing of mention targets.
pub mod filter;

/// Assembly of flat mentions into entry-rooted trees.
pub mod tree;

pub use distill::{distill, distill_all, has_interaction_target, AUTHOR_FIELDS, DISTILLED_FIELDS};
pub use filter::{distill_targets, normalize_removed_targets};
pub use tree::{assemble, AssemblyStats, MentionTree};
