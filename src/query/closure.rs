use tracing::debug;

use super::predicate::{Predicate, SqlValue};
use crate::config::MentionGraphConfig;
use crate::matching::TargetMatcher;
use crate::types::{InteractionFilter, ResolveOptions, TargetQuery, DEFAULT_INTERACTION_TYPES};

/// Name of the recursive common table expression holding the closure.
pub const CLOSURE_TABLE: &str = "mention_closure";

/// A closure query ready for the store to execute.
///
/// Result columns, in order: entry `url`, `data` (JSON text), `type`,
/// `targets` (JSON array), `parents` (JSON array), entry `id`, and, when
/// `tracks_removed` is set, `removed_targets` (JSON array).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
    pub tracks_removed: bool,
}

/// Counts the entries that directly mention a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Builds the seed predicate and recursive step that let the store compute
/// every mention reachable from a target.
///
/// The seed selects live mentions whose URL satisfies the target. The
/// recursive step joins each discovered mentioning entry back onto the
/// mentions of that entry's own URL, recording the discovering entry as the
/// parent. `UNION` deduplicates by row, which bounds the fixpoint; logical
/// cycles are left for tree assembly to break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosureQueryBuilder {
    interaction_types: Vec<String>,
    track_removed: bool,
}

impl Default for ClosureQueryBuilder {
    fn default() -> Self {
        Self::new(
            DEFAULT_INTERACTION_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
        )
    }
}

impl ClosureQueryBuilder {
    pub fn new(interaction_types: Vec<String>) -> Self {
        Self {
            interaction_types,
            track_removed: false,
        }
    }

    pub fn from_config(config: &MentionGraphConfig) -> Self {
        Self::new(config.interaction_types.clone())
            .with_removed_targets(config.track_removed_targets)
    }

    /// Also project each entry's removed mention URLs.
    pub fn with_removed_targets(mut self, track: bool) -> Self {
        self.track_removed = track;
        self
    }

    pub fn interaction_types(&self) -> &[String] {
        &self.interaction_types
    }

    /// Seed predicate over the `mentions` table aliased as `m`.
    ///
    /// Returns `None` when the matcher has no usable value, so callers can
    /// skip the store entirely instead of scanning every mention.
    pub fn seed_predicate(&self, matcher: &TargetMatcher) -> Option<Predicate> {
        target_predicate(matcher, "m.normalized_url", "m.hostname")
    }

    /// Post-join predicate over the entry type (`e.type`).
    pub fn interaction_predicate(&self, filter: InteractionFilter) -> Option<Predicate> {
        let types: Vec<SqlValue> = self
            .interaction_types
            .iter()
            .map(|t| SqlValue::from(t.as_str()))
            .collect();

        match filter {
            InteractionFilter::Either => None,
            InteractionFilter::Required => Some(Predicate::one_of("e.type", types)),
            InteractionFilter::Excluded => {
                if types.is_empty() {
                    return None;
                }
                Some(Predicate::any(vec![
                    Predicate::IsNull { column: "e.type" },
                    Predicate::one_of("e.type", types).negate(),
                ]))
            }
        }
    }

    /// Builds the closure query, or `None` for a target with nothing to match.
    pub fn build(&self, target: &TargetQuery, options: &ResolveOptions) -> Option<ClosureQuery> {
        let matcher = TargetMatcher::new(target);
        let seed = self.seed_predicate(&matcher)?;

        let mut params: Vec<SqlValue> = Vec::new();
        let seed_sql = seed.render(&mut params);
        let interaction_seed = if options.interactions == InteractionFilter::Required {
            " AND m.interaction = 1"
        } else {
            ""
        };

        let entry_filter = self
            .interaction_predicate(options.interactions)
            .map(|p| format!("WHERE {}\n", p.render(&mut params)))
            .unwrap_or_default();

        // Only removed links that still satisfy the target are reported.
        let removed_column = match target_predicate(&matcher, "r.normalized_url", "r.hostname") {
            Some(removed) if self.track_removed => format!(
                ",\n       (SELECT json_group_array(r.url) FROM mentions r \
                 WHERE r.eid = e.id AND r.removed = 1 AND ({})) AS removed_targets",
                removed.render(&mut params)
            ),
            _ => String::new(),
        };

        let order = options.sort.as_sql();
        let sql = format!(
            "WITH RECURSIVE {CLOSURE_TABLE}(url, normalized_url, eid, parent) AS (
    SELECT m.url, m.normalized_url, m.eid, 0
    FROM mentions m
    WHERE ({seed_sql}) AND m.removed = 0{interaction_seed}
    UNION
    SELECT m.url, m.normalized_url, m.eid, c.eid
    FROM {CLOSURE_TABLE} c
    JOIN entries e ON e.id = c.eid
    JOIN mentions m ON m.normalized_url = e.normalized_url
    WHERE m.removed = 0
)
SELECT e.url, e.data, e.type,
       json_group_array(c.url) AS targets,
       json_group_array(c.parent) AS parents,
       e.id{removed_column}
FROM entries e
JOIN {CLOSURE_TABLE} c ON c.eid = e.id
{entry_filter}GROUP BY e.id
ORDER BY e.published {order}, e.id {order}"
        );

        debug!(
            params = params.len(),
            interactions = ?options.interactions,
            sort = options.sort.as_str(),
            "built mention closure query"
        );

        Some(ClosureQuery {
            sql,
            params,
            tracks_removed: self.track_removed,
        })
    }

    /// Builds a query counting the distinct entries directly mentioning the
    /// target, or `None` for a target with nothing to match.
    pub fn build_count(
        &self,
        target: &TargetQuery,
        interactions: InteractionFilter,
    ) -> Option<CountQuery> {
        let matcher = TargetMatcher::new(target);
        let seed = self.seed_predicate(&matcher)?;

        let mut params: Vec<SqlValue> = Vec::new();
        let mut conditions = vec![format!("({})", seed.render(&mut params)), "m.removed = 0".to_string()];
        if interactions == InteractionFilter::Required {
            conditions.push("m.interaction = 1".to_string());
        }
        if let Some(filter) = self.interaction_predicate(interactions) {
            conditions.push(filter.render(&mut params));
        }

        let sql = format!(
            "SELECT COUNT(DISTINCT m.eid)
FROM mentions m
JOIN entries e ON e.id = m.eid
WHERE {}",
            conditions.join(" AND ")
        );

        Some(CountQuery { sql, params })
    }
}

/// OR of the url, site and path classes over the given columns.
fn target_predicate(
    matcher: &TargetMatcher,
    url_column: &'static str,
    host_column: &'static str,
) -> Option<Predicate> {
    if matcher.is_empty() {
        return None;
    }

    let urls = Predicate::one_of(
        url_column,
        matcher
            .urls()
            .iter()
            .map(|u| SqlValue::from(u.as_str()))
            .collect(),
    );
    let sites = Predicate::one_of(
        host_column,
        matcher
            .hostnames()
            .iter()
            .map(|h| SqlValue::from(h.as_str()))
            .collect(),
    );
    let paths = Predicate::any(
        matcher
            .paths()
            .iter()
            .map(|p| Predicate::Prefix {
                column: url_column,
                prefix: p.as_str().to_string(),
            })
            .collect(),
    );

    Some(Predicate::any(vec![urls, sites, paths]))
}
