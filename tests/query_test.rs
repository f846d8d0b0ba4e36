use mentiongraph::config::MentionGraphConfig;
use mentiongraph::query::*;
use mentiongraph::types::*;

fn text(value: &str) -> SqlValue {
    SqlValue::Text(value.to_string())
}

#[test]
fn test_empty_target_builds_no_query() {
    let builder = ClosureQueryBuilder::default();
    let options = ResolveOptions::default();

    assert!(builder.build(&TargetQuery::default(), &options).is_none());
    assert!(builder
        .build_count(&TargetQuery::default(), InteractionFilter::Either)
        .is_none());
}

#[test]
fn test_only_invalid_sites_builds_no_query() {
    let builder = ClosureQueryBuilder::default();
    let target = TargetQuery::site("example.com/blog");
    assert!(builder.build(&target, &ResolveOptions::default()).is_none());
}

#[test]
fn test_url_target_seeds_on_canonical_url() {
    let builder = ClosureQueryBuilder::default();
    let query = builder
        .build(
            &TargetQuery::url("HTTP://Example.com/post/"),
            &ResolveOptions::default(),
        )
        .expect("url target should build a query");

    assert!(query.sql.starts_with("WITH RECURSIVE mention_closure"));
    assert!(query.sql.contains("WHERE (m.normalized_url = ?1) AND m.removed = 0\n"));
    assert!(query.sql.contains("UNION\n"));
    assert!(query.sql.contains("JOIN mentions m ON m.normalized_url = e.normalized_url"));
    assert!(query.sql.contains("ORDER BY e.published ASC, e.id ASC"));
    assert!(!query.sql.contains("removed_targets"));
    assert!(!query.tracks_removed);
    assert_eq!(query.params, vec![text("http://example.com/post")]);
}

#[test]
fn test_all_classes_are_ored_in_the_seed() {
    let builder = ClosureQueryBuilder::default();
    let target = TargetQuery {
        url: vec![
            "http://a.example/one".to_string(),
            "http://a.example/two".to_string(),
        ],
        site: vec!["B.example".to_string()],
        path: vec!["http://c.example/notes/".to_string()],
    };
    let query = builder
        .build(&target, &ResolveOptions::default())
        .expect("query");

    assert!(query.sql.contains(
        "(m.normalized_url IN (?1, ?2) OR m.hostname = ?3 \
         OR substr(m.normalized_url, 1, length(?4)) = ?4)"
    ));
    assert_eq!(
        query.params,
        vec![
            text("http://a.example/one"),
            text("http://a.example/two"),
            text("b.example"),
            text("http://c.example/notes"),
        ]
    );
}

#[test]
fn test_descending_sort() {
    let builder = ClosureQueryBuilder::default();
    let options = ResolveOptions {
        sort: SortOrder::Desc,
        ..ResolveOptions::default()
    };
    let query = builder
        .build(&TargetQuery::url("http://example.com/"), &options)
        .expect("query");
    assert!(query.sql.contains("ORDER BY e.published DESC, e.id DESC"));
}

#[test]
fn test_required_interactions_restrict_seed_and_entry_type() {
    let builder = ClosureQueryBuilder::default();
    let options = ResolveOptions {
        interactions: InteractionFilter::Required,
        ..ResolveOptions::default()
    };
    let query = builder
        .build(&TargetQuery::url("http://example.com/"), &options)
        .expect("query");

    assert!(query.sql.contains("AND m.removed = 0 AND m.interaction = 1"));
    assert!(query.sql.contains("WHERE e.type IN (?2, ?3)\nGROUP BY e.id"));
    assert_eq!(&query.params[1..], &[text("like"), text("repost")]);
}

#[test]
fn test_excluded_interactions_keep_untyped_entries() {
    let builder = ClosureQueryBuilder::default();
    let options = ResolveOptions {
        interactions: InteractionFilter::Excluded,
        ..ResolveOptions::default()
    };
    let query = builder
        .build(&TargetQuery::url("http://example.com/"), &options)
        .expect("query");

    assert!(!query.sql.contains("m.interaction = 1"));
    assert!(query
        .sql
        .contains("WHERE (e.type IS NULL OR NOT (e.type IN (?2, ?3)))"));
}

#[test]
fn test_either_interactions_add_no_entry_filter() {
    let builder = ClosureQueryBuilder::default();
    assert!(builder
        .interaction_predicate(InteractionFilter::Either)
        .is_none());
}

#[test]
fn test_configured_interaction_types() {
    let config = MentionGraphConfig {
        interaction_types: vec!["bookmark".to_string()],
        track_removed_targets: true,
        ..MentionGraphConfig::default()
    };
    let builder = ClosureQueryBuilder::from_config(&config);
    assert_eq!(builder.interaction_types(), &["bookmark".to_string()]);

    let options = ResolveOptions {
        interactions: InteractionFilter::Required,
        ..ResolveOptions::default()
    };
    let query = builder
        .build(&TargetQuery::url("http://example.com/"), &options)
        .expect("query");
    assert!(query.sql.contains("WHERE e.type = ?2"));
    assert!(query.sql.contains(
        "WHERE r.eid = e.id AND r.removed = 1 AND (r.normalized_url = ?3)) AS removed_targets"
    ));
    assert_eq!(query.params[2], text("http://example.com/"));
    assert!(query.tracks_removed);
}

#[test]
fn test_count_query() {
    let builder = ClosureQueryBuilder::default();
    let count = builder
        .build_count(&TargetQuery::site("example.com"), InteractionFilter::Required)
        .expect("count query");

    assert!(count.sql.starts_with("SELECT COUNT(DISTINCT m.eid)"));
    assert!(count
        .sql
        .ends_with("WHERE (m.hostname = ?1) AND m.removed = 0 AND m.interaction = 1 AND e.type IN (?2, ?3)"));
    assert_eq!(count.params[0], text("example.com"));
}
