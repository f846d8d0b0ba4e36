use std::cell::Cell;

use mentiongraph::config::MentionGraphConfig;
use mentiongraph::errors::{MentionGraphError, Result};
use mentiongraph::logging::{init_logging, init_logging_from_config};
use mentiongraph::query::{ClosureQuery, CountQuery};
use mentiongraph::resolver::MentionGraph;
use mentiongraph::store::{ExampleSource, MentionStore};
use mentiongraph::types::*;
use serde_json::json;
use tempfile::TempDir;

/// Store returning canned rows and counting how often it is asked.
struct CannedStore {
    rows: Vec<RawMentionRow>,
    calls: Cell<usize>,
}

impl CannedStore {
    fn new(rows: Vec<RawMentionRow>) -> Self {
        Self {
            rows,
            calls: Cell::new(0),
        }
    }
}

impl MentionStore for CannedStore {
    async fn fetch_mention_rows(&self, _query: &ClosureQuery) -> Result<Vec<RawMentionRow>> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.rows.clone())
    }

    async fn count_mentions(&self, _query: &CountQuery) -> Result<u64> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.rows.len() as u64)
    }
}

struct FixedExamples;

impl ExampleSource for FixedExamples {
    fn generate(&self, count: usize, _options: &ResolveOptions) -> Result<Vec<DistilledMention>> {
        Ok((1..=count as i64)
            .map(|id| DistilledMention {
                url: format!("http://example.org/{id}"),
                name: None,
                published: None,
                summary: None,
                author: Author::default(),
                mention_type: "mention".to_string(),
                interactions: Vec::new(),
                targets: Vec::new(),
                removed_targets: None,
                interaction_target: false,
                id,
                parents: vec![0],
            })
            .collect())
    }
}

struct BrokenExamples;

impl ExampleSource for BrokenExamples {
    fn generate(&self, _count: usize, _options: &ResolveOptions) -> Result<Vec<DistilledMention>> {
        Err(MentionGraphError::Fixture {
            message: "generator unavailable".to_string(),
        })
    }
}

fn raw(id: i64, targets: &[&str], parents: &[i64]) -> RawMentionRow {
    RawMentionRow {
        url: format!("http://source.example/{id}"),
        data: Some(json!({"name": format!("entry {id}")})),
        mention_type: None,
        targets: targets.iter().map(|t| t.to_string()).collect(),
        removed_targets: None,
        parents: parents.to_vec(),
        id,
    }
}

// ---------------------------------------------------------------------------
// Resolution pipeline
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_empty_target_never_reaches_the_store() {
    let graph = MentionGraph::new(
        CannedStore::new(vec![raw(1, &["http://a/"], &[0])]),
        MentionGraphConfig::default(),
    );

    let request = TargetRequest::new(TargetSpec::Normal(TargetQuery::default()));
    assert!(graph.get_mentions(&request).await.unwrap().is_empty());

    let blank = TargetRequest::for_url("   ");
    assert!(graph.get_mentions(&blank).await.unwrap().is_empty());

    assert_eq!(
        graph
            .count_mentions(&TargetQuery::default(), InteractionFilter::Either)
            .await
            .unwrap(),
        0
    );
    assert_eq!(graph.store().calls.get(), 0);
}

#[tokio::test]
async fn test_rows_become_nested_trees() {
    let graph = MentionGraph::new(
        CannedStore::new(vec![
            raw(1, &["http://example.com/post"], &[0]),
            raw(2, &["http://source.example/1"], &[1]),
        ]),
        MentionGraphConfig::default(),
    );

    let roots = graph
        .get_mentions(&TargetRequest::for_url("http://example.com/post"))
        .await
        .unwrap();
    assert_eq!(graph.store().calls.get(), 1);
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].mention.name.as_deref(), Some("entry 1"));
    assert_eq!(roots[0].children()[0].mention.url, "http://source.example/2");
}

#[tokio::test]
async fn test_distill_targets_narrows_to_the_request() {
    let graph = MentionGraph::new(
        CannedStore::new(vec![raw(
            1,
            &["http://example.com/post", "http://elsewhere.example/"],
            &[0],
        )]),
        MentionGraphConfig::default(),
    );
    let query = TargetQuery::site("example.com");

    let wide = graph
        .get_distilled_mentions(&query, &ResolveOptions::default())
        .await
        .unwrap();
    assert_eq!(wide[0].targets.len(), 2);

    let options = ResolveOptions {
        distill_targets: true,
        ..ResolveOptions::default()
    };
    let narrow = graph.get_distilled_mentions(&query, &options).await.unwrap();
    assert_eq!(narrow[0].targets, vec!["http://example.com/post".to_string()]);
}

#[tokio::test]
async fn test_removed_targets_are_canonicalized() {
    let mut row = raw(1, &["http://example.com/post"], &[0]);
    row.removed_targets = Some(Some(vec![
        "http://Example.com/old/".to_string(),
        "http://example.com/old".to_string(),
    ]));
    let graph = MentionGraph::new(CannedStore::new(vec![row]), MentionGraphConfig::default());

    let mentions = graph
        .get_distilled_mentions(&TargetQuery::url("http://example.com/post"), &ResolveOptions::default())
        .await
        .unwrap();
    assert_eq!(
        mentions[0].removed_targets,
        Some(vec!["http://example.com/old".to_string()])
    );
}

// ---------------------------------------------------------------------------
// Examples
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_example_requests_use_the_example_source() {
    let config = MentionGraphConfig {
        example_count: 2,
        ..MentionGraphConfig::default()
    };
    let graph = MentionGraph::new(CannedStore::new(Vec::new()), config)
        .with_example_source(FixedExamples);

    let defaulted = TargetRequest::new(TargetSpec::Example(ExampleRequest { count: None }));
    assert_eq!(graph.get_mentions(&defaulted).await.unwrap().len(), 2);

    let counted = TargetRequest::new(TargetSpec::Example(ExampleRequest { count: Some(4) }));
    assert_eq!(graph.get_mentions(&counted).await.unwrap().len(), 4);

    assert_eq!(graph.store().calls.get(), 0);
}

#[tokio::test]
async fn test_failing_or_missing_example_source_yields_nothing() {
    let request = TargetRequest::new(TargetSpec::Example(ExampleRequest { count: Some(3) }));

    let broken = MentionGraph::new(CannedStore::new(Vec::new()), MentionGraphConfig::default())
        .with_example_source(BrokenExamples);
    assert!(broken.get_mentions(&request).await.unwrap().is_empty());

    let missing = MentionGraph::new(CannedStore::new(Vec::new()), MentionGraphConfig::default());
    assert!(missing.get_mentions(&request).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// On-disk lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_open_before_init_fails() {
    let dir = TempDir::new().unwrap();
    assert!(MentionGraph::open(dir.path()).await.is_err());
}

#[tokio::test]
async fn test_init_store_and_resolve_end_to_end() {
    let dir = TempDir::new().unwrap();
    {
        let graph = MentionGraph::init(dir.path()).await.unwrap();
        let db = graph.store();
        let reply = db
            .upsert_entry(&NewEntry {
                url: "http://alice.example/reply".to_string(),
                published: Some("2024-01-01T00:00:00Z".to_string()),
                entry_type: None,
                data: json!({"name": "Alice's reply", "author": {"name": "Alice"}}),
            })
            .await
            .unwrap();
        let answer = db
            .upsert_entry(&NewEntry {
                url: "http://bob.example/answer".to_string(),
                published: Some("2024-01-02T00:00:00Z".to_string()),
                entry_type: None,
                data: json!({"name": "Bob's answer"}),
            })
            .await
            .unwrap();
        db.insert_mention(reply, "http://example.com/post", false).await.unwrap();
        db.insert_mention(answer, "http://alice.example/reply", false).await.unwrap();
    }

    let graph = MentionGraph::open(dir.path()).await.unwrap();
    let request: TargetRequest =
        serde_json::from_value(json!({"url": "http://example.com/post/", "sort": "asc"})).unwrap();
    let roots = graph.get_mentions(&request).await.unwrap();

    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0].mention.author.name.as_deref(), Some("Alice"));
    assert_eq!(roots[0].children()[0].mention.name.as_deref(), Some("Bob's answer"));

    let json = serde_json::to_value(&roots).unwrap();
    assert_eq!(json[0]["url"], "http://alice.example/reply");
    assert_eq!(json[0]["mentions"][0]["url"], "http://bob.example/answer");
    assert!(json[0].get("id").is_none());

    assert_eq!(
        graph
            .count_mentions(&TargetQuery::site("example.com"), InteractionFilter::Either)
            .await
            .unwrap(),
        1
    );
}

#[test]
fn test_init_logging_is_repeatable() {
    init_logging("mentiongraph=debug").unwrap();
    init_logging("mentiongraph=debug").unwrap();
}

#[test]
fn test_init_logging_from_config() {
    let config = MentionGraphConfig {
        log_filter: "mentiongraph=trace".to_string(),
        ..MentionGraphConfig::default()
    };
    init_logging_from_config(&config).unwrap();
}
