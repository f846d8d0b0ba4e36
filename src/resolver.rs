use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::{get_database_path, load_config, save_config, MentionGraphConfig};
use crate::db::Database;
use crate::errors::{MentionGraphError, Result};
use crate::matching::TargetMatcher;
use crate::mentions::{assemble, distill_all, distill_targets, normalize_removed_targets};
use crate::query::ClosureQueryBuilder;
use crate::store::{ExampleSource, MentionStore};
use crate::types::*;

/// Central orchestrator: turns a target request into mention trees.
///
/// Holds no per-request state, so one instance can serve concurrent requests.
pub struct MentionGraph<S> {
    store: S,
    config: MentionGraphConfig,
    builder: ClosureQueryBuilder,
    examples: Option<Box<dyn ExampleSource + Send + Sync>>,
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

impl<S: MentionStore> MentionGraph<S> {
    pub fn new(store: S, config: MentionGraphConfig) -> Self {
        let builder = ClosureQueryBuilder::from_config(&config);
        Self {
            store,
            config,
            builder,
            examples: None,
        }
    }

    /// Serves requests flagged as examples from `source`.
    pub fn with_example_source(mut self, source: impl ExampleSource + Send + Sync + 'static) -> Self {
        self.examples = Some(Box::new(source));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a reference to the current configuration.
    pub fn get_config(&self) -> &MentionGraphConfig {
        &self.config
    }
}

impl MentionGraph<Database> {
    /// Writes a default configuration under `project_root` and creates an
    /// empty database next to it.
    pub async fn init(project_root: &Path) -> Result<Self> {
        let config = MentionGraphConfig::default();
        save_config(project_root, &config)?;
        let db = Database::initialize(&get_database_path(project_root, &config)).await?;
        Ok(Self::new(db, config))
    }

    /// Opens the configuration and database under `project_root`.
    pub async fn open(project_root: &Path) -> Result<Self> {
        let config = load_config(project_root)?;
        let db_path: PathBuf = get_database_path(project_root, &config);
        if !db_path.exists() {
            return Err(MentionGraphError::Config {
                message: format!(
                    "no mention database found at '{}'; initialize it first",
                    db_path.display()
                ),
            });
        }
        let db = Database::open(&db_path).await?;
        Ok(Self::new(db, config))
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

impl<S: MentionStore> MentionGraph<S> {
    /// Resolves a request into root mention trees.
    ///
    /// Example requests are served by the example source; a missing source
    /// or a failing one yields an empty list. Normal requests with nothing
    /// to match yield an empty list without touching the store.
    pub async fn get_mentions(&self, request: &TargetRequest) -> Result<Vec<MentionNode>> {
        let mentions = match &request.target {
            TargetSpec::Example(example) => self.example_mentions(example, &request.options),
            TargetSpec::Normal(query) => self.get_distilled_mentions(query, &request.options).await?,
        };
        Ok(assemble(&mentions))
    }

    /// Resolves a target into flat distilled mentions, in the requested
    /// publication order, still carrying their ids and parents.
    pub async fn get_distilled_mentions(
        &self,
        query: &TargetQuery,
        options: &ResolveOptions,
    ) -> Result<Vec<DistilledMention>> {
        let Some(closure) = self.builder.build(query, options) else {
            debug!("target has no usable url, site or path; returning no mentions");
            return Ok(Vec::new());
        };

        let rows = self.store.fetch_mention_rows(&closure).await?;
        let mut mentions: Vec<DistilledMention> = distill_all(&rows)
            .into_iter()
            .map(normalize_removed_targets)
            .collect();

        if options.distill_targets {
            let matcher = TargetMatcher::new(query);
            mentions = mentions
                .iter()
                .map(|m| distill_targets(m, &matcher))
                .collect();
        }

        debug!(rows = rows.len(), mentions = mentions.len(), "resolved mentions");
        Ok(mentions)
    }

    /// Counts the entries directly mentioning a target.
    pub async fn count_mentions(
        &self,
        query: &TargetQuery,
        interactions: InteractionFilter,
    ) -> Result<u64> {
        match self.builder.build_count(query, interactions) {
            Some(count) => self.store.count_mentions(&count).await,
            None => Ok(0),
        }
    }

    fn example_mentions(
        &self,
        example: &ExampleRequest,
        options: &ResolveOptions,
    ) -> Vec<DistilledMention> {
        let Some(source) = &self.examples else {
            debug!("example requested but no example source configured");
            return Vec::new();
        };

        let count = example.count.unwrap_or(self.config.example_count);
        match source.generate(count, options) {
            Ok(mentions) => mentions,
            Err(e) => {
                warn!(error = %e, "example source failed; returning no mentions");
                Vec::new()
            }
        }
    }
}
