use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Parent id marking a mention as a direct child of the entry.
pub const ROOT_PARENT: i64 = 0;

/// Type given to mentions that carry no explicit type.
pub const MENTION_TYPE: &str = "mention";

/// Entry types treated as interactions unless configured otherwise.
pub const DEFAULT_INTERACTION_TYPES: &[&str] = &["like", "repost"];

// ---------------------------------------------------------------------------
// Request options
// ---------------------------------------------------------------------------

/// Publication-time ordering of resolved mentions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[allow(clippy::should_implement_trait)]
impl SortOrder {
    /// Returns the SQL keyword for this ordering.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    /// Parses `asc`/`desc` (any case), returning `None` for anything else.
    pub fn from_str(s: &str) -> Option<SortOrder> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Whether interaction mentions (likes, reposts, ...) are wanted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum InteractionFilter {
    /// Only interactions.
    Required,
    /// Everything except interactions.
    Excluded,
    #[default]
    Either,
}

impl InteractionFilter {
    /// Maps the wire flag: `true` requires, `false` excludes, absent allows both.
    pub fn from_flag(flag: Option<bool>) -> Self {
        match flag {
            Some(true) => InteractionFilter::Required,
            Some(false) => InteractionFilter::Excluded,
            None => InteractionFilter::Either,
        }
    }
}

/// Execution options accompanying a target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    pub interactions: InteractionFilter,
    /// Narrow each mention's `targets` to the values matching the target.
    pub distill_targets: bool,
    pub sort: SortOrder,
}

// ---------------------------------------------------------------------------
// Targets and requests
// ---------------------------------------------------------------------------

/// Matching criteria for a resolution: exact URLs, hostnames and path prefixes.
///
/// Each field accepts a single string or a list of strings on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetQuery {
    #[serde(default, deserialize_with = "one_or_many")]
    pub url: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub site: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub path: Vec<String>,
}

impl TargetQuery {
    /// Shorthand for `{url: <url>}`.
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: vec![url.into()],
            ..Self::default()
        }
    }

    pub fn site(site: impl Into<String>) -> Self {
        Self {
            site: vec![site.into()],
            ..Self::default()
        }
    }

    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: vec![path.into()],
            ..Self::default()
        }
    }

    /// Returns `true` when no class carries a non-blank value.
    pub fn is_empty(&self) -> bool {
        [&self.url, &self.site, &self.path]
            .iter()
            .all(|values| values.iter().all(|v| v.trim().is_empty()))
    }
}

/// Request for generated example mentions instead of stored ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExampleRequest {
    /// Number of mentions to generate; `None` uses the configured default.
    pub count: Option<usize>,
}

/// What a resolution is asked to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSpec {
    Normal(TargetQuery),
    Example(ExampleRequest),
}

/// A target together with its execution options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRequest {
    pub target: TargetSpec,
    pub options: ResolveOptions,
}

impl TargetRequest {
    pub fn new(target: TargetSpec) -> Self {
        Self {
            target,
            options: ResolveOptions::default(),
        }
    }

    /// Request for every mention of a single URL.
    pub fn for_url(url: impl Into<String>) -> Self {
        Self::new(TargetSpec::Normal(TargetQuery::url(url)))
    }

    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TargetInput {
    Url(String),
    Record(TargetRecord),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExampleFlag {
    Enabled(bool),
    Count(usize),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetRecord {
    #[serde(default, deserialize_with = "one_or_many")]
    url: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    site: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    path: Vec<String>,
    #[serde(default)]
    interactions: Option<bool>,
    #[serde(default)]
    distill_targets: bool,
    #[serde(default)]
    sort: Option<SortOrder>,
    #[serde(default)]
    example: Option<ExampleFlag>,
}

impl<'de> Deserialize<'de> for TargetRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = match TargetInput::deserialize(deserializer)? {
            TargetInput::Url(url) => return Ok(TargetRequest::for_url(url)),
            TargetInput::Record(record) => record,
        };

        let options = ResolveOptions {
            interactions: InteractionFilter::from_flag(record.interactions),
            distill_targets: record.distill_targets,
            sort: record.sort.unwrap_or_default(),
        };

        let example = match record.example {
            Some(ExampleFlag::Enabled(true)) => Some(ExampleRequest { count: None }),
            Some(ExampleFlag::Count(count)) if count > 0 => Some(ExampleRequest {
                count: Some(count),
            }),
            _ => None,
        };

        let target = match example {
            Some(request) => TargetSpec::Example(request),
            None => TargetSpec::Normal(TargetQuery {
                url: record.url,
                site: record.site,
                path: record.path,
            }),
        };

        Ok(TargetRequest { target, options })
    }
}

/// Accepts `null`, a single string, or a list of strings.
fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(value)) => vec![value],
        Some(OneOrMany::Many(values)) => values,
    })
}

/// Distinguishes an explicit `null` from a missing field.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Mentions
// ---------------------------------------------------------------------------

/// A row returned by the store for one mentioning entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMentionRow {
    #[serde(default)]
    pub url: String,
    /// Freeform entry payload.
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default, rename = "type")]
    pub mention_type: Option<String>,
    /// URLs this entry currently links to within the resolved closure.
    #[serde(default)]
    pub targets: Vec<String>,
    /// `None` when removals are not tracked, `Some(None)` for an explicit
    /// null, `Some(Some(list))` otherwise.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub removed_targets: Option<Option<Vec<String>>>,
    /// Entry ids this mention hangs under; `ROOT_PARENT` means the entry itself.
    #[serde(default)]
    pub parents: Vec<i64>,
    pub id: i64,
}

/// Author card attached to a mention.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A mention projected into canonical shape, still carrying the `id` and
/// `parents` needed to assemble trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistilledMention {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub author: Author,
    #[serde(rename = "type")]
    pub mention_type: String,
    #[serde(default)]
    pub interactions: Vec<String>,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed_targets: Option<Vec<String>>,
    #[serde(default)]
    pub interaction_target: bool,
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub parents: Vec<i64>,
}

/// A mention as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Mention {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub author: Author,
    #[serde(rename = "type")]
    pub mention_type: String,
    pub interactions: Vec<String>,
    pub targets: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed_targets: Option<Vec<String>>,
    pub interaction_target: bool,
}

impl From<&DistilledMention> for Mention {
    fn from(m: &DistilledMention) -> Self {
        Mention {
            url: m.url.clone(),
            name: m.name.clone(),
            published: m.published.clone(),
            summary: m.summary.clone(),
            author: m.author.clone(),
            mention_type: m.mention_type.clone(),
            interactions: m.interactions.clone(),
            targets: m.targets.clone(),
            removed_targets: m.removed_targets.clone(),
            interaction_target: m.interaction_target,
        }
    }
}

/// A mention together with the mentions that reply to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentionNode {
    #[serde(flatten)]
    pub mention: Mention,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentions: Option<Vec<MentionNode>>,
}

impl MentionNode {
    /// Child trees, empty when the node has none.
    pub fn children(&self) -> &[MentionNode] {
        self.mentions.as_deref().unwrap_or(&[])
    }
}

// ---------------------------------------------------------------------------
// Store records
// ---------------------------------------------------------------------------

/// An entry to be written to the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEntry {
    pub url: String,
    pub published: Option<String>,
    pub entry_type: Option<String>,
    pub data: Value,
}
