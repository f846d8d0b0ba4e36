use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::debug;

use crate::matching::normalize;
use crate::types::{Author, DistilledMention, RawMentionRow, MENTION_TYPE};

/// Payload keys copied into a distilled mention. Anything else is ignored.
pub const DISTILLED_FIELDS: &[&str] = &[
    "url",
    "name",
    "published",
    "summary",
    "author",
    "interactionType",
    "interactions",
];

/// Keys copied from the payload's `author` record.
pub const AUTHOR_FIELDS: &[&str] = &["name", "photo", "url"];

/// The whitelisted part of an entry payload.
#[derive(Debug, Default)]
struct MentionPayload {
    url: Option<String>,
    name: Option<String>,
    published: Option<String>,
    summary: Option<String>,
    author: Author,
    interaction_type: Option<String>,
    interactions: Vec<String>,
}

impl MentionPayload {
    /// Returns `None` unless `data` is a JSON object.
    fn from_value(data: &Value) -> Option<Self> {
        let object = data.as_object()?;
        let mut payload = MentionPayload::default();

        for &field in DISTILLED_FIELDS {
            let Some(value) = object.get(field) else {
                continue;
            };
            match field {
                "url" => payload.url = text(value),
                "name" => payload.name = text(value),
                "published" => payload.published = text(value),
                "summary" => payload.summary = text(value),
                "author" => payload.author = author(value),
                "interactionType" => payload.interaction_type = text(value),
                "interactions" => payload.interactions = text_list(value),
                _ => {}
            }
        }

        Some(payload)
    }
}

fn text(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

/// A string list; a lone string counts as a one-element list.
fn text_list(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn author(value: &Value) -> Author {
    let empty = Map::new();
    let object = value.as_object().unwrap_or(&empty);
    let mut author = Author::default();
    for &field in AUTHOR_FIELDS {
        let value = object.get(field).and_then(text);
        match field {
            "name" => author.name = value,
            "photo" => author.photo = value,
            "url" => author.url = value,
            _ => {}
        }
    }
    author
}

/// Projects a raw row into a distilled mention.
///
/// Returns `None` when the row has no payload object; such rows are skipped,
/// never reported as errors.
pub fn distill(row: &RawMentionRow) -> Option<DistilledMention> {
    let payload = MentionPayload::from_value(row.data.as_ref()?)?;

    let mention_type = row
        .mention_type
        .clone()
        .filter(|t| !t.is_empty())
        .or(payload.interaction_type)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| MENTION_TYPE.to_string());

    let targets = row.targets.clone();
    let interaction_target =
        has_interaction_target(&mention_type, &targets, &payload.interactions);

    let removed_targets = match &row.removed_targets {
        None => None,
        Some(None) => Some(Vec::new()),
        Some(Some(list)) => Some(list.clone()),
    };

    Some(DistilledMention {
        url: payload.url.unwrap_or_else(|| row.url.clone()),
        name: payload.name,
        published: payload.published,
        summary: payload.summary,
        author: payload.author,
        mention_type,
        interactions: payload.interactions,
        targets,
        removed_targets,
        interaction_target,
        id: row.id,
        parents: row.parents.clone(),
    })
}

/// Distills every row, dropping the ones without a payload.
pub fn distill_all(rows: &[RawMentionRow]) -> Vec<DistilledMention> {
    let mentions: Vec<DistilledMention> = rows.iter().filter_map(distill).collect();
    if mentions.len() != rows.len() {
        debug!(
            skipped = rows.len() - mentions.len(),
            "skipped rows without a payload"
        );
    }
    mentions
}

/// A mention is an interaction target when it is not a plain mention and at
/// least one of its targets is also one of its declared interactions.
pub fn has_interaction_target(mention_type: &str, targets: &[String], interactions: &[String]) -> bool {
    if mention_type == MENTION_TYPE || targets.is_empty() || interactions.is_empty() {
        return false;
    }
    let targets: HashSet<_> = targets.iter().map(|t| normalize(t)).collect();
    interactions.iter().any(|i| targets.contains(&normalize(i)))
}
