use libsql::params::Params;
use libsql::Value;
use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use super::connection::Database;
use crate::errors::{MentionGraphError, Result};
use crate::matching::normalize;
use crate::query::{ClosureQuery, CountQuery, SqlValue};
use crate::store::MentionStore;
use crate::types::{NewEntry, RawMentionRow};

// ---------------------------------------------------------------------------
// Helpers: parameters and row decoding
// ---------------------------------------------------------------------------

fn to_params(values: &[SqlValue]) -> Params {
    Params::Positional(
        values
            .iter()
            .map(|v| match v {
                SqlValue::Text(s) => Value::Text(s.clone()),
            })
            .collect(),
    )
}

fn optional_text(value: Option<&str>) -> Value {
    match value {
        Some(s) => Value::Text(s.to_string()),
        None => Value::Null,
    }
}

fn db_error(operation: &str, what: &str, e: impl std::fmt::Display) -> MentionGraphError {
    MentionGraphError::Database {
        message: format!("{what}: {e}"),
        operation: operation.to_string(),
    }
}

/// Decodes a `json_group_array` of URLs, dropping nulls and repeats.
fn decode_url_list(raw: &str) -> Result<Vec<String>> {
    let items: Vec<JsonValue> = serde_json::from_str(raw)?;
    let mut urls: Vec<String> = Vec::with_capacity(items.len());
    for url in items.iter().filter_map(JsonValue::as_str) {
        if !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
    }
    Ok(urls)
}

/// Decodes a `json_group_array` of parent ids, dropping repeats.
fn decode_id_list(raw: &str) -> Result<Vec<i64>> {
    let items: Vec<JsonValue> = serde_json::from_str(raw)?;
    let mut ids: Vec<i64> = Vec::with_capacity(items.len());
    for id in items.iter().filter_map(JsonValue::as_i64) {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Maps one closure result row to a `RawMentionRow`.
fn row_to_raw_mention(row: &libsql::Row, tracks_removed: bool) -> Result<RawMentionRow> {
    let url: String = row.get(0)?;
    let data_text: Option<String> = row.get(1)?;
    let mention_type: Option<String> = row.get(2)?;
    let targets: String = row.get(3)?;
    let parents: String = row.get(4)?;
    let id: i64 = row.get(5)?;

    let data = match data_text {
        Some(text) => match serde_json::from_str::<JsonValue>(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(id, error = %e, "entry payload is not valid JSON");
                None
            }
        },
        None => None,
    };

    let removed_targets = if tracks_removed {
        let removed: Option<String> = row.get(6)?;
        Some(match removed {
            Some(text) => Some(decode_url_list(&text)?),
            None => None,
        })
    } else {
        None
    };

    Ok(RawMentionRow {
        url,
        data,
        mention_type,
        targets: decode_url_list(&targets)?,
        removed_targets,
        parents: decode_id_list(&parents)?,
        id,
    })
}

// ---------------------------------------------------------------------------
// Entry and mention writes
// ---------------------------------------------------------------------------

impl Database {
    /// Inserts an entry, or updates the one with the same canonical URL, and
    /// returns its id.
    pub async fn upsert_entry(&self, entry: &NewEntry) -> Result<i64> {
        let normalized = normalize(&entry.url).into_string();
        let data = serde_json::to_string(&entry.data)?;

        self.conn()
            .execute(
                "INSERT INTO entries (url, normalized_url, published, type, data)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(normalized_url) DO UPDATE SET
                    url = excluded.url,
                    published = excluded.published,
                    type = excluded.type,
                    data = excluded.data",
                Params::Positional(vec![
                    Value::Text(entry.url.clone()),
                    Value::Text(normalized.clone()),
                    optional_text(entry.published.as_deref()),
                    optional_text(entry.entry_type.as_deref()),
                    Value::Text(data),
                ]),
            )
            .await
            .map_err(|e| db_error("upsert_entry", "failed to upsert entry", e))?;

        self.get_entry_id(&entry.url)
            .await?
            .ok_or_else(|| MentionGraphError::Database {
                message: format!("entry '{normalized}' missing after upsert"),
                operation: "upsert_entry".to_string(),
            })
    }

    /// Looks up an entry id by URL, comparing canonical forms.
    pub async fn get_entry_id(&self, url: &str) -> Result<Option<i64>> {
        let normalized = normalize(url).into_string();
        let mut rows = self
            .conn()
            .query(
                "SELECT id FROM entries WHERE normalized_url = ?1",
                Params::Positional(vec![Value::Text(normalized)]),
            )
            .await
            .map_err(|e| db_error("get_entry_id", "failed to query entry", e))?;

        match rows
            .next()
            .await
            .map_err(|e| db_error("get_entry_id", "failed to read entry row", e))?
        {
            Some(row) => Ok(Some(row.get::<i64>(0)?)),
            None => Ok(None),
        }
    }

    /// Records that entry `eid` links to `url`. Re-adding a removed mention
    /// revives it.
    pub async fn insert_mention(&self, eid: i64, url: &str, interaction: bool) -> Result<()> {
        let normalized = normalize(url);
        let hostname = normalized.hostname();

        self.conn()
            .execute(
                "INSERT INTO mentions (url, normalized_url, hostname, eid, interaction, removed)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0)
                 ON CONFLICT(normalized_url, eid) DO UPDATE SET
                    url = excluded.url,
                    hostname = excluded.hostname,
                    interaction = excluded.interaction,
                    removed = 0",
                Params::Positional(vec![
                    Value::Text(url.to_string()),
                    Value::Text(normalized.into_string()),
                    optional_text(hostname.as_deref()),
                    Value::Integer(eid),
                    Value::Integer(i64::from(interaction)),
                ]),
            )
            .await
            .map_err(|e| db_error("insert_mention", "failed to insert mention", e))?;
        Ok(())
    }

    /// Flags the mention of `url` by entry `eid` as removed.
    pub async fn mark_mention_removed(&self, eid: i64, url: &str) -> Result<()> {
        self.conn()
            .execute(
                "UPDATE mentions SET removed = 1 WHERE eid = ?1 AND normalized_url = ?2",
                Params::Positional(vec![
                    Value::Integer(eid),
                    Value::Text(normalize(url).into_string()),
                ]),
            )
            .await
            .map_err(|e| db_error("mark_mention_removed", "failed to mark mention removed", e))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Closure and count reads
// ---------------------------------------------------------------------------

impl Database {
    /// Runs a closure query and decodes every resulting row.
    pub async fn fetch_closure(&self, query: &ClosureQuery) -> Result<Vec<RawMentionRow>> {
        let mut rows = self
            .conn()
            .query(&query.sql, to_params(&query.params))
            .await
            .map_err(|e| db_error("fetch_closure", "failed to run closure query", e))?;

        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| db_error("fetch_closure", "failed to read closure row", e))?
        {
            out.push(row_to_raw_mention(&row, query.tracks_removed)?);
        }

        debug!(rows = out.len(), "fetched mention closure");
        Ok(out)
    }

    /// Runs a count query.
    pub async fn count(&self, query: &CountQuery) -> Result<u64> {
        let mut rows = self
            .conn()
            .query(&query.sql, to_params(&query.params))
            .await
            .map_err(|e| db_error("count", "failed to run count query", e))?;

        let count = match rows
            .next()
            .await
            .map_err(|e| db_error("count", "failed to read count row", e))?
        {
            Some(row) => row.get::<i64>(0)?,
            None => 0,
        };
        Ok(count.max(0) as u64)
    }
}

impl MentionStore for Database {
    async fn fetch_mention_rows(&self, query: &ClosureQuery) -> Result<Vec<RawMentionRow>> {
        self.fetch_closure(query).await
    }

    async fn count_mentions(&self, query: &CountQuery) -> Result<u64> {
        self.count(query).await
    }
}
