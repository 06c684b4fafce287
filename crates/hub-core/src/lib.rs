//! ForgeHub Core
//!
//! Core types, error taxonomy, and SQLite schema for the ForgeHub dataset
//! metadata cache. Shared by the store, the forge client, and the API server.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Top-level directories that never contribute a split.
pub const RESERVED_DIRS: [&str; 2] = [".git", "lfs"];

/// Conventional name of the dataset metadata document fetched on refresh.
pub const DATASET_INFO_FILE: &str = "dataset_info.json";

/// A cached metadata record for one dataset, as stored in SQLite.
///
/// `splits` and `files` hold canonical JSON array encodings (sorted,
/// deduplicated); `None` means "no information", never an empty array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRecord {
    /// Dataset identity, `owner/name`.
    pub id: String,
    /// Most recently observed upstream tree hash, if any.
    pub commit_hash: Option<String>,
    /// Canonical JSON array of split names.
    pub splits: Option<String>,
    /// Canonical JSON array of file paths.
    pub files: Option<String>,
    /// Verbatim content of `dataset_info.json`, if present upstream.
    pub dataset_info: Option<String>,
    /// Timestamp of the last successful refresh.
    pub updated_at: DateTime<Utc>,
}

/// Decoded read model returned by the API over a [`DatasetRecord`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataView {
    pub id: String,
    pub commit_hash: Option<String>,
    pub splits: Vec<String>,
    pub files: Vec<String>,
    pub dataset_info: Option<String>,
    /// ISO-8601 timestamp of the last successful refresh.
    pub updated_at: String,
}

impl MetadataView {
    /// Decode a stored record into its view form.
    ///
    /// Absent `splits`/`files` decode to empty sequences; the store's
    /// empty-to-absent normalization is not distinguishable on read.
    pub fn from_record(record: &DatasetRecord) -> Result<Self> {
        Ok(Self {
            id: record.id.clone(),
            commit_hash: record.commit_hash.clone(),
            splits: decode_paths(record.splits.as_deref())?,
            files: decode_paths(record.files.as_deref())?,
            dataset_info: record.dataset_info.clone(),
            updated_at: record.updated_at.to_rfc3339(),
        })
    }
}

/// Errors that can occur in core and store operations.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("dataset not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

/// Result type for core and store operations.
pub type Result<T> = std::result::Result<T, HubError>;

/// Encode split names canonically: sorted, deduplicated, empty becomes `None`.
pub fn encode_splits(splits: &[String]) -> Result<Option<String>> {
    let unique: BTreeSet<&str> = splits.iter().map(String::as_str).collect();
    if unique.is_empty() {
        return Ok(None);
    }
    let sorted: Vec<&str> = unique.into_iter().collect();
    Ok(Some(serde_json::to_string(&sorted)?))
}

/// Encode file paths canonically: sorted, empty becomes `None`.
pub fn encode_files(files: &[String]) -> Result<Option<String>> {
    if files.is_empty() {
        return Ok(None);
    }
    let mut sorted: Vec<&str> = files.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    Ok(Some(serde_json::to_string(&sorted)?))
}

/// Decode a stored JSON array; `None` decodes to an empty sequence.
pub fn decode_paths(encoded: Option<&str>) -> Result<Vec<String>> {
    match encoded {
        Some(raw) => Ok(serde_json::from_str(raw)?),
        None => Ok(Vec::new()),
    }
}

/// The split a file path contributes, if any.
///
/// Root-level files (no path separator) contribute no split, and reserved
/// directories (`.git`, `lfs`) are excluded.
pub fn split_for_path(path: &str) -> Option<&str> {
    let (first, _) = path.split_once('/')?;
    if RESERVED_DIRS.contains(&first) {
        return None;
    }
    Some(first)
}

/// Derive the split names contributed by a set of file paths.
///
/// The result may contain duplicates; the store's canonical encoding
/// deduplicates on write.
pub fn derive_splits(files: &[String]) -> Vec<String> {
    files
        .iter()
        .filter_map(|path| split_for_path(path))
        .map(str::to_string)
        .collect()
}

/// Initialize the SQLite schema for the metadata cache.
///
/// Creates the single `datasets` table if it does not exist. Safe to call on
/// every connection open.
pub fn init_store_schema(conn: &rusqlite::Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS datasets (
          id TEXT PRIMARY KEY,
          commit_hash TEXT,
          splits TEXT,
          files TEXT,
          dataset_info TEXT,
          updated_at TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}
