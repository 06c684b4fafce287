//! ForgeHub Metadata Store
//!
//! Durable keyed storage for cached dataset metadata, backed by a local
//! SQLite file. Three operations: point `get`, `list_all`, and `upsert`.
//!
//! # Safety
//!
//! `rusqlite::Connection` is !Send and must never be held across `.await`
//! points. Every operation opens its own connection inside
//! `tokio::task::spawn_blocking` and closes it before returning.

use chrono::{DateTime, Utc};
use forgehub_core::{
    encode_files, encode_splits, init_store_schema, DatasetRecord, HubError, Result,
};
use rusqlite::{Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// SQLite-backed store of one [`DatasetRecord`] per dataset identity.
///
/// Cheap to clone; concurrent upserts to the same identity resolve
/// last-write-wins, which is sound because each refresh writes a full,
/// self-consistent snapshot of upstream state.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    /// Open (or create) the store at `path` and initialize its schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = Self::connect(&path)?;
        drop(conn);

        tracing::debug!(path = %path.display(), "opened metadata store");
        Ok(Self { path })
    }

    /// Path of the underlying SQLite file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn connect(path: &Path) -> Result<Connection> {
        let conn = Connection::open(path)?;
        // Tolerate concurrent writers on the same file.
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        init_store_schema(&conn)?;
        Ok(conn)
    }

    /// Point lookup by dataset identity. Never mutates.
    pub async fn get(&self, id: &str) -> Result<Option<DatasetRecord>> {
        let path = self.path.clone();
        let id = id.to_string();

        tokio::task::spawn_blocking(move || {
            let conn = Self::connect(&path)?;
            let record = conn
                .query_row(
                    "SELECT id, commit_hash, splits, files, dataset_info, updated_at
                     FROM datasets WHERE id = ?1",
                    [&id],
                    row_to_record,
                )
                .optional()?;
            Ok(record)
        })
        .await
        .map_err(|e| HubError::Other(format!("task join error: {}", e)))?
    }

    /// Full listing of all cached records. Ordering is unspecified.
    pub async fn list_all(&self) -> Result<Vec<DatasetRecord>> {
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || {
            let conn = Self::connect(&path)?;
            let mut stmt = conn.prepare(
                "SELECT id, commit_hash, splits, files, dataset_info, updated_at FROM datasets",
            )?;
            let records = stmt
                .query_map([], row_to_record)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(records)
        })
        .await
        .map_err(|e| HubError::Other(format!("task join error: {}", e)))?
    }

    /// Insert or fully replace the record for `id`.
    ///
    /// Canonical encodings are computed before the write: splits sorted and
    /// deduplicated, files sorted, empty collections stored as NULL.
    /// `updated_at` is set to the current time at the moment of write. The
    /// whole replace is one statement, so a record is never partially
    /// written.
    pub async fn upsert(
        &self,
        id: &str,
        commit_hash: Option<String>,
        splits: Vec<String>,
        files: Vec<String>,
        dataset_info: Option<String>,
    ) -> Result<DatasetRecord> {
        let encoded_splits = encode_splits(&splits)?;
        let encoded_files = encode_files(&files)?;
        let updated_at = Utc::now();

        let record = DatasetRecord {
            id: id.to_string(),
            commit_hash,
            splits: encoded_splits,
            files: encoded_files,
            dataset_info,
            updated_at,
        };

        let path = self.path.clone();
        let stored = record.clone();
        tokio::task::spawn_blocking(move || {
            let conn = Self::connect(&path)?;
            conn.execute(
                "INSERT INTO datasets (id, commit_hash, splits, files, dataset_info, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(id) DO UPDATE SET
                   commit_hash = excluded.commit_hash,
                   splits = excluded.splits,
                   files = excluded.files,
                   dataset_info = excluded.dataset_info,
                   updated_at = excluded.updated_at",
                rusqlite::params![
                    stored.id,
                    stored.commit_hash,
                    stored.splits,
                    stored.files,
                    stored.dataset_info,
                    stored.updated_at.to_rfc3339(),
                ],
            )?;
            Ok::<_, HubError>(())
        })
        .await
        .map_err(|e| HubError::Other(format!("task join error: {}", e)))??;

        tracing::debug!(id = %record.id, commit = ?record.commit_hash, "upserted dataset record");
        Ok(record)
    }
}

/// Map one `datasets` row into a record.
fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<DatasetRecord> {
    let updated_at: String = row.get(5)?;
    let updated_at = updated_at
        .parse::<DateTime<Utc>>()
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;

    Ok(DatasetRecord {
        id: row.get(0)?,
        commit_hash: row.get(1)?,
        splits: row.get(2)?,
        files: row.get(3)?,
        dataset_info: row.get(4)?,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store(dir: &TempDir) -> MetadataStore {
        MetadataStore::open(dir.path().join("cache.db")).unwrap()
    }

    fn paths(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        assert!(store.get("acme/widgets").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_then_get_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        store
            .upsert(
                "acme/widgets",
                Some("abc123".to_string()),
                paths(&["train", "test", "train"]),
                paths(&["train/a.csv", "test/b.csv"]),
                Some("{}".to_string()),
            )
            .await
            .unwrap();

        let record = store.get("acme/widgets").await.unwrap().unwrap();
        assert_eq!(record.commit_hash.as_deref(), Some("abc123"));
        assert_eq!(record.splits.as_deref(), Some(r#"["test","train"]"#));
        assert_eq!(
            record.files.as_deref(),
            Some(r#"["test/b.csv","train/a.csv"]"#)
        );
        assert_eq!(record.dataset_info.as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn test_upsert_empty_collections_stored_absent() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let record = store
            .upsert("acme/empty", None, Vec::new(), Vec::new(), None)
            .await
            .unwrap();
        assert!(record.splits.is_none());
        assert!(record.files.is_none());

        // Read back decodes to empty sequences, not an error.
        let stored = store.get("acme/empty").await.unwrap().unwrap();
        assert!(stored.splits.is_none());
        assert!(stored.files.is_none());
        let view = forgehub_core::MetadataView::from_record(&stored).unwrap();
        assert!(view.splits.is_empty());
        assert!(view.files.is_empty());
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_for_unchanged_tree() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        // Same tree presented twice, in different input order.
        let first = store
            .upsert(
                "acme/widgets",
                Some("abc123".to_string()),
                paths(&["train", "test"]),
                paths(&["train/a.csv", "test/b.csv"]),
                None,
            )
            .await
            .unwrap();
        let second = store
            .upsert(
                "acme/widgets",
                Some("abc123".to_string()),
                paths(&["test", "train", "test"]),
                paths(&["test/b.csv", "train/a.csv"]),
                None,
            )
            .await
            .unwrap();

        assert_eq!(first.splits, second.splits);
        assert_eq!(first.files, second.files);
    }

    #[tokio::test]
    async fn test_upsert_fully_replaces_prior_record() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        store
            .upsert(
                "acme/widgets",
                Some("old".to_string()),
                paths(&["train"]),
                paths(&["train/a.csv"]),
                Some("old info".to_string()),
            )
            .await
            .unwrap();

        // Second refresh dropped the info file and the split.
        store
            .upsert(
                "acme/widgets",
                Some("new".to_string()),
                Vec::new(),
                paths(&["readme.md"]),
                None,
            )
            .await
            .unwrap();

        let record = store.get("acme/widgets").await.unwrap().unwrap();
        assert_eq!(record.commit_hash.as_deref(), Some("new"));
        assert!(record.splits.is_none());
        assert_eq!(record.files.as_deref(), Some(r#"["readme.md"]"#));
        assert!(record.dataset_info.is_none());
    }

    #[tokio::test]
    async fn test_list_all_returns_every_record() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        store
            .upsert("acme/widgets", None, Vec::new(), Vec::new(), None)
            .await
            .unwrap();
        store
            .upsert("acme/gadgets", None, Vec::new(), Vec::new(), None)
            .await
            .unwrap();

        let mut ids: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        // No ordering guarantee; sort before asserting.
        ids.sort();
        assert_eq!(ids, vec!["acme/gadgets", "acme/widgets"]);
    }

    #[tokio::test]
    async fn test_concurrent_upserts_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let store = test_store(&dir);

        let a = store.clone();
        let b = store.clone();
        let (ra, rb) = tokio::join!(
            a.upsert("acme/widgets", Some("a".to_string()), Vec::new(), Vec::new(), None),
            b.upsert("acme/widgets", Some("b".to_string()), Vec::new(), Vec::new(), None),
        );
        ra.unwrap();
        rb.unwrap();

        // One of the two snapshots won wholesale.
        let record = store.get("acme/widgets").await.unwrap().unwrap();
        assert!(matches!(record.commit_hash.as_deref(), Some("a") | Some("b")));
    }
}
