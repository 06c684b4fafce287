//! Dataset service: refresh/read orchestration over the forge client and
//! the metadata store.

use crate::error::ApiError;
use forgehub_client::SharedForgeClient;
use forgehub_core::{derive_splits, MetadataView, DATASET_INFO_FILE};
use forgehub_store::MetadataStore;

/// Orchestrates the forge client and metadata store.
///
/// Dependency-injected and cheap to clone; one instance is shared across
/// request handlers.
#[derive(Clone)]
pub struct DatasetService {
    forge: SharedForgeClient,
    store: MetadataStore,
}

impl DatasetService {
    /// Create a service over an existing client and store.
    pub fn new(forge: SharedForgeClient, store: MetadataStore) -> Self {
        Self { forge, store }
    }

    /// Refresh one dataset from upstream and persist the derived metadata.
    ///
    /// The tree fetch is fail-fast: its upstream error propagates untouched.
    /// The `dataset_info.json` fetch is best-effort; a 404 is absorbed by
    /// the client, and any other failure degrades to an absent document
    /// rather than aborting an otherwise complete snapshot.
    pub async fn refresh(
        &self,
        owner: &str,
        dataset: &str,
        revision: &str,
        token: Option<&str>,
    ) -> Result<MetadataView, ApiError> {
        let id = dataset_id(owner, dataset);
        let tree = self.forge.get_tree(owner, dataset, revision, token).await?;

        let files: Vec<String> = tree
            .tree
            .iter()
            .filter(|entry| !entry.is_dir())
            .map(|entry| entry.path.clone())
            .collect();
        let splits = derive_splits(&files);

        let dataset_info = match self
            .forge
            .get_file_content(owner, dataset, DATASET_INFO_FILE, revision, token)
            .await
        {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(id = %id, error = %e, "dataset info fetch failed, continuing without it");
                None
            }
        };

        let record = self
            .store
            .upsert(&id, tree.sha, splits, files, dataset_info)
            .await?;

        tracing::info!(id = %id, revision = %revision, files = record.files.is_some(), "refreshed dataset");
        Ok(MetadataView::from_record(&record)?)
    }

    /// Point lookup of the cached record; `None` if never refreshed.
    pub async fn get_cached(
        &self,
        owner: &str,
        dataset: &str,
    ) -> Result<Option<MetadataView>, ApiError> {
        let id = dataset_id(owner, dataset);
        match self.store.get(&id).await? {
            Some(record) => Ok(Some(MetadataView::from_record(&record)?)),
            None => Ok(None),
        }
    }

    /// All cached records, decoded. Ordering is unspecified.
    pub async fn list_cached(&self) -> Result<Vec<MetadataView>, ApiError> {
        self.store
            .list_all()
            .await?
            .iter()
            .map(|record| MetadataView::from_record(record).map_err(ApiError::from))
            .collect()
    }
}

/// The composite `owner/name` dataset identity.
pub fn dataset_id(owner: &str, dataset: &str) -> String {
    format!("{}/{}", owner, dataset)
}
