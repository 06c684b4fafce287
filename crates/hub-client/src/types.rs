//! Response types for the forge REST API.

use serde::{Deserialize, Serialize};

/// A recursive tree listing of one repository revision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeResponse {
    /// Hash identifying the tree (commit/tree sha).
    pub sha: Option<String>,
    /// Flat list of entries; directories included with type `"tree"`.
    #[serde(default)]
    pub tree: Vec<TreeEntry>,
}

/// One entry of a tree listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Full relative path within the repository.
    pub path: String,
    /// Entry type as reported by the forge (`"blob"`, `"tree"`, ...).
    #[serde(rename = "type")]
    pub entry_type: String,
}

impl TreeEntry {
    /// Whether this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.entry_type == "tree"
    }
}

/// JSON envelope of the contents endpoint: the file body arrives
/// base64-encoded.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentsResponse {
    /// Base64-encoded file content; may be absent for non-file entries.
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree_entry_type_field_renamed() {
        let entry: TreeEntry =
            serde_json::from_str(r#"{"path": "train/a.csv", "type": "blob"}"#).unwrap();
        assert_eq!(entry.path, "train/a.csv");
        assert!(!entry.is_dir());

        let dir: TreeEntry = serde_json::from_str(r#"{"path": "train", "type": "tree"}"#).unwrap();
        assert!(dir.is_dir());
    }

    #[test]
    fn test_tree_response_missing_tree_defaults_empty() {
        let tree: TreeResponse = serde_json::from_str(r#"{"sha": "abc"}"#).unwrap();
        assert_eq!(tree.sha.as_deref(), Some("abc"));
        assert!(tree.tree.is_empty());
    }
}
