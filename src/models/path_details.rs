use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Metadata for a single path in a storage folder
///
/// Mirrors the mapping a managed-folder API answers for a path lookup. Only
/// `exists` and `directory` are guaranteed; the rest is filled in when the
/// backend knows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathDetails {
    pub exists: bool,
    #[serde(default)]
    pub directory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<PathDetails>,
}

impl PathDetails {
    /// Details for a path the backend does not know
    pub fn missing(full_path: &str) -> Self {
        Self {
            exists: false,
            directory: false,
            full_path: Some(full_path.to_string()),
            name: Some(base_name(full_path).to_string()),
            ..Default::default()
        }
    }

    pub fn file(full_path: &str, size: u64) -> Self {
        Self {
            exists: true,
            directory: false,
            full_path: Some(full_path.to_string()),
            name: Some(base_name(full_path).to_string()),
            size: Some(size),
            mime_type: Some(
                mime_guess::from_path(full_path)
                    .first_or_octet_stream()
                    .to_string(),
            ),
            ..Default::default()
        }
    }

    pub fn directory(full_path: &str, children: Vec<PathDetails>) -> Self {
        Self {
            exists: true,
            directory: true,
            full_path: Some(full_path.to_string()),
            name: Some(base_name(full_path).to_string()),
            children,
            ..Default::default()
        }
    }

    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    /// Parse the JSON mapping returned by a remote folder API
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value)
            .map_err(|e| Error::Storage(format!("Invalid path details: {}", e)))
    }
}

fn base_name(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_remote_mapping() {
        let value = serde_json::json!({
            "exists": true,
            "directory": false,
            "fullPath": "/reports/q1.csv",
            "name": "q1.csv",
            "size": 42,
            "lastModified": 1700000000000i64,
            "mimeType": "text/csv"
        });

        let details = PathDetails::from_value(value).unwrap();

        assert!(details.exists);
        assert!(!details.directory);
        assert_eq!(details.full_path.as_deref(), Some("/reports/q1.csv"));
        assert_eq!(details.size, Some(42));
        assert_eq!(
            details.last_modified.map(|t| t.timestamp_millis()),
            Some(1700000000000)
        );
    }

    #[test]
    fn test_minimal_mapping() {
        let details = PathDetails::from_value(serde_json::json!({ "exists": false })).unwrap();
        assert_eq!(details, PathDetails::default());
    }

    #[test]
    fn test_malformed_mapping() {
        let err = PathDetails::from_value(serde_json::json!({ "directory": "yes" })).unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[test]
    fn test_constructors() {
        let file = PathDetails::file("/a/b.png", 10);
        assert_eq!(file.name.as_deref(), Some("b.png"));
        assert_eq!(file.mime_type.as_deref(), Some("image/png"));

        let dir = PathDetails::directory("/a/", vec![file]);
        assert_eq!(dir.name.as_deref(), Some("a"));
        assert!(dir.directory);
        assert_eq!(dir.children.len(), 1);
    }
}
