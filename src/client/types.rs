// src/client/types.rs
use serde::{Deserialize, Serialize};

pub type DocumentId = u64;

/// One entry of `GET /api/documents/`. Only the fields the sensor uses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentSummary {
    pub id: DocumentId,
    #[serde(default)]
    pub title: Option<String>,
    /// Kept as the server sent it; older servers send a datetime, newer a date.
    #[serde(default)]
    pub created: Option<String>,
}

/// `GET /api/documents/` body. `count` is the server-side total and the only
/// source for `documents_count`; `results` is just the first page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentListing {
    pub count: u64,
    #[serde(default)]
    pub results: Vec<DocumentSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CountOnly {
    pub count: u64,
}

/// Subset of `GET /api/status/` (admin only).
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ServerStatus {
    #[serde(default)]
    pub storage: Option<StorageStatus>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct StorageStatus {
    pub total: u64,
    pub available: u64,
}

impl StorageStatus {
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.available)
    }
}

/// Human size with one decimal, base 1024 (e.g. "5.2 GB").
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_tolerates_missing_results_and_extra_fields() {
        let body = r#"{"count": 3, "next": null, "all": [1,2,3]}"#;
        let l: DocumentListing = serde_json::from_str(body).unwrap();
        assert_eq!(l.count, 3);
        assert!(l.results.is_empty());
    }

    #[test]
    fn listing_requires_count() {
        let body = r#"{"results": [{"id": 1}]}"#;
        assert!(serde_json::from_str::<DocumentListing>(body).is_err());
    }

    #[test]
    fn human_size_picks_unit() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(1536), "1.5 KB");
        assert_eq!(human_size(5_583_457_485), "5.2 GB");
    }
}
