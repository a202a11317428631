// src/client/mod.rs
pub mod http;
pub mod types;

pub use http::PaperlessClient;
pub use types::{human_size, DocumentId, DocumentListing, DocumentSummary};

use crate::status::PollFailure;

/// What the poller needs from a Paperless server.
///
/// Only `list_documents` can fail the poll. The rest are best-effort and
/// collapse every failure to `None`.
#[async_trait::async_trait]
pub trait PaperlessApi: Send + Sync {
    async fn list_documents(&self) -> Result<DocumentListing, PollFailure>;

    /// Base64 preview image for one document.
    async fn fetch_preview(&self, id: DocumentId) -> Option<String>;

    async fn untagged_count(&self) -> Option<u64> {
        None
    }

    async fn storage_used(&self) -> Option<String> {
        None
    }
}
