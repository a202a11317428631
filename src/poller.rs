//! The status-polling state machine.
//!
//! `Poller::poll` performs one bounded round trip against the documents
//! endpoint, folds the outcome into a caller-owned [`SensorState`], and
//! announces documents that were not present on the previous successful
//! poll. It never returns an error: every failure ends up as a status.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;

use crate::change_detector::NewDocumentEvent;
use crate::client::{DocumentListing, DocumentSummary, PaperlessApi};
use crate::notify::NotifierMux;
use crate::status::{PollFailure, PollResult, SensorState};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("paperless_polls_total", "Polls by resulting status.");
        describe_counter!(
            "paperless_new_documents_total",
            "Documents announced as new."
        );
        describe_counter!(
            "paperless_preview_failures_total",
            "New documents announced without a preview."
        );
        describe_counter!(
            "paperless_notify_errors_total",
            "Notifier channel failures."
        );
        describe_gauge!("paperless_documents_count", "Last reported document total.");
        describe_histogram!("paperless_poll_ms", "Poll round trip in milliseconds.");
    });
}

pub struct Poller<A> {
    api: A,
    notifier: Arc<NotifierMux>,
    fetch_extras: bool,
}

impl<A: PaperlessApi> Poller<A> {
    pub fn new(api: A, notifier: Arc<NotifierMux>) -> Self {
        Self {
            api,
            notifier,
            fetch_extras: true,
        }
    }

    /// Skip the untagged-count and storage requests.
    pub fn without_extras(mut self) -> Self {
        self.fetch_extras = false;
        self
    }

    pub async fn poll(&self, state: &mut SensorState) -> PollResult {
        ensure_metrics_described();
        let t0 = Instant::now();

        let new_documents = match self.api.list_documents().await {
            Ok(listing) => {
                state.record_online(listing.count);
                gauge!("paperless_documents_count").set(listing.count as f64);
                if self.fetch_extras {
                    state.attributes.documents_untagged = self.api.untagged_count().await;
                    state.attributes.storage_used = self.api.storage_used().await;
                }
                self.detect_new_documents(state, listing).await
            }
            Err(failure) => {
                log_failure(&failure);
                state.record_failure(&failure);
                Vec::new()
            }
        };

        state.last_polled = Some(Utc::now());
        histogram!("paperless_poll_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        counter!("paperless_polls_total", "status" => state.status.as_str()).increment(1);
        tracing::debug!(
            status = %state.status,
            documents = state.attributes.documents_count,
            new = new_documents.len(),
            "poll finished"
        );

        PollResult {
            status: state.status,
            attributes: state.attributes.clone(),
            new_documents,
        }
    }

    async fn detect_new_documents(
        &self,
        state: &mut SensorState,
        listing: DocumentListing,
    ) -> Vec<NewDocumentEvent> {
        let by_id: HashMap<_, DocumentSummary> =
            listing.results.into_iter().map(|d| (d.id, d)).collect();
        let current: HashSet<_> = by_id.keys().copied().collect();

        let seeding = !state.known.is_seeded();
        let new_ids = state.known.reconcile(&current);
        if seeding {
            tracing::info!(known = state.known.len(), "seeded known documents");
            return Vec::new();
        }

        let mut events = Vec::with_capacity(new_ids.len());
        for id in new_ids {
            let Some(doc) = by_id.get(&id) else {
                continue;
            };
            let preview = self.api.fetch_preview(id).await;
            if preview.is_none() {
                counter!("paperless_preview_failures_total").increment(1);
            }
            let ev = NewDocumentEvent::from_summary(doc, preview);
            self.notifier.announce(&ev).await;
            // Only now is the id known; a poll dropped before this point
            // leaves it pending for the next one.
            state.known.mark_announced(id);
            counter!("paperless_new_documents_total").increment(1);
            events.push(ev);
        }
        events
    }
}

fn log_failure(failure: &PollFailure) {
    match failure {
        PollFailure::Unexpected(msg) => {
            tracing::error!(error = %msg, "unexpected error while polling Paperless")
        }
        PollFailure::Payload(msg) => {
            tracing::error!(error = %msg, "unexpected documents payload")
        }
        PollFailure::Unauthorized | PollFailure::HttpStatus(_) => {
            tracing::warn!(error = %failure, "Paperless rejected the request")
        }
        PollFailure::Offline(_) | PollFailure::Timeout => {
            tracing::warn!(error = %failure, "could not reach Paperless")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::SensorStatus;
    use std::sync::Mutex;

    /// Scripted API: each poll pops the next listing.
    struct Scripted {
        listings: Mutex<Vec<Result<DocumentListing, PollFailure>>>,
    }

    impl Scripted {
        fn new(mut v: Vec<Result<DocumentListing, PollFailure>>) -> Self {
            v.reverse();
            Self {
                listings: Mutex::new(v),
            }
        }
    }

    #[async_trait::async_trait]
    impl PaperlessApi for Scripted {
        async fn list_documents(&self) -> Result<DocumentListing, PollFailure> {
            self.listings
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(PollFailure::Unexpected("script exhausted".into())))
        }
        async fn fetch_preview(&self, _id: u64) -> Option<String> {
            None
        }
    }

    fn listing(ids: &[u64]) -> DocumentListing {
        DocumentListing {
            count: ids.len() as u64,
            results: ids
                .iter()
                .map(|&id| DocumentSummary {
                    id,
                    title: Some(format!("doc {id}")),
                    created: None,
                })
                .collect(),
        }
    }

    #[tokio::test]
    async fn failure_between_successes_keeps_known_set() {
        let api = Scripted::new(vec![
            Ok(listing(&[1, 2])),
            Err(PollFailure::Timeout),
            Ok(listing(&[1, 2, 3])),
        ]);
        let poller = Poller::new(api, Arc::new(NotifierMux::new()));
        let mut st = SensorState::new();

        assert!(poller.poll(&mut st).await.new_documents.is_empty());
        let r = poller.poll(&mut st).await;
        assert_eq!(r.status, SensorStatus::Timeout);
        assert_eq!(r.attributes.documents_count, 2);

        let r = poller.poll(&mut st).await;
        assert_eq!(r.status, SensorStatus::Online);
        assert_eq!(r.new_documents.len(), 1);
        assert_eq!(r.new_documents[0].document_id, 3);
        assert!(st.last_polled.is_some());
    }

    #[tokio::test]
    async fn failure_before_first_success_does_not_seed() {
        let api = Scripted::new(vec![
            Err(PollFailure::Offline("refused".into())),
            Ok(listing(&[4])),
        ]);
        let poller = Poller::new(api, Arc::new(NotifierMux::new()));
        let mut st = SensorState::new();

        poller.poll(&mut st).await;
        assert!(!st.known.is_seeded());
        let r = poller.poll(&mut st).await;
        assert!(r.new_documents.is_empty());
        assert!(st.known.contains(4));
    }
}
