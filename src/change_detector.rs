//! New-document detection and the messages it produces.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::client::{DocumentId, DocumentSummary};

pub const NEW_DOCUMENT_EVENT: &str = "paperless_new_document";
pub const NOTIFICATION_TITLE: &str = "New Paperless document";
const UNKNOWN_TITLE: &str = "Unknown document";

/// Ids seen on the last successful poll. `None` until the first one, so an
/// empty library at startup still counts as seeded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownDocuments {
    ids: Option<HashSet<DocumentId>>,
}

impl KnownDocuments {
    pub fn is_seeded(&self) -> bool {
        self.ids.is_some()
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.ids.as_ref().is_some_and(|ids| ids.contains(&id))
    }

    pub fn len(&self) -> usize {
        self.ids.as_ref().map_or(0, HashSet::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget ids missing from `current` and return the ones not yet known.
    /// Returned ids stay out of the set until [`mark_announced`], so a round
    /// cut short offers them again next time. The seeding call adopts
    /// `current` whole and returns nothing. Order is unspecified.
    ///
    /// [`mark_announced`]: KnownDocuments::mark_announced
    pub fn reconcile(&mut self, current: &HashSet<DocumentId>) -> Vec<DocumentId> {
        match &mut self.ids {
            None => {
                self.ids = Some(current.clone());
                Vec::new()
            }
            Some(known) => {
                known.retain(|id| current.contains(id));
                current.difference(known).copied().collect()
            }
        }
    }

    pub fn mark_announced(&mut self, id: DocumentId) {
        self.ids.get_or_insert_with(HashSet::new).insert(id);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocumentEvent {
    pub document_id: DocumentId,
    pub title: String,
    pub created: Option<String>,
    /// Base64 of the preview image, if it could be fetched.
    pub preview: Option<String>,
}

impl NewDocumentEvent {
    pub fn from_summary(doc: &DocumentSummary, preview: Option<String>) -> Self {
        Self {
            document_id: doc.id,
            title: doc
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(UNKNOWN_TITLE)
                .to_string(),
            created: doc.created.clone(),
            preview,
        }
    }
}

/// User-facing message for one new document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub notification_id: String,
}

impl Notification {
    pub fn for_document(ev: &NewDocumentEvent) -> Self {
        let mut message = format!("New document: {}", ev.title);
        if let Some(preview) = &ev.preview {
            message.push_str(&format!(
                "\n\n![Preview](data:image/png;base64,{preview})"
            ));
        }
        Self {
            title: NOTIFICATION_TITLE.to_string(),
            message,
            notification_id: format!("paperless_new_doc_{}", ev.document_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[DocumentId]) -> HashSet<DocumentId> {
        v.iter().copied().collect()
    }

    #[test]
    fn first_reconcile_seeds_without_reporting() {
        let mut known = KnownDocuments::default();
        assert!(!known.is_seeded());
        assert!(known.reconcile(&ids(&[1, 2, 3])).is_empty());
        assert!(known.is_seeded());
        assert_eq!(known.len(), 3);
    }

    #[test]
    fn later_reconcile_reports_only_additions() {
        let mut known = KnownDocuments::default();
        known.reconcile(&ids(&[1, 2, 3]));
        let new_ids = known.reconcile(&ids(&[2, 3, 4]));
        assert_eq!(new_ids, vec![4]);
        assert!(!known.contains(1));
        assert!(!known.contains(4));

        known.mark_announced(4);
        assert!(known.contains(4));
        assert_eq!(known.len(), 3);
    }

    #[test]
    fn unannounced_ids_are_offered_again() {
        let mut known = KnownDocuments::default();
        known.reconcile(&ids(&[1]));
        let mut first = known.reconcile(&ids(&[1, 2, 3]));
        first.sort_unstable();
        assert_eq!(first, vec![2, 3]);

        known.mark_announced(2);
        assert_eq!(known.reconcile(&ids(&[1, 2, 3])), vec![3]);
    }

    #[test]
    fn empty_seed_still_counts_as_seeded() {
        let mut known = KnownDocuments::default();
        assert!(known.reconcile(&HashSet::new()).is_empty());
        assert!(known.is_seeded());
        assert_eq!(known.reconcile(&ids(&[7])), vec![7]);
    }

    #[test]
    fn notification_embeds_preview_only_when_present() {
        let doc = DocumentSummary {
            id: 9,
            title: Some("Invoice".into()),
            created: Some("2025-01-02".into()),
        };
        let with = Notification::for_document(&NewDocumentEvent::from_summary(
            &doc,
            Some("AAAA".into()),
        ));
        assert_eq!(with.notification_id, "paperless_new_doc_9");
        assert_eq!(with.title, NOTIFICATION_TITLE);
        assert!(with
            .message
            .ends_with("![Preview](data:image/png;base64,AAAA)"));

        let without = Notification::for_document(&NewDocumentEvent::from_summary(&doc, None));
        assert_eq!(without.message, "New document: Invoice");
    }

    #[test]
    fn missing_title_falls_back() {
        let doc = DocumentSummary {
            id: 1,
            title: None,
            created: None,
        };
        assert_eq!(
            NewDocumentEvent::from_summary(&doc, None).title,
            "Unknown document"
        );
    }
}
