//! The next-item read path
//!
//! Answers "give me one unclassified, fully-downloaded item" even when the
//! local cache is empty: the background sync normally keeps items ready,
//! but on a cold start nothing has been fetched yet, so this path may fetch
//! synchronously. Callers must run it off their interactive thread.

use tracing::{info, warn};

use crate::client::{SubjectClient, SubjectImporter};
use crate::error::Result;
use crate::item::Item;
use crate::sqlite_store::SubjectStore;

/// Resolves `item/next` against the store, falling back to a bounded
/// number of synchronous remote fetches when the cache is empty.
pub struct NextItemResolver<'a> {
    store: &'a SubjectStore,
    client: &'a dyn SubjectClient,
    importer: &'a dyn SubjectImporter,
}

impl<'a> NextItemResolver<'a> {
    pub fn new(
        store: &'a SubjectStore,
        client: &'a dyn SubjectClient,
        importer: &'a dyn SubjectImporter,
    ) -> Self {
        Self {
            store,
            client,
            importer,
        }
    }

    /// Return one eligible item, or `None` if none could be produced.
    ///
    /// `None` means "temporarily unavailable" and the caller may retry
    /// later; it is never a permanent error. The fallback is capped at
    /// `StoreConfig::fetch_rounds` rounds to bound the blocking time, and
    /// every failed round is logged rather than escalated.
    pub fn next_item(&self) -> Result<Option<Item>> {
        if let Some(item) = self.store.next_unclassified()? {
            return Ok(Some(item));
        }

        let rounds = self.store.config().fetch_rounds;
        let count = self.store.config().fetch_count;
        for round in 1..=rounds {
            let subjects = match self.client.fetch_subjects(count) {
                Ok(subjects) => subjects,
                Err(e) => {
                    warn!(round, error = %e, "next: remote subject fetch failed");
                    continue;
                }
            };
            if subjects.is_empty() {
                warn!(round, "next: remote subject fetch returned no subjects");
                continue;
            }

            // Import synchronously; we need the item immediately. An import
            // of fewer subjects than requested still counts: the re-query
            // below decides whether anything usable arrived.
            match self.importer.import(&subjects) {
                Ok(()) => {
                    info!(round, imported = subjects.len(), "next: imported subjects after empty cache");
                    break;
                }
                Err(e) => {
                    warn!(round, error = %e, "next: subject import failed");
                    continue;
                }
            }
        }

        self.store.next_unclassified()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    // `use super::*` pulls in the crate's one-arg `Result` alias; the test
    // doubles below name the two-arg std `Result`, so bring it back into scope.
    use std::result::Result;
    use crate::client::{ClientError, ImportError, RemoteSubject};
    use crate::columns::item as item_fields;
    use crate::config::StoreConfig;
    use crate::resource::ResourceRef;
    use crate::store::{Value, ValueMap};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    type FetchResult = Result<Vec<RemoteSubject>, ClientError>;

    /// Replays a scripted sequence of fetch results.
    struct ScriptedClient {
        responses: Mutex<VecDeque<FetchResult>>,
        calls: AtomicUsize,
    }

    impl ScriptedClient {
        fn new(responses: Vec<FetchResult>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SubjectClient for ScriptedClient {
        fn fetch_subjects(&self, _count: usize) -> FetchResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::NoNetwork))
        }
    }

    /// Imports subjects into the store and marks all three image variants
    /// downloaded, as the real downloader eventually would.
    struct StoreImporter<'a> {
        store: &'a SubjectStore,
        imported: AtomicUsize,
    }

    impl<'a> StoreImporter<'a> {
        fn new(store: &'a SubjectStore) -> Self {
            Self {
                store,
                imported: AtomicUsize::new(0),
            }
        }

        fn imported(&self) -> usize {
            self.imported.load(Ordering::SeqCst)
        }
    }

    impl SubjectImporter for StoreImporter<'_> {
        fn import(&self, subjects: &[RemoteSubject]) -> Result<(), ImportError> {
            for subject in subjects {
                let mut values = ValueMap::new();
                values.insert(
                    item_fields::SUBJECT_ID.into(),
                    subject.subject_id.as_str().into(),
                );
                values.insert(
                    item_fields::LOCATION_STANDARD_URI_REMOTE.into(),
                    subject.location_standard.as_str().into(),
                );
                values.insert(
                    item_fields::LOCATION_THUMBNAIL_URI_REMOTE.into(),
                    subject.location_thumbnail.as_str().into(),
                );
                values.insert(
                    item_fields::LOCATION_INVERTED_URI_REMOTE.into(),
                    subject.location_inverted.as_str().into(),
                );
                let id = self
                    .store
                    .insert(&ResourceRef::Items, &values)
                    .map_err(|e| ImportError(e.to_string()))?;

                let mut update = ValueMap::new();
                for field in [
                    item_fields::LOCATION_STANDARD_DOWNLOADED,
                    item_fields::LOCATION_THUMBNAIL_DOWNLOADED,
                    item_fields::LOCATION_INVERTED_DOWNLOADED,
                ] {
                    update.insert(field.into(), Value::Bool(true));
                }
                self.store
                    .update(&ResourceRef::Item(id), &update)
                    .map_err(|e| ImportError(e.to_string()))?;
                self.imported.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    /// Always fails, to prove failed imports keep the loop going.
    struct FailingImporter;

    impl SubjectImporter for FailingImporter {
        fn import(&self, _subjects: &[RemoteSubject]) -> Result<(), ImportError> {
            Err(ImportError("disk full".into()))
        }
    }

    fn test_store() -> (SubjectStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = SubjectStore::open_in_memory(StoreConfig::new(dir.path())).unwrap();
        (store, dir)
    }

    fn subject(id: &str) -> RemoteSubject {
        RemoteSubject {
            subject_id: id.into(),
            zooniverse_id: None,
            group_id: Some("sloan".into()),
            location_standard: "https://example.org/s.jpg".into(),
            location_thumbnail: "https://example.org/t.jpg".into(),
            location_inverted: "https://example.org/i.jpg".into(),
        }
    }

    fn count_items(store: &SubjectStore) -> usize {
        store
            .query(&ResourceRef::Items, &Default::default())
            .unwrap()
            .len()
    }

    #[test]
    fn local_hit_needs_no_fetch() {
        let (store, _dir) = test_store();
        let importer = StoreImporter::new(&store);
        importer.import(&[subject("S-local")]).unwrap();

        let client = ScriptedClient::new(vec![]);
        let resolver = NextItemResolver::new(&store, &client, &importer);

        let item = resolver.next_item().unwrap().unwrap();
        assert_eq!(item.subject_id, "S-local");
        assert_eq!(client.calls(), 0);
    }

    #[test]
    fn succeeds_on_second_round() {
        let (store, _dir) = test_store();
        let importer = StoreImporter::new(&store);
        let client = ScriptedClient::new(vec![
            Err(ClientError::NoNetwork),
            Ok(vec![subject("S-remote")]),
        ]);
        let resolver = NextItemResolver::new(&store, &client, &importer);

        let item = resolver.next_item().unwrap().unwrap();
        assert_eq!(item.subject_id, "S-remote");
        assert_eq!(client.calls(), 2);
        assert_eq!(importer.imported(), 1);
        assert_eq!(count_items(&store), 1);
    }

    #[test]
    fn stops_fetching_after_first_successful_import() {
        let (store, _dir) = test_store();
        let importer = StoreImporter::new(&store);
        let client = ScriptedClient::new(vec![
            Ok(vec![subject("S-first")]),
            Ok(vec![subject("S-never-fetched")]),
        ]);
        let resolver = NextItemResolver::new(&store, &client, &importer);

        resolver.next_item().unwrap().unwrap();
        assert_eq!(client.calls(), 1);
        assert_eq!(importer.imported(), 1);
    }

    #[test]
    fn exhausted_rounds_return_empty_without_rows() {
        let (store, _dir) = test_store();
        let importer = StoreImporter::new(&store);
        let client = ScriptedClient::new(vec![
            Err(ClientError::NoNetwork),
            Err(ClientError::RequestFailed("503".into())),
            Ok(vec![]),
        ]);
        let resolver = NextItemResolver::new(&store, &client, &importer);

        assert!(resolver.next_item().unwrap().is_none());
        assert_eq!(client.calls(), 3);
        assert_eq!(count_items(&store), 0);
    }

    #[test]
    fn failed_import_consumes_a_round() {
        let (store, _dir) = test_store();
        let client = ScriptedClient::new(vec![
            Ok(vec![subject("S1")]),
            Ok(vec![subject("S2")]),
            Ok(vec![subject("S3")]),
        ]);
        let resolver = NextItemResolver::new(&store, &client, &FailingImporter);

        assert!(resolver.next_item().unwrap().is_none());
        assert_eq!(client.calls(), 3);
        assert_eq!(count_items(&store), 0);
    }

    #[test]
    fn respects_configured_round_count() {
        let dir = TempDir::new().unwrap();
        let mut config = StoreConfig::new(dir.path());
        config.fetch_rounds = 1;
        let store = SubjectStore::open_in_memory(config).unwrap();

        let importer = StoreImporter::new(&store);
        let client = ScriptedClient::new(vec![Err(ClientError::NoNetwork)]);
        let resolver = NextItemResolver::new(&store, &client, &importer);

        assert!(resolver.next_item().unwrap().is_none());
        assert_eq!(client.calls(), 1);
    }
}
