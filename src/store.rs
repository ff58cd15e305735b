//! Keyed per-query result state.
//!
//! [`ResultStore`] maps a raw query string to its [`SearchResult`]. It is
//! shared between the submitter's background tasks (writers) and the
//! presentation layer (readers), so the map lives behind a `RwLock` and
//! every write publishes the changed key on a broadcast channel.
//!
//! Keys are not normalized: `"Spa"` and `"spa "` are distinct entries.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;

use crate::models::{SearchAnswer, SearchResult, SearchStatus};

const CHANNEL_CAPACITY: usize = 256;

struct Entries {
    results: HashMap<String, SearchResult>,
    /// Keys in creation order, for eviction.
    order: VecDeque<String>,
    /// Outstanding submissions per key. Keys listed here are never evicted.
    in_flight: HashMap<String, usize>,
}

/// Concurrency-safe map of query key → result record.
pub struct ResultStore {
    entries: RwLock<Entries>,
    max_entries: Option<usize>,
    changes: broadcast::Sender<String>,
}

impl ResultStore {
    /// Unbounded store.
    pub fn new() -> Self {
        Self::with_capacity_limit(None)
    }

    /// Store that keeps at most `max_entries` keys when set.
    ///
    /// Inserting beyond the bound evicts the oldest key with no submission
    /// in flight. Keys with outstanding requests are never evicted, so the
    /// bound can be exceeded while many requests are in flight.
    pub fn with_capacity_limit(max_entries: Option<usize>) -> Self {
        let (changes, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            entries: RwLock::new(Entries {
                results: HashMap::new(),
                order: VecDeque::new(),
                in_flight: HashMap::new(),
            }),
            max_entries,
            changes,
        }
    }

    /// Current snapshot for `query`. Unknown keys are `Idle`.
    pub fn observe(&self, query: &str) -> SearchResult {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.results.get(query).cloned().unwrap_or_default()
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receives the key of every entry that changes after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.changes.subscribe()
    }

    /// Moves `query` to `Loading`, clearing any prior error and payload.
    ///
    /// Every call must be paired with one later [`mark_loaded`] or
    /// [`mark_error`] for the same key.
    ///
    /// [`mark_loaded`]: ResultStore::mark_loaded
    /// [`mark_error`]: ResultStore::mark_error
    pub fn mark_loading(&self, query: &str) -> SearchResult {
        let snapshot = self.update(query, Transition::Start, |r| {
            *r = SearchResult {
                status: SearchStatus::Loading,
                submitted_at: Some(Utc::now()),
                ..SearchResult::default()
            };
        });
        snapshot.unwrap_or_default()
    }

    /// Moves `query` to `Loaded` with the backend's answer.
    ///
    /// Returns `None` without touching the store when `query` is not
    /// tracked, so a completion never resurrects a key.
    pub fn mark_loaded(&self, query: &str, answer: SearchAnswer) -> Option<SearchResult> {
        self.update(query, Transition::Finish, |r| {
            r.status = SearchStatus::Loaded;
            r.summary = answer.summary;
            r.references = answer.references;
            r.documents = answer.documents;
            r.error = None;
            r.completed_at = Some(Utc::now());
        })
    }

    /// Moves `query` to `Error` with `detail`, leaving no summary behind.
    ///
    /// Untracked keys are left alone, as for [`mark_loaded`](ResultStore::mark_loaded).
    pub fn mark_error(&self, query: &str, detail: impl Into<String>) -> Option<SearchResult> {
        let detail = detail.into();
        self.update(query, Transition::Finish, |r| {
            r.status = SearchStatus::Error;
            r.summary.clear();
            r.references.clear();
            r.documents.clear();
            r.error = Some(detail);
            r.completed_at = Some(Utc::now());
        })
    }

    fn update(
        &self,
        query: &str,
        transition: Transition,
        apply: impl FnOnce(&mut SearchResult),
    ) -> Option<SearchResult> {
        let snapshot = {
            let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());

            match transition {
                Transition::Start => {
                    *entries.in_flight.entry(query.to_string()).or_default() += 1;
                    if !entries.results.contains_key(query) {
                        entries.order.push_back(query.to_string());
                        entries
                            .results
                            .insert(query.to_string(), SearchResult::default());
                        self.evict(&mut entries);
                    }
                }
                Transition::Finish => {
                    if !entries.results.contains_key(query) {
                        tracing::debug!(query = %query, "dropped completion for untracked key");
                        return None;
                    }
                    if let Some(n) = entries.in_flight.get_mut(query) {
                        *n = n.saturating_sub(1);
                        if *n == 0 {
                            entries.in_flight.remove(query);
                        }
                    }
                }
            }

            let result = entries.results.get_mut(query)?;
            apply(result);
            result.clone()
        };

        // No receivers is fine.
        let _ = self.changes.send(query.to_string());
        Some(snapshot)
    }

    fn evict(&self, entries: &mut Entries) {
        let Some(max) = self.max_entries else {
            return;
        };

        while entries.results.len() > max {
            let victim = entries
                .order
                .iter()
                .position(|k| !entries.in_flight.contains_key(k));
            match victim.and_then(|i| entries.order.remove(i)) {
                Some(key) => {
                    entries.results.remove(&key);
                    tracing::debug!(query = %key, "evicted search result");
                }
                None => break,
            }
        }
    }

    /// Waits until `query` is no longer `Loading` and returns its snapshot.
    ///
    /// Returns immediately for keys that are idle or already settled.
    /// Gives up after `timeout` and returns whatever state is current.
    pub async fn wait_settled(&self, query: &str, timeout: Duration) -> SearchResult {
        let mut rx = self.subscribe();

        let wait = async {
            loop {
                let current = self.observe(query);
                if current.status != SearchStatus::Loading {
                    return current;
                }
                match rx.recv().await {
                    Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return self.observe(query),
                }
            }
        };

        match tokio::time::timeout(timeout, wait).await {
            Ok(result) => result,
            Err(_) => self.observe(query),
        }
    }
}

enum Transition {
    /// A submission begins; creates the key if needed.
    Start,
    /// A submission resolves; only updates a tracked key.
    Finish,
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::new()
    }
}
