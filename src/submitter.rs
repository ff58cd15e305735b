//! Query submission.
//!
//! [`QuerySubmitter::submit`] validates a query, flips its key to
//! `Loading`, and spawns one background task that calls the
//! [`SearchBackend`] and publishes the outcome into the [`ResultStore`].
//!
//! There is no de-duplication, debounce, or cancellation. Two submissions
//! of the same key both run to completion and whichever finishes last
//! determines the final state.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::backend::SearchBackend;
use crate::error::{Result, SearchError};
use crate::models::SearchResult;
use crate::store::ResultStore;

#[derive(Clone)]
pub struct QuerySubmitter {
    store: Arc<ResultStore>,
    backend: Arc<dyn SearchBackend>,
}

impl QuerySubmitter {
    pub fn new(store: Arc<ResultStore>, backend: Arc<dyn SearchBackend>) -> Self {
        Self { store, backend }
    }

    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    /// Starts a search for `query`.
    ///
    /// Blank queries are rejected with [`SearchError::EmptyQuery`] before
    /// any state change. A query made only of whitespace counts as blank;
    /// any other query is keyed by its raw, untrimmed text. Otherwise the
    /// key is set to `Loading` and the returned handle resolves once the
    /// background task has written the final state. Dropping the handle
    /// does not cancel the task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit(&self, query: &str) -> Result<JoinHandle<()>> {
        if query.trim().is_empty() {
            tracing::warn!("rejected empty search query");
            return Err(SearchError::EmptyQuery);
        }

        self.store.mark_loading(query);
        tracing::info!(query = %query, backend = self.backend.name(), "search submitted");

        let store = self.store.clone();
        let backend = self.backend.clone();
        let query = query.to_string();

        Ok(tokio::spawn(async move {
            match backend.search(&query).await {
                Ok(answer) => {
                    tracing::info!(
                        query = %query,
                        references = answer.references.len(),
                        "search loaded"
                    );
                    store.mark_loaded(&query, answer);
                }
                Err(e) => {
                    tracing::warn!(query = %query, error = %e, "search failed");
                    store.mark_error(&query, e.to_string());
                }
            }
        }))
    }

    /// Current snapshot for `query`.
    pub fn observe(&self, query: &str) -> SearchResult {
        self.store.observe(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SearchAnswer, SearchStatus};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Answers every query with a fixed summary after an optional delay.
    struct FixedBackend {
        summary: String,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl FixedBackend {
        fn new(summary: &str) -> Self {
            Self {
                summary: summary.to_string(),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SearchBackend for FixedBackend {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn search(&self, _query: &str) -> Result<SearchAnswer> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Ok(SearchAnswer {
                summary: self.summary.clone(),
                ..SearchAnswer::default()
            })
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl SearchBackend for FailingBackend {
        fn name(&self) -> &str {
            "failing"
        }

        async fn search(&self, _query: &str) -> Result<SearchAnswer> {
            Err(SearchError::Network("request timed out".to_string()))
        }
    }

    /// Sleeps for a duration taken from the query text (`"slow"` vs `"fast"`).
    struct KeyedDelayBackend;

    #[async_trait]
    impl SearchBackend for KeyedDelayBackend {
        fn name(&self) -> &str {
            "keyed"
        }

        async fn search(&self, query: &str) -> Result<SearchAnswer> {
            let ms = if query.starts_with("slow") { 80 } else { 5 };
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok(SearchAnswer {
                summary: format!("answer for {}", query),
                ..SearchAnswer::default()
            })
        }
    }

    #[tokio::test]
    async fn empty_query_changes_nothing() {
        let backend = Arc::new(FixedBackend::new("unused"));
        let store = Arc::new(ResultStore::new());
        let submitter = QuerySubmitter::new(store.clone(), backend.clone());

        assert_eq!(submitter.submit("").unwrap_err(), SearchError::EmptyQuery);
        assert_eq!(submitter.submit("   ").unwrap_err(), SearchError::EmptyQuery);
        assert_eq!(submitter.submit("\t\n").unwrap_err(), SearchError::EmptyQuery);

        assert!(store.is_empty());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn submit_goes_loading_then_loaded() {
        let mut backend = FixedBackend::new("NOON Spa [1] offers Botox.");
        backend.delay = Duration::from_millis(20);
        let backend = Arc::new(backend);
        let submitter = QuerySubmitter::new(Arc::new(ResultStore::new()), backend.clone());

        assert_eq!(submitter.observe("chicago spas").status, SearchStatus::Idle);

        let handle = submitter.submit("chicago spas").unwrap();
        assert_eq!(submitter.observe("chicago spas").status, SearchStatus::Loading);

        handle.await.unwrap();
        let r = submitter.observe("chicago spas");
        assert_eq!(r.status, SearchStatus::Loaded);
        // Stored unannotated.
        assert_eq!(r.summary, "NOON Spa [1] offers Botox.");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_sets_error_without_summary() {
        let submitter = QuerySubmitter::new(Arc::new(ResultStore::new()), Arc::new(FailingBackend));

        submitter.submit("chicago spas").unwrap().await.unwrap();
        let r = submitter.observe("chicago spas");
        assert_eq!(r.status, SearchStatus::Error);
        assert!(!r.error.unwrap_or_default().is_empty());
        assert!(r.summary.is_empty());
    }

    #[tokio::test]
    async fn resubmitting_refetches() {
        let backend = Arc::new(FixedBackend::new("same"));
        let submitter = QuerySubmitter::new(Arc::new(ResultStore::new()), backend.clone());

        submitter.submit("q").unwrap().await.unwrap();
        submitter.submit("q").unwrap().await.unwrap();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert_eq!(submitter.observe("q").status, SearchStatus::Loaded);
    }

    #[tokio::test]
    async fn different_keys_complete_independently() {
        let submitter =
            QuerySubmitter::new(Arc::new(ResultStore::new()), Arc::new(KeyedDelayBackend));

        let slow = submitter.submit("slow query").unwrap();
        let fast = submitter.submit("fast query").unwrap();

        fast.await.unwrap();
        assert_eq!(submitter.observe("fast query").status, SearchStatus::Loaded);
        assert_eq!(submitter.observe("slow query").status, SearchStatus::Loading);

        slow.await.unwrap();
        assert_eq!(
            submitter.observe("slow query").summary,
            "answer for slow query"
        );
    }

    /// Same key in flight twice: the later completion wins even though it
    /// was issued first.
    #[tokio::test]
    async fn same_key_last_completion_wins() {
        struct SequencedBackend {
            calls: AtomicUsize,
        }

        #[async_trait]
        impl SearchBackend for SequencedBackend {
            fn name(&self) -> &str {
                "sequenced"
            }

            async fn search(&self, _query: &str) -> Result<SearchAnswer> {
                let n = self.calls.fetch_add(1, Ordering::SeqCst);
                // First call finishes last.
                let ms = if n == 0 { 80 } else { 5 };
                tokio::time::sleep(Duration::from_millis(ms)).await;
                Ok(SearchAnswer {
                    summary: format!("call {}", n),
                    ..SearchAnswer::default()
                })
            }
        }

        let submitter = QuerySubmitter::new(
            Arc::new(ResultStore::new()),
            Arc::new(SequencedBackend {
                calls: AtomicUsize::new(0),
            }),
        );

        let first = submitter.submit("q").unwrap();
        let second = submitter.submit("q").unwrap();

        second.await.unwrap();
        assert_eq!(submitter.observe("q").summary, "call 1");

        first.await.unwrap();
        let r = submitter.observe("q");
        assert_eq!(r.status, SearchStatus::Loaded);
        assert_eq!(r.summary, "call 0");
    }
}
