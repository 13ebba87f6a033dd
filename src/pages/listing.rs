//! Searchable, filterable listing shared by the catalog, user and fine pages

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use super::{lock, NOTHING_FOUND};
use crate::{
    error::AppResult,
    services::search::{debounce, ListQuery, SearchControls},
};

/// Backend query behind a listing
#[async_trait]
pub trait ListSource: Send + Sync {
    type Item: Clone + Send + Sync;
    type Filter: Clone + PartialEq + Send + Sync;

    async fn fetch(&self, query: &ListQuery<Self::Filter>) -> AppResult<Vec<Self::Item>>;
}

#[derive(Debug, Clone)]
pub struct ListState<T, F> {
    pub controls: SearchControls<F>,
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
    /// Revision of the result currently shown
    pub shown: Option<u64>,
    in_flight: usize,
}

impl<T, F: Clone> Default for ListState<T, F> {
    fn default() -> Self {
        Self {
            controls: SearchControls::new(),
            items: Vec::new(),
            loading: false,
            error: None,
            shown: None,
            in_flight: 0,
        }
    }
}

pub struct FilterableList<S: ListSource> {
    source: S,
    debounce: Duration,
    state: Mutex<ListState<S::Item, S::Filter>>,
}

impl<S: ListSource> FilterableList<S> {
    pub fn new(source: S, debounce: Duration) -> Self {
        Self {
            source,
            debounce,
            state: Mutex::new(ListState::default()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Fetch for the current controls.
    ///
    /// The result is dropped if the controls changed, or the shown rows were
    /// edited locally, while the request was in flight. A "not found" answer
    /// is an empty result, not an error.
    pub async fn reload(&self) -> AppResult<()> {
        let (revision, query) = {
            let mut state = lock(&self.state);
            state.in_flight += 1;
            state.loading = true;
            (state.controls.revision(), state.controls.query())
        };

        let result = match self.source.fetch(&query).await {
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            other => other,
        };

        let mut state = lock(&self.state);
        state.in_flight = state.in_flight.saturating_sub(1);
        state.loading = state.in_flight > 0;
        if state.controls.revision() != revision {
            tracing::debug!(revision, latest = state.controls.revision(), "Discarding stale result");
            return Ok(());
        }
        match result {
            Ok(items) => {
                state.items = items;
                state.error = None;
                state.shown = Some(revision);
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Update the text without fetching
    pub fn set_search_text(&self, text: &str) -> u64 {
        lock(&self.state).controls.set_text(text)
    }

    /// Set the text and fetch right away
    pub async fn search(&self, text: &str) -> AppResult<()> {
        self.set_search_text(text);
        self.reload().await
    }

    /// Select a filter (`None` for all) and fetch; clears the search text
    pub async fn select_filter(&self, filter: Option<S::Filter>) -> AppResult<()> {
        lock(&self.state).controls.set_filter(filter);
        self.reload().await
    }

    pub async fn clear(&self) -> AppResult<()> {
        lock(&self.state).controls.clear();
        self.reload().await
    }

    /// Drive the listing from keystrokes.
    ///
    /// Every keystroke updates the text at once, so older in-flight results
    /// become stale; a fetch fires only after the input has been quiet for the
    /// debounce delay.
    pub async fn run_search_input<I>(&self, input: I)
    where
        I: Stream<Item = String> + Unpin,
    {
        let typed = input.inspect(|text| {
            self.set_search_text(text);
        });
        debounce(typed, self.debounce)
            .for_each_concurrent(None, |text| async move {
                tracing::debug!(text = %text, "Search fired");
                if let Err(e) = self.reload().await {
                    tracing::warn!("Search failed: {}", e);
                }
            })
            .await;
    }

    pub fn items(&self) -> Vec<S::Item> {
        lock(&self.state).items.clone()
    }

    pub fn query(&self) -> ListQuery<S::Filter> {
        lock(&self.state).controls.query()
    }

    pub fn filter(&self) -> Option<S::Filter> {
        lock(&self.state).controls.filter().cloned()
    }

    pub fn error(&self) -> Option<String> {
        lock(&self.state).error.clone()
    }

    /// Text shown instead of rows when a loaded result is empty
    pub fn empty_message(&self) -> Option<&'static str> {
        let state = lock(&self.state);
        (state.shown.is_some() && state.error.is_none() && state.items.is_empty())
            .then_some(NOTHING_FOUND)
    }

    pub fn snapshot(&self) -> ListState<S::Item, S::Filter> {
        lock(&self.state).clone()
    }

    /// Edit the shown rows in place (e.g. after a local status flip).
    ///
    /// Fetches still in flight were issued before the edit and are discarded
    /// when they land.
    pub fn edit_shown<R>(&self, f: impl FnOnce(&mut ListState<S::Item, S::Filter>) -> R) -> R {
        let mut state = lock(&self.state);
        let result = f(&mut state);
        let revision = state.controls.touch();
        if state.shown.is_some() {
            state.shown = Some(revision);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Echoes the query; searches for "slow" wait for a signal
    struct EchoSource {
        calls: AtomicUsize,
        release: Arc<Notify>,
    }

    #[async_trait]
    impl ListSource for EchoSource {
        type Item = String;
        type Filter = u8;

        async fn fetch(&self, query: &ListQuery<u8>) -> AppResult<Vec<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match query {
                ListQuery::All => Ok(vec!["a".into(), "b".into()]),
                ListQuery::Search(text) if text == "slow" => {
                    self.release.notified().await;
                    Ok(vec!["slow".into()])
                }
                ListQuery::Search(text) if text == "missing" => {
                    Err(AppError::NotFound("no such item".into()))
                }
                ListQuery::Search(text) => Ok(vec![text.clone()]),
                ListQuery::Filter(f) => Ok(vec![format!("filter-{}", f)]),
            }
        }
    }

    fn list() -> FilterableList<EchoSource> {
        FilterableList::new(
            EchoSource {
                calls: AtomicUsize::new(0),
                release: Arc::new(Notify::new()),
            },
            Duration::from_millis(500),
        )
    }

    #[tokio::test]
    async fn test_not_found_renders_nothing_found() {
        let list = list();
        list.search("missing").await.unwrap();
        assert!(list.items().is_empty());
        assert_eq!(list.empty_message(), Some(NOTHING_FOUND));
    }

    #[tokio::test]
    async fn test_stale_response_does_not_overwrite_newer_one() {
        let list = Arc::new(list());
        let slow = {
            let list = list.clone();
            tokio::spawn(async move { list.search("slow").await })
        };
        tokio::task::yield_now().await;
        while list.source().calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        list.select_filter(Some(2)).await.unwrap();
        assert_eq!(list.items(), vec!["filter-2".to_string()]);

        list.source().release.notify_one();
        slow.await.unwrap().unwrap();
        assert_eq!(list.items(), vec!["filter-2".to_string()]);
        assert_eq!(list.query(), ListQuery::Filter(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystroke_burst_fires_one_fetch() {
        let list = list();
        let keys = futures::stream::iter(["d", "do", "dom"].map(String::from));
        list.run_search_input(keys).await;

        assert_eq!(list.source().calls.load(Ordering::SeqCst), 1);
        assert_eq!(list.items(), vec!["dom".to_string()]);
    }

    #[tokio::test]
    async fn test_local_edit_outlives_fetch_issued_before_it() {
        let list = Arc::new(list());
        list.search("x").await.unwrap();

        list.set_search_text("slow");
        let pending = {
            let list = list.clone();
            tokio::spawn(async move { list.reload().await })
        };
        while list.source().calls.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }

        list.edit_shown(|state| state.items = vec!["edited".to_string()]);
        list.source().release.notify_one();
        pending.await.unwrap().unwrap();

        assert_eq!(list.items(), vec!["edited".to_string()]);
        assert!(!list.snapshot().loading);
    }
}
