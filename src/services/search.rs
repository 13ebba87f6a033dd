//! Search input handling shared by the listing pages

use std::time::Duration;

use futures::stream::{self, Stream, StreamExt};
use tokio::time;

/// Default quiet period before a search fires
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Debounce a stream of values.
///
/// Each item is held until the input has been quiet for `delay`; a newer item
/// replaces it. A held item is flushed when the input ends. A burst of items
/// spaced closer than `delay` therefore yields only its last item.
pub fn debounce<S>(input: S, delay: Duration) -> impl Stream<Item = S::Item>
where
    S: Stream + Unpin,
{
    stream::unfold(Some(input), move |state| async move {
        let mut input = state?;
        let mut latest = input.next().await?;
        loop {
            match time::timeout(delay, input.next()).await {
                Ok(Some(newer)) => latest = newer,
                Ok(None) => return Some((latest, None)),
                Err(_) => return Some((latest, Some(input))),
            }
        }
    })
}

/// The one thing that determines a listing at any time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListQuery<F> {
    All,
    Search(String),
    Filter(F),
}

/// Search text and filter select, kept mutually exclusive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchControls<F> {
    text: String,
    filter: Option<F>,
    revision: u64,
}

impl<F> Default for SearchControls<F> {
    fn default() -> Self {
        Self {
            text: String::new(),
            filter: None,
            revision: 0,
        }
    }
}

impl<F: Clone> SearchControls<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Typing resets the filter to "all"
    pub fn set_text(&mut self, text: impl Into<String>) -> u64 {
        self.text = text.into();
        if !self.text.trim().is_empty() {
            self.filter = None;
        }
        self.bump()
    }

    /// Selecting a filter clears the search text; `None` means "all"
    pub fn set_filter(&mut self, filter: Option<F>) -> u64 {
        self.filter = filter;
        self.text.clear();
        self.bump()
    }

    pub fn clear(&mut self) -> u64 {
        self.text.clear();
        self.filter = None;
        self.bump()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn filter(&self) -> Option<&F> {
        self.filter.as_ref()
    }

    /// Mark results fetched so far as outdated without changing the query
    pub fn touch(&mut self) -> u64 {
        self.bump()
    }

    /// Incremented on every change; responses for older revisions are stale
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn query(&self) -> ListQuery<F> {
        if let Some(filter) = &self.filter {
            return ListQuery::Filter(filter.clone());
        }
        match self.text.trim() {
            "" => ListQuery::All,
            text => ListQuery::Search(text.to_string()),
        }
    }

    fn bump(&mut self) -> u64 {
        self.revision += 1;
        self.revision
    }
}
