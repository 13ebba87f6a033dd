//! Unread notification counter shared by the layout and the pages
//!
//! There is no push channel: the count is recomputed from the full list every
//! time [`NotificationCounter::refresh`] is triggered (after login, when the
//! notification list is opened, after every read or delete).

use chrono::Utc;
use tokio::sync::watch;

use crate::{
    error::AppResult,
    models::{
        notification::{count_unread, Notification},
        user::Identity,
    },
    repository::notifications::NotificationsRepository,
};

pub struct NotificationCounter {
    repository: NotificationsRepository,
    session: watch::Receiver<Option<Identity>>,
    unread: watch::Sender<usize>,
}

impl NotificationCounter {
    /// `session` is the identity channel of the session the count belongs to
    pub fn new(
        repository: NotificationsRepository,
        session: watch::Receiver<Option<Identity>>,
    ) -> Self {
        let (unread, _) = watch::channel(0);
        Self {
            repository,
            session,
            unread,
        }
    }

    /// Re-fetch the list and recompute the count. Failures keep the previous
    /// count.
    pub async fn refresh(&self) -> usize {
        match self.fetch().await {
            Ok(list) => self.update_from(&list),
            Err(e) => {
                tracing::warn!("Failed to refresh notification count: {}", e);
                self.unread()
            }
        }
    }

    async fn fetch(&self) -> AppResult<Vec<Notification>> {
        self.repository.mine().await
    }

    /// Recompute from a list the caller already holds
    pub fn update_from(&self, notifications: &[Notification]) -> usize {
        let count = count_unread(notifications);
        self.unread.send_replace(count);
        tracing::debug!(unread = count, "Notification count updated");
        count
    }

    pub fn decrement(&self) {
        self.unread.send_modify(|count| *count = count.saturating_sub(1));
    }

    pub fn reset(&self) {
        self.unread.send_replace(0);
    }

    /// Zero once the session is gone or its token has expired
    pub fn unread(&self) -> usize {
        if !self.has_live_session() {
            if *self.unread.borrow() != 0 {
                tracing::debug!("Session ended; clearing notification count");
                self.reset();
            }
            return 0;
        }
        *self.unread.borrow()
    }

    fn has_live_session(&self) -> bool {
        self.session
            .borrow()
            .as_ref()
            .map_or(false, |identity| !identity.is_expired_at(Utc::now()))
    }

    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.unread.subscribe()
    }

    /// Badge text for the layout; nothing when there is nothing unread
    pub fn badge(&self) -> Option<String> {
        match self.unread() {
            0 => None,
            n if n > 9 => Some("9+".to_string()),
            n => Some(n.to_string()),
        }
    }
}
