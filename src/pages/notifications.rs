//! Notification centre

use std::sync::{Arc, Mutex};

use super::{lock, Notice};
use crate::{
    error::{AppError, AppResult},
    models::notification::Notification,
    repository::notifications::NotificationsRepository,
    services::{
        access::{notification_target, Route},
        notifications::NotificationCounter,
        session::SessionService,
    },
};

/// Notification with the page it links to
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEntry {
    pub notification: Notification,
    pub target: Option<Route>,
}

pub struct NotificationCenter {
    repository: NotificationsRepository,
    counter: Arc<NotificationCounter>,
    session: Arc<SessionService>,
    items: Mutex<Vec<Notification>>,
    notice: Mutex<Option<Notice>>,
}

impl NotificationCenter {
    pub fn new(
        repository: NotificationsRepository,
        counter: Arc<NotificationCounter>,
        session: Arc<SessionService>,
    ) -> Self {
        Self {
            repository,
            counter,
            session,
            items: Mutex::new(Vec::new()),
            notice: Mutex::new(None),
        }
    }

    /// Fetch the list; opening the centre also refreshes the badge
    pub async fn load(&self) -> AppResult<Vec<Notification>> {
        self.session.require()?;
        let list = self.repository.mine().await?;
        self.counter.update_from(&list);
        *lock(&self.items) = list.clone();
        Ok(list)
    }

    pub async fn mark_read(&self, id: i64) -> AppResult<()> {
        self.repository.mark_read(id).await.map_err(|e| self.fail(e))?;
        {
            let mut items = lock(&self.items);
            if let Some(n) = items.iter_mut().find(|n| n.id == id) {
                n.lida = true;
            }
        }
        self.after_mutation(None).await
    }

    pub async fn mark_all_read(&self) -> AppResult<()> {
        self.repository.mark_all_read().await.map_err(|e| self.fail(e))?;
        self.after_mutation(Some("All notifications marked as read.")).await
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.repository.delete(id).await.map_err(|e| self.fail(e))?;
        lock(&self.items).retain(|n| n.id != id);
        self.after_mutation(Some("Notification deleted.")).await
    }

    pub async fn delete_all(&self) -> AppResult<()> {
        self.repository.delete_all().await.map_err(|e| self.fail(e))?;
        lock(&self.items).clear();
        self.after_mutation(Some("All notifications deleted.")).await
    }

    /// Shown list with link targets for the current role
    pub fn entries(&self) -> Vec<NotificationEntry> {
        let role = self.session.identity().map(|i| i.role);
        lock(&self.items)
            .iter()
            .map(|n| NotificationEntry {
                target: role.and_then(|role| notification_target(&n.mensagem, role)),
                notification: n.clone(),
            })
            .collect()
    }

    pub fn notice(&self) -> Option<Notice> {
        lock(&self.notice).clone()
    }

    /// Re-fetch so the list and the badge agree with the backend
    async fn after_mutation(&self, success: Option<&str>) -> AppResult<()> {
        if let Some(text) = success {
            *lock(&self.notice) = Some(Notice::Success(text.to_string()));
        }
        match self.load().await {
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!("Reload after notification update failed: {}", e);
                self.counter.update_from(&lock(&self.items));
                Ok(())
            }
        }
    }

    fn fail(&self, error: AppError) -> AppError {
        *lock(&self.notice) = Some(Notice::from(&error));
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use crate::repository::{
        transport::{HttpMethod, HttpResponse, MockTransport},
        Repository,
    };
    use crate::services::session::{tests::token_for, MemoryTokenStore};
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn test_mark_read_updates_badge_and_targets() {
        let read = Arc::new(AtomicBool::new(false));
        let mut transport = MockTransport::new();
        let flag = read.clone();
        transport
            .expect_execute()
            .withf(|req| req.method == HttpMethod::Get && req.url.ends_with("/notificacoes/minhas"))
            .returning(move |_| {
                let lida = flag.load(Ordering::SeqCst);
                Ok(HttpResponse::new(
                    200,
                    format!(
                        r#"[{{"id":1,"mensagem":"Sua reserva esta disponivel","lida":{}}},
                            {{"id":2,"mensagem":"Multa gerada","lida":false}}]"#,
                        lida
                    ),
                ))
            });
        let flag = read.clone();
        transport
            .expect_execute()
            .withf(|req| req.method == HttpMethod::Put && req.url.ends_with("/notificacoes/1/lida"))
            .times(1)
            .returning(move |_| {
                flag.store(true, Ordering::SeqCst);
                Ok(HttpResponse::new(200, ""))
            });

        let session = Arc::new(SessionService::new(Arc::new(MemoryTokenStore::default())));
        session.login(&token_for(4, Role::Reader, 3600)).unwrap();
        let repository = Repository::new("http://api.test", Arc::new(transport), session.clone());
        let counter = Arc::new(NotificationCounter::new(repository.notifications.clone(), session.subscribe()));
        let centre = NotificationCenter::new(repository.notifications, counter.clone(), session);

        centre.load().await.unwrap();
        assert_eq!(counter.unread(), 2);

        centre.mark_read(1).await.unwrap();
        assert_eq!(counter.unread(), 1);

        let targets: Vec<Option<Route>> = centre.entries().into_iter().map(|e| e.target).collect();
        assert_eq!(targets, vec![Some(Route::MyReservations), Some(Route::MyFines)]);
    }
}
