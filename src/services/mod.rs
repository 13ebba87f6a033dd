//! Business logic services

pub mod access;
pub mod auth;
pub mod fines;
pub mod guard;
pub mod loans;
pub mod notifications;
pub mod queue;
pub mod search;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub session: Arc<session::SessionService>,
    pub notifications: Arc<notifications::NotificationCounter>,
    pub auth: auth::AuthService,
    pub loans: loans::LoansService,
    pub fines: fines::FinesService,
    /// In-flight mutating actions, shared by every page
    pub guard: guard::SubmitGuard<guard::PendingAction>,
    pub debounce: Duration,
}

impl Services {
    /// Create all services over the given repository and session
    pub fn new(
        repository: Repository,
        session: Arc<session::SessionService>,
        debounce: Duration,
    ) -> Self {
        let notifications = Arc::new(notifications::NotificationCounter::new(
            repository.notifications.clone(),
            session.subscribe(),
        ));
        let guard = guard::SubmitGuard::new();

        Self {
            auth: auth::AuthService::new(repository.clone(), session.clone(), notifications.clone()),
            loans: loans::LoansService::new(repository.clone(), guard.clone()),
            fines: fines::FinesService::new(repository, guard.clone()),
            session,
            notifications,
            guard,
            debounce,
        }
    }
}
