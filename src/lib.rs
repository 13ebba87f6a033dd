//! Estante client
//!
//! Headless client for the Estante Gira library backend: session handling,
//! a typed REST gateway, the reservation-to-loan workflow and page-level state
//! controllers that a renderer drives.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod models;
pub mod pages;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use repository::{Repository, ReqwestTransport, Transport};
use services::{
    session::{FileTokenStore, SessionService, TokenStore},
    Services,
};

/// Application state shared by every page
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repository: Repository,
    pub services: Services,
}

impl AppState {
    /// Wire the repository and services over an explicit transport and token
    /// store, restoring any stored session
    pub fn new(config: AppConfig, transport: Arc<dyn Transport>, store: Arc<dyn TokenStore>) -> Self {
        let session = Arc::new(SessionService::new(store));
        session.restore();

        let repository = Repository::new(config.api.base_url.clone(), transport, session.clone());
        let services = Services::new(repository.clone(), session, config.debounce_delay());

        Self {
            config: Arc::new(config),
            repository,
            services,
        }
    }

    /// Production wiring: `reqwest` transport and the file token store
    pub fn connect(config: AppConfig) -> AppResult<Self> {
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout())?);
        let store = Arc::new(FileTokenStore::new(config.session.token_path.clone()));
        tracing::debug!(base_url = %config.api.base_url, "Connecting to backend");
        Ok(Self::new(config, transport, store))
    }

    pub fn session(&self) -> &Arc<SessionService> {
        &self.services.session
    }

    pub fn catalog(&self) -> pages::catalog::CatalogPage {
        pages::catalog::CatalogPage::new(
            self.repository.books.clone(),
            self.services.session.clone(),
            self.services.guard.clone(),
            self.services.debounce,
        )
    }

    pub fn book_details(&self) -> pages::catalog::BookDetailsPage {
        pages::catalog::BookDetailsPage::new(
            self.repository.books.clone(),
            self.repository.reservations.clone(),
            self.services.guard.clone(),
        )
    }

    pub fn book_editor(&self) -> pages::catalog::BookEditor {
        pages::catalog::BookEditor::new(self.repository.books.clone(), self.services.session.clone())
    }

    pub fn loan_desk(&self) -> pages::loan_desk::LoanDesk {
        pages::loan_desk::LoanDesk::new(self.services.loans.clone(), self.services.session.clone())
    }

    pub fn fines(&self) -> pages::fines::FinesPage {
        pages::fines::FinesPage::new(
            self.repository.fines.clone(),
            self.services.fines.clone(),
            self.services.session.clone(),
            self.services.debounce,
        )
    }

    pub fn my_fines(&self) -> pages::fines::MyFinesPage {
        pages::fines::MyFinesPage::new(self.services.fines.clone(), self.services.session.clone())
    }

    pub fn users(&self) -> pages::users::UsersPage {
        pages::users::UsersPage::new(
            self.repository.users.clone(),
            self.services.session.clone(),
            self.services.debounce,
        )
    }

    pub fn notification_center(&self) -> pages::notifications::NotificationCenter {
        pages::notifications::NotificationCenter::new(
            self.repository.notifications.clone(),
            self.services.notifications.clone(),
            self.services.session.clone(),
        )
    }

    pub fn my_loans(&self) -> pages::account::MyLoansPage {
        pages::account::MyLoansPage::new(self.repository.clone(), self.services.session.clone())
    }

    pub fn my_reservations(&self) -> pages::account::MyReservationsPage {
        pages::account::MyReservationsPage::new(self.repository.clone(), self.services.session.clone())
    }

    pub fn profile(&self) -> pages::account::ProfilePage {
        pages::account::ProfilePage::new(self.repository.clone(), self.services.session.clone())
    }

    pub fn reports(&self) -> pages::reports::ReportsPage {
        pages::reports::ReportsPage::new(self.repository.reports.clone(), self.services.session.clone())
    }
}
