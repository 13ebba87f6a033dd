//! Repository layer: typed access to the backend REST API

pub mod auth;
pub mod books;
pub mod client;
pub mod fines;
pub mod loans;
pub mod notifications;
pub mod reports;
pub mod reservations;
pub mod transport;
pub mod users;

use std::sync::Arc;

pub use client::{ApiClient, TokenProvider};
pub use transport::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport};

/// Main repository struct holding one sub-repository per backend resource
#[derive(Clone)]
pub struct Repository {
    pub client: ApiClient,
    pub auth: auth::AuthRepository,
    pub books: books::BooksRepository,
    pub reservations: reservations::ReservationsRepository,
    pub loans: loans::LoansRepository,
    pub fines: fines::FinesRepository,
    pub notifications: notifications::NotificationsRepository,
    pub users: users::UsersRepository,
    pub reports: reports::ReportsRepository,
}

impl Repository {
    /// Create a new repository over the given transport
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        let client = ApiClient::new(base_url, transport, tokens);
        Self {
            auth: auth::AuthRepository::new(client.clone()),
            books: books::BooksRepository::new(client.clone()),
            reservations: reservations::ReservationsRepository::new(client.clone()),
            loans: loans::LoansRepository::new(client.clone()),
            fines: fines::FinesRepository::new(client.clone()),
            notifications: notifications::NotificationsRepository::new(client.clone()),
            users: users::UsersRepository::new(client.clone()),
            reports: reports::ReportsRepository::new(client.clone()),
            client,
        }
    }
}
