//! Reservation endpoints

use super::client::ApiClient;
use crate::{
    error::AppResult,
    models::reservation::{Reservation, ReservationRequest},
};

#[derive(Clone)]
pub struct ReservationsRepository {
    client: ApiClient,
}

impl ReservationsRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Reserve a title for the signed-in reader
    pub async fn request(&self, book_id: i64) -> AppResult<()> {
        self.client
            .post_json("/reservas/solicitar", &ReservationRequest { id_livro: book_id })
            .await?;
        Ok(())
    }

    pub async fn mine(&self) -> AppResult<Vec<Reservation>> {
        self.client.get_list("/reservas/minhas", &[]).await
    }

    /// Every reservation in the system (librarian queue)
    pub async fn list_all(&self) -> AppResult<Vec<Reservation>> {
        self.client.get_list("/reservas/listarTodas", &[]).await
    }
}
