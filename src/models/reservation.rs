//! Reservation model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::book::BookRef;
use super::user::UserRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationStatus {
    #[serde(rename = "ATIVA")]
    Active,
    #[serde(rename = "ATENDIDA")]
    Fulfilled,
    #[serde(rename = "CANCELADA")]
    Cancelled,
    #[serde(other)]
    Other,
}

/// Reservation of a title by a reader
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: i64,
    pub usuario: UserRef,
    pub livro: BookRef,
    #[serde(with = "super::timestamp")]
    pub data_reserva: DateTime<Utc>,
    #[serde(rename = "statusReserva")]
    pub status: ReservationStatus,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }
}

/// Request body of `POST /reservas/solicitar`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationRequest {
    pub id_livro: i64,
}
