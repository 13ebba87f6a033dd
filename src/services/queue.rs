//! Reservation queue gating
//!
//! Several active reservations may exist for one book. Only the earliest
//! created active reservation of each book may be turned into a loan; ties on
//! the creation time go to the lower reservation id.

use std::collections::HashMap;

use crate::models::reservation::Reservation;

/// Reservation as presented in the librarian queue
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub reservation: Reservation,
    /// Whether the "grant loan" action is enabled for this row
    pub can_grant: bool,
    /// 1-based position among the active reservations of the same book
    pub position: usize,
}

/// Reservation id at the head of the queue, per book id
pub fn heads_of_queue(reservations: &[Reservation]) -> HashMap<i64, i64> {
    let mut heads: HashMap<i64, &Reservation> = HashMap::new();
    for reservation in reservations.iter().filter(|r| r.is_active()) {
        heads
            .entry(reservation.livro.id)
            .and_modify(|head| {
                if queue_key(reservation) < queue_key(*head) {
                    *head = reservation;
                }
            })
            .or_insert(reservation);
    }
    heads
        .into_iter()
        .map(|(book_id, head)| (book_id, head.id))
        .collect()
}

pub fn is_first_in_queue(reservations: &[Reservation], reservation_id: i64) -> bool {
    reservations
        .iter()
        .find(|r| r.id == reservation_id)
        .filter(|r| r.is_active())
        .map_or(false, |r| {
            heads_of_queue(reservations).get(&r.livro.id) == Some(&reservation_id)
        })
}

/// Active reservations in queue order with their grant eligibility
pub fn build_queue(reservations: &[Reservation]) -> Vec<QueueEntry> {
    let heads = heads_of_queue(reservations);

    let mut active: Vec<&Reservation> = reservations.iter().filter(|r| r.is_active()).collect();
    active.sort_by_key(|r| queue_key(r));

    let mut positions: HashMap<i64, usize> = HashMap::new();
    active
        .into_iter()
        .map(|reservation| {
            let position = positions.entry(reservation.livro.id).or_insert(0);
            *position += 1;
            QueueEntry {
                can_grant: heads.get(&reservation.livro.id) == Some(&reservation.id),
                position: *position,
                reservation: reservation.clone(),
            }
        })
        .collect()
}

fn queue_key(reservation: &Reservation) -> (chrono::DateTime<chrono::Utc>, i64) {
    (reservation.data_reserva, reservation.id)
}
