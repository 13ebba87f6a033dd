//! Reader account pages: my loans, my reservations and my profile

use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::lock;
use crate::{
    error::AppResult,
    models::{loan::Loan, reservation::Reservation, user::User},
    repository::Repository,
    services::session::SessionService,
};

/// Loans of the signed-in user; the id comes from the session
pub struct MyLoansPage {
    repository: Repository,
    session: Arc<SessionService>,
    items: Mutex<Vec<Loan>>,
}

impl MyLoansPage {
    pub fn new(repository: Repository, session: Arc<SessionService>) -> Self {
        Self {
            repository,
            session,
            items: Mutex::new(Vec::new()),
        }
    }

    pub async fn load(&self) -> AppResult<Vec<Loan>> {
        let identity = self.session.require()?;
        let loans = self.repository.loans.for_user(identity.id).await?;
        *lock(&self.items) = loans.clone();
        Ok(loans)
    }

    pub fn items(&self) -> Vec<Loan> {
        lock(&self.items).clone()
    }

    /// Open loans past their due date right now
    pub fn late(&self) -> Vec<Loan> {
        let now = Utc::now();
        lock(&self.items)
            .iter()
            .filter(|l| l.is_late_at(now))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MyReservations {
    pub active: Vec<Reservation>,
    pub history: Vec<Reservation>,
}

impl MyReservations {
    /// Active reservations first, everything else as history, newest first
    pub fn split(mut reservations: Vec<Reservation>) -> Self {
        reservations.sort_by(|a, b| b.data_reserva.cmp(&a.data_reserva));
        let (active, history) = reservations.into_iter().partition(Reservation::is_active);
        Self { active, history }
    }
}

pub struct MyReservationsPage {
    repository: Repository,
    session: Arc<SessionService>,
    state: Mutex<MyReservations>,
}

impl MyReservationsPage {
    pub fn new(repository: Repository, session: Arc<SessionService>) -> Self {
        Self {
            repository,
            session,
            state: Mutex::new(MyReservations::default()),
        }
    }

    pub async fn load(&self) -> AppResult<MyReservations> {
        self.session.require()?;
        let split = MyReservations::split(self.repository.reservations.mine().await?);
        *lock(&self.state) = split.clone();
        Ok(split)
    }

    pub fn snapshot(&self) -> MyReservations {
        lock(&self.state).clone()
    }
}

pub struct ProfilePage {
    repository: Repository,
    session: Arc<SessionService>,
}

impl ProfilePage {
    pub fn new(repository: Repository, session: Arc<SessionService>) -> Self {
        Self {
            repository,
            session,
        }
    }

    pub async fn load(&self) -> AppResult<User> {
        self.session.require()?;
        self.repository.users.my_profile().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{book::BookRef, reservation::ReservationStatus, user::UserRef};
    use chrono::TimeZone;

    fn reservation(id: i64, day: u32, status: ReservationStatus) -> Reservation {
        Reservation {
            id,
            usuario: UserRef { id: 1, nome: "Ana".into() },
            livro: BookRef { id, titulo: "Livro".into() },
            data_reserva: Utc.with_ymd_and_hms(2024, 4, day, 9, 0, 0).unwrap(),
            status,
        }
    }

    #[test]
    fn test_split_active_and_history() {
        let split = MyReservations::split(vec![
            reservation(1, 1, ReservationStatus::Fulfilled),
            reservation(2, 3, ReservationStatus::Active),
            reservation(3, 2, ReservationStatus::Cancelled),
            reservation(4, 5, ReservationStatus::Active),
        ]);
        let ids = |list: &[Reservation]| list.iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ids(&split.active), vec![4, 2]);
        assert_eq!(ids(&split.history), vec![3, 1]);
    }
}
