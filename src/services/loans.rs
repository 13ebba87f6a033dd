//! Loan desk service: reservation queue, loan admission, pickup and return

use super::{
    guard::{ActionOutcome, PendingAction, SubmitGuard},
    queue::is_first_in_queue,
};
use crate::{
    error::{AppError, AppResult},
    models::{loan::Loan, reservation::Reservation},
    repository::Repository,
};

pub const NOT_FIRST_IN_QUEUE: &str =
    "Only the first reservation in the queue can be turned into a loan.";

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    guard: SubmitGuard<PendingAction>,
}

impl LoansService {
    pub fn new(repository: Repository, guard: SubmitGuard<PendingAction>) -> Self {
        Self { repository, guard }
    }

    /// Every loan in the system
    pub async fn list_all(&self) -> AppResult<Vec<Loan>> {
        self.repository.loans.list_all().await
    }

    /// Every reservation, unordered
    pub async fn reservations(&self) -> AppResult<Vec<Reservation>> {
        self.repository.reservations.list_all().await
    }

    /// Turn a reservation into a loan awaiting pickup.
    ///
    /// `queue` is the reservation list the decision is made against. A
    /// reservation that is not first for its book is refused before any
    /// request is made.
    pub async fn grant(
        &self,
        reservation: &Reservation,
        queue: &[Reservation],
    ) -> AppResult<ActionOutcome> {
        if !is_first_in_queue(queue, reservation.id) {
            tracing::info!(
                reservation_id = reservation.id,
                book_id = reservation.livro.id,
                "Grant refused: not first in queue"
            );
            return Err(AppError::BusinessRule(NOT_FIRST_IN_QUEUE.to_string()));
        }

        let Some(_ticket) = self.guard.try_begin(PendingAction::GrantLoan(reservation.id)) else {
            return Ok(ActionOutcome::Suppressed);
        };

        self.repository
            .loans
            .register(reservation.usuario.id, reservation.livro.id)
            .await?;
        tracing::info!(
            reservation_id = reservation.id,
            user_id = reservation.usuario.id,
            book_id = reservation.livro.id,
            "Loan granted"
        );
        Ok(ActionOutcome::Completed)
    }

    pub async fn confirm_pickup(&self, loan: &Loan) -> AppResult<ActionOutcome> {
        if !loan.status.can_confirm_pickup() {
            return Err(AppError::BusinessRule(format!(
                "Pickup can only be confirmed for loans awaiting pickup (loan is {})",
                loan.status
            )));
        }

        let Some(_ticket) = self.guard.try_begin(PendingAction::ConfirmPickup(loan.id)) else {
            return Ok(ActionOutcome::Suppressed);
        };

        self.repository.loans.confirm_pickup(loan.id).await?;
        tracing::info!(loan_id = loan.id, "Pickup confirmed");
        Ok(ActionOutcome::Completed)
    }

    pub async fn return_loan(&self, loan: &Loan) -> AppResult<ActionOutcome> {
        if !loan.status.can_return() {
            return Err(AppError::BusinessRule(format!(
                "Only active or overdue loans can be returned (loan is {})",
                loan.status
            )));
        }

        let Some(_ticket) = self.guard.try_begin(PendingAction::ReturnLoan(loan.id)) else {
            return Ok(ActionOutcome::Suppressed);
        };

        self.repository.loans.return_loan(loan.id).await?;
        tracing::info!(loan_id = loan.id, "Loan returned");
        Ok(ActionOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        book::BookRef,
        loan::LoanStatus,
        reservation::ReservationStatus,
        user::UserRef,
    };
    use crate::repository::{
        client::tests::FixedToken,
        transport::{HttpMethod, HttpResponse, MockTransport, RequestBody},
    };
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn service(transport: MockTransport) -> LoansService {
        let repository = Repository::new(
            "http://api.test",
            Arc::new(transport),
            Arc::new(FixedToken(Some("t"))),
        );
        LoansService::new(repository, SubmitGuard::new())
    }

    fn reservation(id: i64, minute: u32) -> Reservation {
        Reservation {
            id,
            usuario: UserRef { id: 40 + id, nome: "Reader".into() },
            livro: BookRef { id: 9, titulo: "Iracema".into() },
            data_reserva: Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0).unwrap(),
            status: ReservationStatus::Active,
        }
    }

    fn loan(id: i64, status: LoanStatus) -> Loan {
        Loan {
            id,
            usuario: UserRef { id: 1, nome: "Reader".into() },
            livro: BookRef { id: 9, titulo: "Iracema".into() },
            data_emprestimo: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            data_devolucao_prevista: None,
            status,
        }
    }

    #[tokio::test]
    async fn test_grant_registers_first_in_queue() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Post
                    && req.url == "http://api.test/emprestimos/registrar"
                    && req.body
                        == RequestBody::Json(serde_json::json!({"idUsuario": 41, "idLivro": 9}))
            })
            .times(1)
            .returning(|_| Ok(HttpResponse::new(201, "")));

        let queue = vec![reservation(1, 0), reservation(2, 5)];
        let outcome = service(transport).grant(&queue[0], &queue).await.unwrap();
        assert_eq!(outcome, ActionOutcome::Completed);
    }

    #[tokio::test]
    async fn test_grant_refuses_later_reservation_without_request() {
        let queue = vec![reservation(1, 0), reservation(2, 5)];
        let err = service(MockTransport::new())
            .grant(&queue[1], &queue)
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), NOT_FIRST_IN_QUEUE);
    }

    #[tokio::test]
    async fn test_status_prechecks() {
        let loans = service(MockTransport::new());
        assert!(loans.confirm_pickup(&loan(1, LoanStatus::Active)).await.is_err());
        assert!(loans.return_loan(&loan(1, LoanStatus::AwaitingPickup)).await.is_err());
        assert!(loans.return_loan(&loan(1, LoanStatus::Finished)).await.is_err());
    }

    #[tokio::test]
    async fn test_server_message_is_surfaced() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .returning(|_| Ok(HttpResponse::new(409, r#"{"message":"Livro sem exemplares"}"#)));

        let err = service(transport)
            .return_loan(&loan(5, LoanStatus::Overdue))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Livro sem exemplares");
    }
}
