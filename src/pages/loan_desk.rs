//! Librarian loan desk: reservation queue plus the loan list
//!
//! Loans and reservations are loaded by two independent requests. Either one
//! may fail without blanking the other section.

use std::sync::{Arc, Mutex};

use super::{lock, require_librarian, Notice};
use crate::{
    error::{AppError, AppResult},
    models::{loan::Loan, reservation::Reservation},
    services::{
        guard::ActionOutcome,
        loans::LoansService,
        queue::{build_queue, QueueEntry},
        session::SessionService,
    },
};

#[derive(Debug, Clone, Default)]
pub struct LoanDeskState {
    pub loans: Vec<Loan>,
    pub reservations: Vec<Reservation>,
    pub queue: Vec<QueueEntry>,
    pub loans_error: Option<String>,
    pub reservations_error: Option<String>,
    pub notice: Option<Notice>,
    /// Bumped by every load and completed action; older loads are dropped
    generation: u64,
}

pub struct LoanDesk {
    loans: LoansService,
    session: Arc<SessionService>,
    state: Mutex<LoanDeskState>,
}

impl LoanDesk {
    pub fn new(loans: LoansService, session: Arc<SessionService>) -> Self {
        Self {
            loans,
            session,
            state: Mutex::new(LoanDeskState::default()),
        }
    }

    /// Fetch loans and reservations in parallel and merge what arrived
    pub async fn load(&self) -> AppResult<()> {
        require_librarian(&self.session)?;
        let generation = {
            let mut state = lock(&self.state);
            state.generation += 1;
            state.generation
        };

        let (loans, reservations) = tokio::join!(self.loans.list_all(), self.loans.reservations());

        let mut state = lock(&self.state);
        if state.generation != generation {
            tracing::debug!(generation, latest = state.generation, "Discarding stale loan desk load");
            return Ok(());
        }
        match loans {
            Ok(loans) => {
                state.loans = loans;
                state.loans_error = None;
            }
            Err(e) => {
                tracing::warn!("Failed to load loans: {}", e);
                state.loans_error = Some(e.user_message());
            }
        }
        match reservations {
            Ok(reservations) => {
                state.queue = build_queue(&reservations);
                state.reservations = reservations;
                state.reservations_error = None;
            }
            Err(e) => {
                tracing::warn!("Failed to load reservations: {}", e);
                state.reservations_error = Some(e.user_message());
            }
        }
        Ok(())
    }

    /// Turn a queued reservation into a loan awaiting pickup
    pub async fn grant(&self, reservation_id: i64) -> AppResult<ActionOutcome> {
        let (reservation, reservations) = {
            let state = lock(&self.state);
            let reservation = state
                .reservations
                .iter()
                .find(|r| r.id == reservation_id)
                .cloned();
            (reservation, state.reservations.clone())
        };
        let reservation = self.found(reservation, "Reservation")?;

        let result = self.loans.grant(&reservation, &reservations).await;
        if matches!(result, Ok(ActionOutcome::Completed)) {
            // The reservation is fulfilled even if the reload below fails
            let mut state = lock(&self.state);
            state.reservations.retain(|r| r.id != reservation_id);
            state.queue = build_queue(&state.reservations);
        }
        self.finish(result, "Loan registered. Waiting for pickup.").await
    }

    pub async fn confirm_pickup(&self, loan_id: i64) -> AppResult<ActionOutcome> {
        let loan = self.loan(loan_id)?;
        let result = self.loans.confirm_pickup(&loan).await;
        self.finish(result, "Pickup confirmed.").await
    }

    pub async fn return_loan(&self, loan_id: i64) -> AppResult<ActionOutcome> {
        let loan = self.loan(loan_id)?;
        let result = self.loans.return_loan(&loan).await;
        self.finish(result, "Book returned.").await
    }

    pub fn snapshot(&self) -> LoanDeskState {
        lock(&self.state).clone()
    }

    pub fn queue(&self) -> Vec<QueueEntry> {
        lock(&self.state).queue.clone()
    }

    pub fn notice(&self) -> Option<Notice> {
        lock(&self.state).notice.clone()
    }

    fn loan(&self, loan_id: i64) -> AppResult<Loan> {
        let loan = lock(&self.state)
            .loans
            .iter()
            .find(|l| l.id == loan_id)
            .cloned();
        self.found(loan, "Loan")
    }

    fn found<T>(&self, item: Option<T>, kind: &str) -> AppResult<T> {
        item.ok_or_else(|| {
            let error = AppError::NotFound(format!("{} not loaded", kind));
            lock(&self.state).notice = Some(Notice::from(&error));
            error
        })
    }

    /// Record the notice and refetch after a completed action
    async fn finish(
        &self,
        result: AppResult<ActionOutcome>,
        success: &str,
    ) -> AppResult<ActionOutcome> {
        match &result {
            Ok(ActionOutcome::Completed) => {
                {
                    let mut state = lock(&self.state);
                    state.notice = Some(Notice::Success(success.to_string()));
                    state.generation += 1;
                }
                if let Err(e) = self.load().await {
                    tracing::warn!("Reload after action failed: {}", e);
                }
            }
            Ok(ActionOutcome::Suppressed) => {}
            Err(e) => lock(&self.state).notice = Some(Notice::from(e)),
        }
        result
    }
}
