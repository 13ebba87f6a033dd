//! Fine payment service

use super::guard::{ActionOutcome, PendingAction, SubmitGuard};
use crate::{
    error::{AppError, AppResult},
    models::fine::Fine,
    repository::Repository,
};

#[derive(Clone)]
pub struct FinesService {
    repository: Repository,
    guard: SubmitGuard<PendingAction>,
}

impl FinesService {
    pub fn new(repository: Repository, guard: SubmitGuard<PendingAction>) -> Self {
        Self { repository, guard }
    }

    pub async fn for_user(&self, user_id: i64) -> AppResult<Vec<Fine>> {
        self.repository.fines.for_user(user_id).await
    }

    /// Settle a pending fine
    pub async fn pay(&self, fine: &Fine) -> AppResult<ActionOutcome> {
        if !fine.is_pending() {
            return Err(AppError::BusinessRule("This fine has already been paid.".to_string()));
        }

        let Some(_ticket) = self.guard.try_begin(PendingAction::PayFine(fine.id)) else {
            return Ok(ActionOutcome::Suppressed);
        };

        self.repository.fines.pay(fine.id).await?;
        tracing::info!(fine_id = fine.id, amount = %fine.valor, "Fine paid");
        Ok(ActionOutcome::Completed)
    }
}
