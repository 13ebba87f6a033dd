//! Librarian reports dashboard

use std::sync::{Arc, Mutex};

use super::{lock, require_librarian};
use crate::{
    error::{AppError, AppResult},
    models::report::{DashboardStats, RankedBook, ReportPeriod},
    repository::reports::ReportsRepository,
    services::session::SessionService,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportsState {
    pub period: ReportPeriod,
    pub stats: Option<DashboardStats>,
    pub top_loans: Vec<RankedBook>,
    pub top_reservations: Vec<RankedBook>,
    pub error: Option<String>,
}

pub struct ReportsPage {
    reports: ReportsRepository,
    session: Arc<SessionService>,
    state: Mutex<ReportsState>,
}

impl ReportsPage {
    pub fn new(reports: ReportsRepository, session: Arc<SessionService>) -> Self {
        Self {
            reports,
            session,
            state: Mutex::new(ReportsState::default()),
        }
    }

    /// Load the three reports for `period` in parallel
    pub async fn load(&self, period: ReportPeriod) -> AppResult<ReportsState> {
        require_librarian(&self.session)?;
        if !period.is_valid() {
            return Err(AppError::invalid_field(
                "endDate",
                "End date must not be before the start date",
            ));
        }

        let (stats, top_loans, top_reservations) = tokio::join!(
            self.reports.dashboard(&period),
            self.reports.top_loans(&period),
            self.reports.top_reservations(&period),
        );

        let mut state = lock(&self.state);
        state.period = period;
        state.error = None;
        match (stats, top_loans, top_reservations) {
            (Ok(stats), Ok(top_loans), Ok(top_reservations)) => {
                state.stats = Some(stats);
                state.top_loans = top_loans;
                state.top_reservations = top_reservations;
                Ok(state.clone())
            }
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                tracing::warn!("Failed to load reports: {}", e);
                state.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    pub fn snapshot(&self) -> ReportsState {
        lock(&self.state).clone()
    }
}
