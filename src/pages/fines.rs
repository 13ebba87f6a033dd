//! Fine pages: librarian fine management and the reader's own fines

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{
    listing::{FilterableList, ListSource},
    lock, require_librarian, Notice,
};
use crate::{
    error::{AppError, AppResult},
    models::fine::{Fine, FineStatus},
    repository::fines::FinesRepository,
    services::{fines::FinesService, guard::ActionOutcome, search::ListQuery, session::SessionService},
};

/// Fines by id, by status, or all of them
pub struct FineSource {
    fines: FinesRepository,
}

impl FineSource {
    pub fn new(fines: FinesRepository) -> Self {
        Self { fines }
    }
}

#[async_trait]
impl ListSource for FineSource {
    type Item = Fine;
    type Filter = FineStatus;

    async fn fetch(&self, query: &ListQuery<FineStatus>) -> AppResult<Vec<Fine>> {
        match query {
            ListQuery::All => self.fines.list_all().await,
            ListQuery::Filter(status) => self.fines.by_status(*status).await,
            // Only numeric ids can match
            ListQuery::Search(text) => match text.parse::<i64>() {
                Ok(id) => Ok(vec![self.fines.get_by_id(id).await?]),
                Err(_) => Ok(Vec::new()),
            },
        }
    }
}

pub struct FinesPage {
    pub list: FilterableList<FineSource>,
    fines: FinesService,
    session: Arc<SessionService>,
    notice: Mutex<Option<Notice>>,
}

impl FinesPage {
    pub fn new(
        repository: FinesRepository,
        fines: FinesService,
        session: Arc<SessionService>,
        debounce: Duration,
    ) -> Self {
        Self {
            list: FilterableList::new(FineSource::new(repository), debounce),
            fines,
            session,
            notice: Mutex::new(None),
        }
    }

    pub async fn load(&self) -> AppResult<()> {
        require_librarian(&self.session)?;
        self.list.reload().await
    }

    /// Pay a fine from the shown list.
    ///
    /// The row is updated in place to paid, or dropped when the list is
    /// filtered on pending fines. There is no reload.
    pub async fn pay(&self, fine_id: i64) -> AppResult<ActionOutcome> {
        let result = match self.loaded_fine(fine_id) {
            Ok(fine) => self.fines.pay(&fine).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(ActionOutcome::Completed) => {
                self.list.edit_shown(|state| {
                    if state.controls.filter() == Some(&FineStatus::Pending) {
                        state.items.retain(|f| f.id != fine_id);
                    } else if let Some(fine) = state.items.iter_mut().find(|f| f.id == fine_id) {
                        fine.status = FineStatus::Paid;
                    }
                });
                *lock(&self.notice) = Some(Notice::Success("Fine paid.".to_string()));
            }
            Ok(ActionOutcome::Suppressed) => {}
            Err(e) => *lock(&self.notice) = Some(Notice::from(e)),
        }
        result
    }

    pub fn notice(&self) -> Option<Notice> {
        lock(&self.notice).clone()
    }

    fn loaded_fine(&self, fine_id: i64) -> AppResult<Fine> {
        require_librarian(&self.session)?;
        self.list
            .items()
            .into_iter()
            .find(|f| f.id == fine_id)
            .ok_or_else(|| AppError::NotFound(format!("Fine {} not loaded", fine_id)))
    }
}

/// Fines of the signed-in reader
pub struct MyFinesPage {
    fines: FinesService,
    session: Arc<SessionService>,
    items: Mutex<Vec<Fine>>,
}

impl MyFinesPage {
    pub fn new(fines: FinesService, session: Arc<SessionService>) -> Self {
        Self {
            fines,
            session,
            items: Mutex::new(Vec::new()),
        }
    }

    pub async fn load(&self) -> AppResult<Vec<Fine>> {
        let identity = self.session.require()?;
        let fines = self.fines.for_user(identity.id).await?;
        *lock(&self.items) = fines.clone();
        Ok(fines)
    }

    pub fn items(&self) -> Vec<Fine> {
        lock(&self.items).clone()
    }

    /// Sum of the pending amounts
    pub fn outstanding(&self) -> rust_decimal::Decimal {
        lock(&self.items)
            .iter()
            .filter(|f| f.is_pending())
            .map(|f| f.valor)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use crate::repository::{
        transport::{HttpResponse, MockTransport},
        Repository,
    };
    use crate::services::{
        guard::SubmitGuard,
        session::{tests::token_for, MemoryTokenStore},
    };

    fn page(transport: MockTransport) -> FinesPage {
        page_as(transport, Role::Librarian)
    }

    fn page_as(transport: MockTransport, role: Role) -> FinesPage {
        let session = Arc::new(SessionService::new(Arc::new(MemoryTokenStore::default())));
        session.login(&token_for(1, role, 3600)).unwrap();
        let repository = Repository::new("http://api.test", Arc::new(transport), session.clone());
        let service = FinesService::new(repository.clone(), SubmitGuard::new());
        FinesPage::new(repository.fines, service, session, Duration::from_millis(500))
    }

    #[tokio::test]
    async fn test_non_numeric_search_sends_no_request() {
        let page = page(MockTransport::new());
        page.list.search("abc").await.unwrap();
        assert!(page.list.items().is_empty());
        assert_eq!(page.list.empty_message(), Some(crate::pages::NOTHING_FOUND));
    }

    #[tokio::test]
    async fn test_unknown_id_is_nothing_found() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|req| req.url == "http://api.test/multas/77")
            .times(1)
            .returning(|_| Ok(HttpResponse::new(404, "")));

        let page = page(transport);
        page.list.search("77").await.unwrap();
        assert_eq!(page.list.empty_message(), Some(crate::pages::NOTHING_FOUND));
    }

    #[tokio::test]
    async fn test_paying_a_paid_fine_is_refused_locally() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|req| req.url == "http://api.test/multas")
            .returning(|_| {
                Ok(HttpResponse::new(
                    200,
                    r#"[{"id":3,"tituloLivro":"Iracema","valor":4.0,"statusMulta":"PAGO"}]"#,
                ))
            });

        let page = page(transport);
        page.load().await.unwrap();
        assert!(page.pay(3).await.is_err());
        assert!(page.notice().map_or(false, |n| n.is_error()));
    }

    #[tokio::test]
    async fn test_reader_cannot_pay() {
        let page = page_as(MockTransport::new(), Role::Reader);
        let err = page.pay(3).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(page.notice(), Some(Notice::Restricted));
    }
}
