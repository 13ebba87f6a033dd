//! Librarian user administration listing

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::{
    listing::{FilterableList, ListSource},
    require_librarian,
};
use crate::{
    error::AppResult,
    models::user::{Role, User},
    repository::users::UsersRepository,
    services::{search::ListQuery, session::SessionService},
};

pub struct UserSource {
    users: UsersRepository,
}

#[async_trait]
impl ListSource for UserSource {
    type Item = User;
    type Filter = Role;

    async fn fetch(&self, query: &ListQuery<Role>) -> AppResult<Vec<User>> {
        match query {
            ListQuery::All => self.users.list_all().await,
            ListQuery::Search(name) => self.users.search_by_name(name).await,
            ListQuery::Filter(role) => self.users.by_role(*role).await,
        }
    }
}

pub struct UsersPage {
    pub list: FilterableList<UserSource>,
    session: Arc<SessionService>,
}

impl UsersPage {
    pub fn new(users: UsersRepository, session: Arc<SessionService>, debounce: Duration) -> Self {
        Self {
            list: FilterableList::new(UserSource { users }, debounce),
            session,
        }
    }

    pub async fn load(&self) -> AppResult<()> {
        require_librarian(&self.session)?;
        self.list.reload().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{
        transport::{HttpResponse, MockTransport},
        Repository,
    };
    use crate::services::session::{tests::token_for, MemoryTokenStore};

    #[tokio::test]
    async fn test_role_filter_and_name_search_endpoints() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|req| req.url == "http://api.test/admin/filtrar/BIBLIOTECARIO")
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, r#"[{"id":1,"nome":"Ana","role":"BIBLIOTECARIO"}]"#)));
        transport
            .expect_execute()
            .withf(|req| {
                req.url == "http://api.test/admin/buscar"
                    && req.query == vec![("nome".to_string(), "rui".to_string())]
            })
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, r#"[{"id":2,"nome":"Rui","role":"LEITOR"}]"#)));

        let session = Arc::new(SessionService::new(Arc::new(MemoryTokenStore::default())));
        session.login(&token_for(1, Role::Librarian, 3600)).unwrap();
        let repository = Repository::new("http://api.test", Arc::new(transport), session.clone());
        let page = UsersPage::new(repository.users, session, Duration::from_millis(500));

        page.list.select_filter(Some(Role::Librarian)).await.unwrap();
        assert_eq!(page.list.items()[0].nome, "Ana");

        page.list.search("rui").await.unwrap();
        assert_eq!(page.list.filter(), None);
        assert_eq!(page.list.items()[0].nome, "Rui");
    }
}
