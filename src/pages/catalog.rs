//! Catalog pages: book listing, details with reservation, and the librarian
//! book editor

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use validator::Validate;

use super::{
    listing::{FilterableList, ListSource},
    lock, require_librarian, Notice,
};
use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookStatus, CoverImage, NewBook},
    repository::books::BooksRepository,
    repository::reservations::ReservationsRepository,
    services::{
        guard::{ActionOutcome, PendingAction, SubmitGuard},
        search::ListQuery,
        session::SessionService,
    },
};

/// Books by search term; the availability filter runs over the full list
pub struct BookSource {
    books: BooksRepository,
}

impl BookSource {
    pub fn new(books: BooksRepository) -> Self {
        Self { books }
    }
}

#[async_trait]
impl ListSource for BookSource {
    type Item = Book;
    type Filter = BookStatus;

    async fn fetch(&self, query: &ListQuery<BookStatus>) -> AppResult<Vec<Book>> {
        match query {
            ListQuery::All => self.books.list().await,
            ListQuery::Search(term) => self.books.search(term).await,
            ListQuery::Filter(status) => {
                let books = self.books.list().await?;
                Ok(books.into_iter().filter(|b| b.status == *status).collect())
            }
        }
    }
}

pub struct CatalogPage {
    pub list: FilterableList<BookSource>,
    books: BooksRepository,
    session: Arc<SessionService>,
    guard: SubmitGuard<PendingAction>,
    notice: Mutex<Option<Notice>>,
}

impl CatalogPage {
    pub fn new(
        books: BooksRepository,
        session: Arc<SessionService>,
        guard: SubmitGuard<PendingAction>,
        debounce: Duration,
    ) -> Self {
        Self {
            list: FilterableList::new(BookSource::new(books.clone()), debounce),
            books,
            session,
            guard,
            notice: Mutex::new(None),
        }
    }

    pub fn cover_url(&self, book: &Book) -> String {
        self.books.cover_url(book)
    }

    /// Remove a title, then reload the list
    pub async fn delete(&self, book_id: i64) -> AppResult<ActionOutcome> {
        let result = self.try_delete(book_id).await;
        match &result {
            Ok(ActionOutcome::Completed) => {
                self.set_notice(Some(Notice::Success("Book removed.".to_string())))
            }
            Ok(ActionOutcome::Suppressed) => {}
            Err(e) => self.set_notice(Some(Notice::from(e))),
        }
        result
    }

    async fn try_delete(&self, book_id: i64) -> AppResult<ActionOutcome> {
        require_librarian(&self.session)?;
        let Some(_ticket) = self.guard.try_begin(PendingAction::DeleteBook(book_id)) else {
            return Ok(ActionOutcome::Suppressed);
        };

        self.books.delete(book_id).await?;
        tracing::info!(book_id, "Book removed");
        if let Err(e) = self.list.reload().await {
            tracing::warn!("Reload after delete failed: {}", e);
        }
        Ok(ActionOutcome::Completed)
    }

    pub fn notice(&self) -> Option<Notice> {
        lock(&self.notice).clone()
    }

    fn set_notice(&self, notice: Option<Notice>) {
        *lock(&self.notice) = notice;
    }
}

/// Single title with the reserve action
pub struct BookDetailsPage {
    books: BooksRepository,
    reservations: ReservationsRepository,
    guard: SubmitGuard<PendingAction>,
    book: Mutex<Option<Book>>,
    notice: Mutex<Option<Notice>>,
}

impl BookDetailsPage {
    pub fn new(
        books: BooksRepository,
        reservations: ReservationsRepository,
        guard: SubmitGuard<PendingAction>,
    ) -> Self {
        Self {
            books,
            reservations,
            guard,
            book: Mutex::new(None),
            notice: Mutex::new(None),
        }
    }

    pub async fn load(&self, book_id: i64) -> AppResult<Book> {
        match self.books.get_by_id(book_id).await {
            Ok(book) => {
                *lock(&self.book) = Some(book.clone());
                Ok(book)
            }
            Err(e) => {
                *lock(&self.notice) = Some(Notice::from(&e));
                Err(e)
            }
        }
    }

    pub fn book(&self) -> Option<Book> {
        lock(&self.book).clone()
    }

    /// Reserve the loaded title for the signed-in reader
    pub async fn reserve(&self) -> AppResult<ActionOutcome> {
        let book = self
            .book()
            .ok_or_else(|| AppError::NotFound("No book loaded".to_string()))?;

        let Some(_ticket) = self.guard.try_begin(PendingAction::Reserve(book.id)) else {
            return Ok(ActionOutcome::Suppressed);
        };

        let result = self.reservations.request(book.id).await;
        *lock(&self.notice) = Some(match &result {
            Ok(()) => {
                tracing::info!(book_id = book.id, "Reservation requested");
                Notice::Success(format!("Reservation for \"{}\" confirmed.", book.titulo))
            }
            Err(e) => Notice::from(e),
        });
        result.map(|()| ActionOutcome::Completed)
    }

    pub fn notice(&self) -> Option<Notice> {
        lock(&self.notice).clone()
    }
}

/// Outcome of saving an edited book
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Saved { fields: usize },
    NoChanges,
}

/// Create and edit forms for librarians
pub struct BookEditor {
    books: BooksRepository,
    session: Arc<SessionService>,
}

impl BookEditor {
    pub fn new(books: BooksRepository, session: Arc<SessionService>) -> Self {
        Self { books, session }
    }

    pub async fn create(&self, book: NewBook, cover: Option<CoverImage>) -> AppResult<Book> {
        require_librarian(&self.session)?;
        book.validate()?;

        let created = self.books.create(&book, cover.as_ref()).await?;
        tracing::info!(book_id = created.id, title = %created.titulo, "Book created");
        Ok(created)
    }

    /// Send only the fields that differ from `original`
    pub async fn update(&self, original: &Book, edited: &Book) -> AppResult<EditOutcome> {
        require_librarian(&self.session)?;
        if edited.titulo.trim().is_empty() {
            return Err(AppError::invalid_field("titulo", "Title is required"));
        }

        let changes = original.changes_to(edited);
        if changes.is_empty() {
            return Ok(EditOutcome::NoChanges);
        }

        self.books.update(original.id, &changes).await?;
        tracing::info!(book_id = original.id, fields = changes.len(), "Book updated");
        Ok(EditOutcome::Saved {
            fields: changes.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Role;
    use crate::repository::{
        transport::{FormPart, HttpMethod, HttpResponse, MockTransport, RequestBody},
        Repository,
    };
    use crate::services::session::{tests::token_for, MemoryTokenStore};

    const BOOKS: &str = r#"[
        {"id":1,"titulo":"Dom Casmurro","autor":"Machado de Assis","statusLivro":"DISPONIVEL","qtdDisponivel":2},
        {"id":2,"titulo":"O Cortico","autor":"Aluisio Azevedo","statusLivro":"INDISPONIVEL","qtdDisponivel":0}
    ]"#;

    fn setup(transport: MockTransport, role: Role) -> (Repository, Arc<SessionService>) {
        let session = Arc::new(SessionService::new(Arc::new(MemoryTokenStore::default())));
        session.login(&token_for(1, role, 3600)).unwrap();
        let repository = Repository::new("http://api.test", Arc::new(transport), session.clone());
        (repository, session)
    }

    #[tokio::test]
    async fn test_availability_filter_is_applied_locally() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|req| req.url == "http://api.test/livros")
            .returning(|_| Ok(HttpResponse::new(200, BOOKS)));

        let (repository, session) = setup(transport, Role::Reader);
        let page = CatalogPage::new(
            repository.books,
            session,
            SubmitGuard::new(),
            Duration::from_millis(500),
        );

        page.list.select_filter(Some(BookStatus::Available)).await.unwrap();
        let titles: Vec<String> = page.list.items().into_iter().map(|b| b.titulo).collect();
        assert_eq!(titles, vec!["Dom Casmurro".to_string()]);
    }

    #[tokio::test]
    async fn test_reader_cannot_delete() {
        let (repository, session) = setup(MockTransport::new(), Role::Reader);
        let page = CatalogPage::new(
            repository.books,
            session,
            SubmitGuard::new(),
            Duration::from_millis(500),
        );

        assert!(page.delete(1).await.is_err());
        assert_eq!(page.notice(), Some(Notice::Restricted));
    }

    #[tokio::test]
    async fn test_create_uploads_cover_as_multipart() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|req| {
                let RequestBody::Multipart(parts) = &req.body else {
                    return false;
                };
                req.url == "http://api.test/livros/cadastrar"
                    && parts.iter().any(|p| matches!(
                        p,
                        FormPart::File { name, mime_type, .. } if name == "capa" && mime_type == "image/png"
                    ))
                    && parts.iter().any(|p| matches!(
                        p,
                        FormPart::Text { name, value } if name == "anoPublicacao" && value == "1865"
                    ))
            })
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(
                    201,
                    r#"{"id":12,"titulo":"Iracema","autor":"Jose de Alencar","statusLivro":"DISPONIVEL"}"#,
                ))
            });

        let (repository, session) = setup(transport, Role::Librarian);
        let editor = BookEditor::new(repository.books, session);
        let book = NewBook {
            titulo: "Iracema".into(),
            autor: "Jose de Alencar".into(),
            isbn: "9788508133212".into(),
            categoria: "Romance".into(),
            editora: "Atica".into(),
            ano_publicacao: 1865,
            qtd_total: 2,
            descricao: String::new(),
        };
        let cover = CoverImage::from_file_name("iracema.PNG", vec![0x89, 0x50]);

        let created = editor.create(book, Some(cover)).await.unwrap();
        assert_eq!(created.id, 12);
    }

    #[tokio::test]
    async fn test_invalid_book_is_not_sent() {
        let (repository, session) = setup(MockTransport::new(), Role::Librarian);
        let editor = BookEditor::new(repository.books, session);
        let book = NewBook {
            titulo: String::new(),
            autor: "Anon".into(),
            isbn: "123".into(),
            categoria: "X".into(),
            editora: "Y".into(),
            ano_publicacao: 2020,
            qtd_total: 0,
            descricao: String::new(),
        };

        let err = editor.create(book, None).await.unwrap_err();
        let fields = err.field_errors().expect("field errors");
        assert!(fields.contains_key("titulo"));
        assert!(fields.contains_key("qtd_total"));
    }

    #[tokio::test]
    async fn test_edit_sends_only_changed_fields() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|req| {
                req.method == HttpMethod::Put
                    && req.url == "http://api.test/livros/atualizar/1"
                    && req.body == RequestBody::Json(serde_json::json!({"qtdTotal": 4}))
            })
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, "")));

        let (repository, session) = setup(transport, Role::Librarian);
        let editor = BookEditor::new(repository.books, session);

        let books: Vec<Book> = serde_json::from_str(BOOKS).unwrap();
        let original = books[0].clone();
        assert_eq!(editor.update(&original, &original).await.unwrap(), EditOutcome::NoChanges);

        let mut edited = original.clone();
        edited.qtd_total = Some(4);
        assert_eq!(
            editor.update(&original, &edited).await.unwrap(),
            EditOutcome::Saved { fields: 1 }
        );
    }
}
