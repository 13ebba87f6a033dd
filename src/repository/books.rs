//! Catalog endpoints

use serde_json::{Map, Value};

use super::{
    client::ApiClient,
    transport::{FormPart, HttpMethod},
};
use crate::{
    error::AppResult,
    models::book::{Book, CoverImage, NewBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    client: ApiClient,
}

impl BooksRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn cover_url(&self, book: &Book) -> String {
        book.cover_url(self.client.base_url())
    }

    pub async fn list(&self) -> AppResult<Vec<Book>> {
        self.client.get_list("/livros", &[]).await
    }

    /// Search by title, author or category
    pub async fn search(&self, term: &str) -> AppResult<Vec<Book>> {
        self.client
            .get_list("/livros/buscar", &[("termo", term.to_string())])
            .await
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Book> {
        self.client.get_json(&format!("/livros/{}", id)).await
    }

    pub async fn create(&self, book: &NewBook, cover: Option<&CoverImage>) -> AppResult<Book> {
        let mut parts: Vec<FormPart> = book
            .form_fields()
            .into_iter()
            .map(|(name, value)| FormPart::Text {
                name: name.to_string(),
                value,
            })
            .collect();

        if let Some(cover) = cover {
            parts.push(FormPart::File {
                name: "capa".to_string(),
                file_name: cover.file_name.clone(),
                mime_type: cover.mime_type.clone(),
                bytes: cover.bytes.clone(),
            });
        }

        let request = self
            .client
            .request(HttpMethod::Post, "/livros/cadastrar")
            .multipart(parts);
        self.client.send(request).await?.json()
    }

    /// Partial update with only the changed fields
    pub async fn update(&self, id: i64, changes: &Map<String, Value>) -> AppResult<()> {
        let request = self
            .client
            .request(HttpMethod::Put, &format!("/livros/atualizar/{}", id))
            .json(changes)?;
        self.client.send(request).await?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.client.delete(&format!("/livros/remover/{}", id)).await?;
        Ok(())
    }
}
