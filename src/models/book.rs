//! Book (catalog item) model and related types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

/// Availability status of a title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BookStatus {
    #[serde(rename = "DISPONIVEL")]
    Available,
    #[serde(rename = "INDISPONIVEL")]
    Unavailable,
    #[serde(other)]
    Other,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "DISPONIVEL",
            BookStatus::Unavailable => "INDISPONIVEL",
            BookStatus::Other => "DESCONHECIDO",
        }
    }
}

impl std::str::FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DISPONIVEL" | "AVAILABLE" => Ok(BookStatus::Available),
            "INDISPONIVEL" | "UNAVAILABLE" => Ok(BookStatus::Unavailable),
            _ => Err(format!("Invalid book status: {}", s)),
        }
    }
}

/// Book as listed by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: i64,
    pub titulo: String,
    pub autor: String,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub categoria: Option<String>,
    #[serde(default)]
    pub editora: Option<String>,
    #[serde(default)]
    pub ano_publicacao: Option<i32>,
    #[serde(default)]
    pub qtd_total: Option<i32>,
    #[serde(default, alias = "qdtDisponivel")]
    pub qtd_disponivel: Option<i32>,
    #[serde(rename = "statusLivro")]
    pub status: BookStatus,
    #[serde(default)]
    pub descricao: Option<String>,
}

impl Book {
    /// Cover image location served by the backend
    pub fn cover_url(&self, base_url: &str) -> String {
        format!("{}/livros/{}/capa", base_url.trim_end_matches('/'), self.id)
    }

    pub fn is_available(&self) -> bool {
        self.status == BookStatus::Available && self.qtd_disponivel.map_or(true, |n| n > 0)
    }

    /// Editable fields, keyed by their wire names
    fn editable_fields(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("titulo".into(), Value::from(self.titulo.clone()));
        map.insert("autor".into(), Value::from(self.autor.clone()));
        map.insert("categoria".into(), Value::from(self.categoria.clone()));
        map.insert("editora".into(), Value::from(self.editora.clone()));
        map.insert("anoPublicacao".into(), Value::from(self.ano_publicacao));
        map.insert("qtdTotal".into(), Value::from(self.qtd_total));
        map.insert("descricao".into(), Value::from(self.descricao.clone()));
        map
    }

    /// Fields of `edited` that differ from `self`; empty when nothing changed
    pub fn changes_to(&self, edited: &Book) -> Map<String, Value> {
        let before = self.editable_fields();
        edited
            .editable_fields()
            .into_iter()
            .filter(|(key, value)| before.get(key) != Some(value))
            .collect()
    }
}

/// Short book reference embedded in loans and reservations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRef {
    pub id: i64,
    #[serde(default)]
    pub titulo: String,
}

/// Cover image attached to a new book
#[derive(Debug, Clone)]
pub struct CoverImage {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl CoverImage {
    /// Build from a file name, guessing the mime type from its extension
    pub fn from_file_name(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let lower = file_name.to_lowercase();
        let mime_type = if lower.ends_with(".png") {
            "image/png"
        } else {
            "image/jpeg"
        };
        Self {
            file_name,
            mime_type: mime_type.to_string(),
            bytes,
        }
    }
}

/// New book form, sent as multipart
#[derive(Debug, Clone, Validate)]
pub struct NewBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub titulo: String,
    #[validate(length(min = 1, message = "Author is required"))]
    pub autor: String,
    #[validate(length(min = 10, max = 17, message = "Invalid ISBN"))]
    pub isbn: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub categoria: String,
    #[validate(length(min = 1, message = "Publisher is required"))]
    pub editora: String,
    #[validate(range(min = 1000, max = 2100, message = "Invalid publication year"))]
    pub ano_publicacao: i32,
    #[validate(range(min = 1, message = "At least one copy is required"))]
    pub qtd_total: i32,
    pub descricao: String,
}

impl NewBook {
    /// Text fields in the order and names the backend expects
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("titulo", self.titulo.clone()),
            ("autor", self.autor.clone()),
            ("isbn", self.isbn.clone()),
            ("categoria", self.categoria.clone()),
            ("editora", self.editora.clone()),
            ("anoPublicacao", self.ano_publicacao.to_string()),
            ("qtdTotal", self.qtd_total.to_string()),
            ("descricao", self.descricao.clone()),
        ]
    }
}
