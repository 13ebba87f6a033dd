//! Error types for the Estante client

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Message shown when the backend cannot be reached or fails internally
pub const TRY_AGAIN_LATER: &str = "Something went wrong. Try again later.";

/// Message shown when a single item lookup comes back empty
pub const ITEM_NOT_FOUND: &str = "Item not found.";

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        fields: BTreeMap<String, String>,
    },

    #[error("Not authenticated: {0}")]
    Unauthorized(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Build a validation error carrying a single field message
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut fields = BTreeMap::new();
        fields.insert(field.to_string(), message.clone());
        AppError::Validation { message, fields }
    }

    /// Map a non-2xx backend response to the error taxonomy
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let parsed: Option<Value> = serde_json::from_slice(body).ok();
        let message = parsed
            .as_ref()
            .and_then(extract_message)
            .or_else(|| {
                let text = String::from_utf8_lossy(body).trim().to_string();
                (!text.is_empty() && parsed.as_ref().map_or(true, Value::is_string))
                    .then(|| text.trim_matches('"').to_string())
            })
            .unwrap_or_default();

        match status {
            400 | 422 => {
                let fields = parsed.as_ref().map(extract_fields).unwrap_or_default();
                let message = if message.is_empty() {
                    "Invalid data".to_string()
                } else {
                    message
                };
                AppError::Validation { message, fields }
            }
            401 => AppError::Unauthorized(or_default(message, "Session expired")),
            403 => AppError::Forbidden(or_default(message, "Access restricted")),
            404 => AppError::NotFound(or_default(message, ITEM_NOT_FOUND)),
            500..=599 => AppError::Server(or_default(message, "Internal server error")),
            _ => AppError::BusinessRule(or_default(message, "Request rejected")),
        }
    }

    /// Text displayed to the user for this error
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation { message, .. } => message.clone(),
            AppError::Unauthorized(_) => "Please sign in again.".to_string(),
            AppError::Forbidden(_) => {
                "Access denied: this area is restricted to librarians.".to_string()
            }
            AppError::NotFound(_) => ITEM_NOT_FOUND.to_string(),
            AppError::BusinessRule(msg) => msg.clone(),
            AppError::Session(msg) => msg.clone(),
            AppError::Server(_)
            | AppError::Network(_)
            | AppError::Decode(_)
            | AppError::Config(_)
            | AppError::Io(_) => TRY_AGAIN_LATER.to_string(),
        }
    }

    /// Field-level validation messages, empty for other errors
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            AppError::Validation { fields, .. } if !fields.is_empty() => Some(fields),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            AppError::Decode(e.to_string())
        } else {
            AppError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Decode(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let fields: BTreeMap<String, String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .iter()
                    .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                (field.to_string(), message)
            })
            .collect();
        AppError::Validation {
            message: "Please fix the highlighted fields".to_string(),
            fields,
        }
    }
}

fn or_default(message: String, default: &str) -> String {
    if message.is_empty() {
        default.to_string()
    } else {
        message
    }
}

fn extract_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(map) => ["message", "mensagem", "error"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

/// Field messages come either under `errors` or as a flat `{field: message}` body
fn extract_fields(value: &Value) -> BTreeMap<String, String> {
    let Value::Object(map) = value else {
        return BTreeMap::new();
    };

    let source = match map.get("errors") {
        Some(Value::Object(errors)) => errors,
        _ if !map.contains_key("message") && !map.contains_key("mensagem") => map,
        _ => return BTreeMap::new(),
    };

    source
        .iter()
        .filter_map(|(k, v)| v.as_str().map(|msg| (k.clone(), msg.to_string())))
        .collect()
}

/// Result type alias for client operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_rule_message_passes_through() {
        let err = AppError::from_response(409, br#"{"message":"Nenhum exemplar disponivel"}"#);
        assert!(matches!(err, AppError::BusinessRule(_)));
        assert_eq!(err.user_message(), "Nenhum exemplar disponivel");
    }

    #[test]
    fn test_plain_text_body() {
        let err = AppError::from_response(400, b"E-mail nao encontrado");
        assert_eq!(err.user_message(), "E-mail nao encontrado");
    }

    #[test]
    fn test_flat_field_map() {
        let err = AppError::from_response(422, br#"{"email":"formato invalido","cpf":"obrigatorio"}"#);
        let fields = err.field_errors().expect("field errors");
        assert_eq!(fields.get("email").map(String::as_str), Some("formato invalido"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(AppError::from_response(401, b""), AppError::Unauthorized(_)));
        assert!(matches!(AppError::from_response(403, b""), AppError::Forbidden(_)));
        assert!(AppError::from_response(404, b"").is_not_found());
        let server = AppError::from_response(503, b"");
        assert_eq!(server.user_message(), TRY_AGAIN_LATER);
    }
}
