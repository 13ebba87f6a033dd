//! User model and related types

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;

/// Account roles as sent by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "LEITOR")]
    Reader,
    #[serde(rename = "BIBLIOTECARIO")]
    Librarian,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Reader => "LEITOR",
            Role::Librarian => "BIBLIOTECARIO",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "LEITOR" | "READER" => Ok(Role::Reader),
            "BIBLIOTECARIO" | "LIBRARIAN" => Ok(Role::Librarian),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Sex field of the signup form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sex {
    Masculino,
    Feminino,
    Outro,
}

impl std::str::FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "MASCULINO" | "M" => Ok(Sex::Masculino),
            "FEMININO" | "F" => Ok(Sex::Feminino),
            "OUTRO" | "O" => Ok(Sex::Outro),
            _ => Err(format!("Invalid sex: {}", s)),
        }
    }
}

/// Full user record (admin listing and profile page)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub nome: String,
    #[serde(default)]
    pub email: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub cpf: Option<String>,
    #[serde(default)]
    pub telefone: Option<String>,
    #[serde(default)]
    pub data_nascimento: Option<NaiveDate>,
    #[serde(default)]
    pub sexo: Option<String>,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub cidade: Option<String>,
    #[serde(default)]
    pub bairro: Option<String>,
}

impl User {
    /// Age in whole years at `today`
    pub fn age_on(&self, today: NaiveDate) -> Option<u32> {
        self.data_nascimento.and_then(|born| today.years_since(born))
    }

    /// "City, State" line, when both are known
    pub fn location(&self) -> Option<String> {
        match (&self.cidade, &self.estado) {
            (Some(city), Some(state)) => Some(format!("{}, {}", city, state)),
            _ => None,
        }
    }
}

/// Short user reference embedded in loans and reservations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
    #[serde(default)]
    pub nome: String,
}

/// Signup request
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub nome: String,
    #[validate(email(message = "Invalid e-mail"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must have at least 6 characters"))]
    pub senha: String,
    #[validate(length(equal = 11, message = "CPF must have 11 digits"))]
    pub cpf: String,
    #[validate(length(min = 8, message = "Invalid phone number"))]
    pub telefone: String,
    pub data_nascimento: NaiveDate,
    pub sexo: Sex,
    #[validate(length(min = 2, message = "State is required"))]
    pub estado: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub cidade: String,
    #[validate(length(min = 1, message = "Neighbourhood is required"))]
    pub bairro: String,
    pub role: Role,
    /// Only sent for librarian accounts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub codigo_administrativo: Option<String>,
}

impl SignupRequest {
    /// Drop the administrative code unless a librarian account is requested
    pub fn normalized(mut self) -> Self {
        if self.role != Role::Librarian {
            self.codigo_administrativo = None;
        }
        self.cpf.retain(|c| c.is_ascii_digit());
        self
    }
}

/// Login request
#[derive(Debug, Clone, Serialize, Validate)]
pub struct Credentials {
    #[validate(email(message = "Invalid e-mail"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub senha: String,
}

/// Login response
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

/// Second step of the password recovery flow
#[derive(Debug, Clone, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PasswordReset {
    #[validate(email(message = "Invalid e-mail"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must have at least 6 characters"))]
    pub nova_senha: String,
}

/// Claims carried by the bearer token issued at login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Login e-mail
    pub sub: String,
    pub id: i64,
    pub role: Role,
    #[serde(default)]
    pub nome: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Identity derived client-side from the bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

impl Identity {
    pub fn is_librarian(&self) -> bool {
        self.role == Role::Librarian
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Name shown in the layout, falling back to the e-mail
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

impl TryFrom<SessionClaims> for Identity {
    type Error = AppError;

    fn try_from(claims: SessionClaims) -> Result<Self, Self::Error> {
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| AppError::Session("Invalid token expiry".to_string()))?;

        Ok(Identity {
            id: claims.id,
            email: claims.sub,
            name: claims.nome,
            role: claims.role,
            expires_at,
        })
    }
}
