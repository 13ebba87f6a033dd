//! Fine model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FineStatus {
    #[serde(rename = "PENDENTE")]
    Pending,
    #[serde(rename = "PAGO")]
    Paid,
    #[serde(other)]
    Other,
}

impl FineStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FineStatus::Pending => "PENDENTE",
            FineStatus::Paid => "PAGO",
            FineStatus::Other => "DESCONHECIDO",
        }
    }
}

impl std::str::FromStr for FineStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDENTE" | "PENDING" => Ok(FineStatus::Pending),
            "PAGO" | "PAID" => Ok(FineStatus::Paid),
            _ => Err(format!("Invalid fine status: {}", s)),
        }
    }
}

/// Fine charged for a late return
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fine {
    pub id: i64,
    #[serde(alias = "livroTitulo")]
    pub titulo_livro: String,
    #[serde(default)]
    pub usuario_nome: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub valor: Decimal,
    #[serde(default, with = "super::timestamp::option")]
    pub data_multa: Option<DateTime<Utc>>,
    #[serde(rename = "statusMulta")]
    pub status: FineStatus,
}

impl Fine {
    pub fn is_pending(&self) -> bool {
        self.status == FineStatus::Pending
    }

    /// Amount formatted as Brazilian currency, e.g. `R$ 12,50`
    pub fn amount_label(&self) -> String {
        format!("R$ {:.2}", self.valor).replace('.', ",")
    }
}
