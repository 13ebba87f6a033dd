//! Loan (borrow) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::book::BookRef;
use super::user::UserRef;

/// Loan lifecycle: awaiting pickup → active → (finished | overdue → finished)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanStatus {
    #[serde(rename = "AGUARDANDO_RETIRADA")]
    AwaitingPickup,
    #[serde(rename = "ATIVO")]
    Active,
    #[serde(rename = "ATRASADO")]
    Overdue,
    #[serde(rename = "FINALIZADO")]
    Finished,
    #[serde(other)]
    Other,
}

impl LoanStatus {
    pub fn can_confirm_pickup(&self) -> bool {
        *self == LoanStatus::AwaitingPickup
    }

    pub fn can_return(&self) -> bool {
        matches!(self, LoanStatus::Active | LoanStatus::Overdue)
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, LoanStatus::Finished | LoanStatus::Other)
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::AwaitingPickup => "awaiting pickup",
            LoanStatus::Active => "active",
            LoanStatus::Overdue => "overdue",
            LoanStatus::Finished => "finished",
            LoanStatus::Other => "unknown",
        };
        write!(f, "{}", label)
    }
}

/// Loan with embedded user and book references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: i64,
    pub usuario: UserRef,
    pub livro: BookRef,
    #[serde(with = "super::timestamp")]
    pub data_emprestimo: DateTime<Utc>,
    #[serde(default, with = "super::timestamp::option")]
    pub data_devolucao_prevista: Option<DateTime<Utc>>,
    #[serde(rename = "statusEmprestimo")]
    pub status: LoanStatus,
}

impl Loan {
    /// Past the due date while still open, whatever the server last reported
    pub fn is_late_at(&self, now: DateTime<Utc>) -> bool {
        self.status == LoanStatus::Overdue
            || (self.status == LoanStatus::Active
                && self.data_devolucao_prevista.map_or(false, |due| now > due))
    }
}

/// Request body of `POST /emprestimos/registrar`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoan {
    pub id_usuario: i64,
    pub id_livro: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_transitions() {
        assert!(LoanStatus::AwaitingPickup.can_confirm_pickup());
        assert!(!LoanStatus::AwaitingPickup.can_return());
        assert!(LoanStatus::Active.can_return());
        assert!(LoanStatus::Overdue.can_return());
        assert!(!LoanStatus::Finished.can_return());
        assert!(!LoanStatus::Finished.is_open());
    }

    #[test]
    fn test_decode_and_lateness() {
        let loan: Loan = serde_json::from_str(
            r#"{"id":4,"usuario":{"id":2,"nome":"Bia"},"livro":{"id":9,"titulo":"Iracema"},
                "dataEmprestimo":"2024-03-01T09:30:00","dataDevolucaoPrevista":"2024-03-15T09:30:00",
                "statusEmprestimo":"ATIVO"}"#,
        )
        .unwrap();
        assert_eq!(loan.status, LoanStatus::Active);
        assert!(!loan.is_late_at(Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap()));
        assert!(loan.is_late_at(Utc.with_ymd_and_hms(2024, 3, 16, 0, 0, 0).unwrap()));
    }
}
