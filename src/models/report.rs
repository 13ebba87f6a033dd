//! Report models for the librarian dashboard

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Headline counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_livros: i64,
    pub total_usuarios: i64,
    pub emprestimos_ativos: i64,
    pub reservas_ativas: i64,
}

/// Entry of a top-N ranking (most loaned / most reserved titles)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedBook {
    pub titulo: String,
    #[serde(alias = "quantidade", alias = "total")]
    pub count: i64,
}

/// Optional date window applied to every report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportPeriod {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl ReportPeriod {
    /// Query parameters; unset bounds are omitted
    pub fn query(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(start) = self.start {
            params.push(("startDate".to_string(), start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end {
            params.push(("endDate".to_string(), end.format("%Y-%m-%d").to_string()));
        }
        params
    }

    pub fn is_valid(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }
}
