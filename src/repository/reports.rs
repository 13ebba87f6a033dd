//! Report endpoints

use super::{client::ApiClient, transport::HttpMethod};
use crate::{
    error::AppResult,
    models::report::{DashboardStats, RankedBook, ReportPeriod},
};

#[derive(Clone)]
pub struct ReportsRepository {
    client: ApiClient,
}

impl ReportsRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn dashboard(&self, period: &ReportPeriod) -> AppResult<DashboardStats> {
        let mut request = self.client.request(HttpMethod::Get, "/relatorios/dashboard");
        for (key, value) in period.query() {
            request = request.query(key, value);
        }
        self.client.send(request).await?.json()
    }

    pub async fn top_loans(&self, period: &ReportPeriod) -> AppResult<Vec<RankedBook>> {
        self.ranking("/relatorios/top-emprestimos", period).await
    }

    pub async fn top_reservations(&self, period: &ReportPeriod) -> AppResult<Vec<RankedBook>> {
        self.ranking("/relatorios/top-reservas", period).await
    }

    async fn ranking(&self, path: &str, period: &ReportPeriod) -> AppResult<Vec<RankedBook>> {
        let query = period.query();
        let query: Vec<(&str, String)> = query.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
        self.client.get_list(path, &query).await
    }
}
