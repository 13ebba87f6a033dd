//! Fine endpoints

use super::client::ApiClient;
use crate::{
    error::AppResult,
    models::fine::{Fine, FineStatus},
};

#[derive(Clone)]
pub struct FinesRepository {
    client: ApiClient,
}

impl FinesRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_all(&self) -> AppResult<Vec<Fine>> {
        self.client.get_list("/multas", &[]).await
    }

    pub async fn get_by_id(&self, id: i64) -> AppResult<Fine> {
        self.client.get_json(&format!("/multas/{}", id)).await
    }

    pub async fn by_status(&self, status: FineStatus) -> AppResult<Vec<Fine>> {
        self.client
            .get_list(&format!("/multas/status/{}", status.as_str()), &[])
            .await
    }

    pub async fn for_user(&self, user_id: i64) -> AppResult<Vec<Fine>> {
        self.client
            .get_list(&format!("/multas/usuario/{}", user_id), &[])
            .await
    }

    pub async fn pay(&self, id: i64) -> AppResult<()> {
        self.client.put(&format!("/multas/pagar/{}", id)).await?;
        Ok(())
    }
}
