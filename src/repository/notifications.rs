//! Notification endpoints

use super::client::ApiClient;
use crate::{error::AppResult, models::notification::Notification};

#[derive(Clone)]
pub struct NotificationsRepository {
    client: ApiClient,
}

impl NotificationsRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn mine(&self) -> AppResult<Vec<Notification>> {
        self.client.get_list("/notificacoes/minhas", &[]).await
    }

    pub async fn mark_read(&self, id: i64) -> AppResult<()> {
        self.client.put(&format!("/notificacoes/{}/lida", id)).await?;
        Ok(())
    }

    pub async fn mark_all_read(&self) -> AppResult<()> {
        self.client.put("/notificacoes/todas/lidas").await?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> AppResult<()> {
        self.client
            .delete(&format!("/notificacoes/{}/deletar", id))
            .await?;
        Ok(())
    }

    pub async fn delete_all(&self) -> AppResult<()> {
        self.client.delete("/notificacoes/excluir/todas").await?;
        Ok(())
    }
}
