//! Loan endpoints

use super::client::ApiClient;
use crate::{
    error::AppResult,
    models::loan::{CreateLoan, Loan},
};

#[derive(Clone)]
pub struct LoansRepository {
    client: ApiClient,
}

impl LoansRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_all(&self) -> AppResult<Vec<Loan>> {
        self.client.get_list("/emprestimos", &[]).await
    }

    pub async fn for_user(&self, user_id: i64) -> AppResult<Vec<Loan>> {
        self.client
            .get_list(&format!("/emprestimos/usuario/{}", user_id), &[])
            .await
    }

    /// Register a loan awaiting pickup
    pub async fn register(&self, user_id: i64, book_id: i64) -> AppResult<()> {
        let body = CreateLoan {
            id_usuario: user_id,
            id_livro: book_id,
        };
        self.client.post_json("/emprestimos/registrar", &body).await?;
        Ok(())
    }

    pub async fn confirm_pickup(&self, loan_id: i64) -> AppResult<()> {
        self.client
            .put(&format!("/emprestimos/confirmarRetirada/{}", loan_id))
            .await?;
        Ok(())
    }

    pub async fn return_loan(&self, loan_id: i64) -> AppResult<()> {
        self.client
            .put(&format!("/emprestimos/devolver/{}", loan_id))
            .await?;
        Ok(())
    }
}
