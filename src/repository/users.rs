//! User administration and profile endpoints

use super::client::ApiClient;
use crate::{
    error::AppResult,
    models::user::{Role, User},
};

#[derive(Clone)]
pub struct UsersRepository {
    client: ApiClient,
}

impl UsersRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_all(&self) -> AppResult<Vec<User>> {
        self.client.get_list("/admin/listarUsuarios", &[]).await
    }

    pub async fn search_by_name(&self, name: &str) -> AppResult<Vec<User>> {
        self.client
            .get_list("/admin/buscar", &[("nome", name.to_string())])
            .await
    }

    pub async fn by_role(&self, role: Role) -> AppResult<Vec<User>> {
        self.client
            .get_list(&format!("/admin/filtrar/{}", role.as_str()), &[])
            .await
    }

    /// Profile of the signed-in user
    pub async fn my_profile(&self) -> AppResult<User> {
        self.client.get_json("/usuario/meuPerfil").await
    }
}
