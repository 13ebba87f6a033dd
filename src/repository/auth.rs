//! Authentication endpoints (all public)

use serde_json::json;

use super::{client::ApiClient, transport::HttpMethod};
use crate::{
    error::AppResult,
    models::user::{Credentials, LoginResponse, PasswordReset, SignupRequest},
};

#[derive(Clone)]
pub struct AuthRepository {
    client: ApiClient,
}

impl AuthRepository {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for a bearer token
    pub async fn login(&self, credentials: &Credentials) -> AppResult<LoginResponse> {
        let request = self
            .client
            .request(HttpMethod::Post, "/auth/login")
            .public()
            .json(credentials)?;
        self.client.send(request).await?.json()
    }

    pub async fn signup(&self, data: &SignupRequest) -> AppResult<()> {
        let request = self
            .client
            .request(HttpMethod::Post, "/auth/signup")
            .public()
            .json(data)?;
        self.client.send(request).await?;
        Ok(())
    }

    /// First recovery step: check that the e-mail belongs to an account
    pub async fn request_recovery(&self, email: &str) -> AppResult<()> {
        let request = self
            .client
            .request(HttpMethod::Post, "/auth/recuperarSenha")
            .public()
            .json(&json!({ "email": email }))?;
        self.client.send(request).await?;
        Ok(())
    }

    /// Second recovery step; returns the backend confirmation text
    pub async fn reset_password(&self, reset: &PasswordReset) -> AppResult<String> {
        let request = self
            .client
            .request(HttpMethod::Post, "/auth/novaSenha")
            .public()
            .json(reset)?;
        Ok(self.client.send(request).await?.text())
    }
}
