//! Authentication service: login, logout, signup and password recovery

use std::sync::Arc;

use validator::Validate;

use super::{notifications::NotificationCounter, session::SessionService};
use crate::{
    error::{AppError, AppResult},
    models::user::{Credentials, Identity, PasswordReset, Role, SignupRequest},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    session: Arc<SessionService>,
    notifications: Arc<NotificationCounter>,
}

impl AuthService {
    pub fn new(
        repository: Repository,
        session: Arc<SessionService>,
        notifications: Arc<NotificationCounter>,
    ) -> Self {
        Self {
            repository,
            session,
            notifications,
        }
    }

    /// Authenticate, open the session and load the unread count
    pub async fn login(&self, email: &str, password: &str) -> AppResult<Identity> {
        let credentials = Credentials {
            email: email.trim().to_string(),
            senha: password.to_string(),
        };
        credentials.validate()?;

        let response = self.repository.auth.login(&credentials).await?;
        let identity = self.session.login(&response.token)?;
        self.notifications.refresh().await;

        Ok(identity)
    }

    pub fn logout(&self) {
        self.session.logout();
        self.notifications.reset();
    }

    /// Register a new account; the administrative code is only kept for
    /// librarian accounts
    pub async fn signup(&self, request: SignupRequest) -> AppResult<()> {
        let request = request.normalized();
        request.validate()?;
        if request.role == Role::Librarian
            && request
                .codigo_administrativo
                .as_deref()
                .map_or(true, |code| code.trim().is_empty())
        {
            return Err(AppError::invalid_field(
                "codigoAdministrativo",
                "Administrative code is required for librarian accounts",
            ));
        }

        self.repository.auth.signup(&request).await?;
        tracing::info!(email = %request.email, role = %request.role, "Account created");
        Ok(())
    }

    /// First recovery step
    pub async fn request_recovery(&self, email: &str) -> AppResult<()> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AppError::invalid_field("email", "E-mail is required"));
        }
        self.repository.auth.request_recovery(email).await
    }

    /// Second recovery step; the confirmation must match locally
    pub async fn reset_password(
        &self,
        email: &str,
        new_password: &str,
        confirmation: &str,
    ) -> AppResult<String> {
        if new_password != confirmation {
            return Err(AppError::invalid_field("confirmacao", "Passwords do not match"));
        }
        let reset = PasswordReset {
            email: email.trim().to_string(),
            nova_senha: new_password.to_string(),
        };
        reset.validate()?;

        let message = self.repository.auth.reset_password(&reset).await?;
        tracing::info!(email = %reset.email, "Password reset");
        Ok(message)
    }
}
