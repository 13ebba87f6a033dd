//! Session holder
//!
//! Owns the bearer token and the identity decoded from it. This is the only
//! writer of session state; pages read it through [`SessionService::identity`]
//! or subscribe to changes.
//!
//! The token is decoded without verifying its signature: the client never
//! holds the signing secret and the backend re-validates every request. The
//! expiry claim is enforced, and an invalid or expired token ends the session
//! silently.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tokio::sync::watch;

use crate::{
    error::{AppError, AppResult},
    models::user::{Identity, SessionClaims},
    repository::TokenProvider,
};

/// Persistent storage for the bearer token
pub trait TokenStore: Send + Sync {
    fn load(&self) -> AppResult<Option<String>>;
    fn save(&self, token: &str) -> AppResult<()>;
    fn clear(&self) -> AppResult<()>;
}

/// Token kept in a file between runs
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> AppResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, token: &str) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)?;
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Token kept in memory only
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> AppResult<Option<String>> {
        Ok(self.token.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn save(&self, token: &str) -> AppResult<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> AppResult<()> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Decode a bearer token into an identity, rejecting expired tokens
pub fn decode_token(token: &str) -> AppResult<Identity> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_aud = false;
    validation.leeway = 0;
    validation.required_spec_claims = HashSet::from(["exp".to_string()]);

    let data = decode::<SessionClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| AppError::Session(format!("Invalid session token: {}", e)))?;

    Identity::try_from(data.claims)
}

pub struct SessionService {
    store: Arc<dyn TokenStore>,
    token: RwLock<Option<String>>,
    identity: watch::Sender<Option<Identity>>,
}

impl SessionService {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            store,
            token: RwLock::new(None),
            identity,
        }
    }

    /// Restore the session from storage on startup
    pub fn restore(&self) -> Option<Identity> {
        let token = match self.store.load() {
            Ok(Some(token)) => token,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read stored session: {}", e);
                return None;
            }
        };

        match decode_token(&token) {
            Ok(identity) => {
                tracing::info!(user_id = identity.id, "Session restored");
                self.publish(Some(token), Some(identity.clone()));
                Some(identity)
            }
            Err(e) => {
                tracing::info!("Discarding stored session: {}", e);
                self.clear();
                None
            }
        }
    }

    /// Store a freshly issued token and publish the identity it carries
    pub fn login(&self, token: &str) -> AppResult<Identity> {
        let identity = decode_token(token)?;
        self.store.save(token)?;
        tracing::info!(user_id = identity.id, role = %identity.role, "Signed in");
        self.publish(Some(token.to_string()), Some(identity.clone()));
        Ok(identity)
    }

    pub fn logout(&self) {
        tracing::info!("Signed out");
        self.clear();
    }

    /// Current identity, if the session is still valid
    pub fn identity(&self) -> Option<Identity> {
        let identity = self.identity.borrow().clone()?;
        if identity.is_expired_at(Utc::now()) {
            tracing::info!(user_id = identity.id, "Session expired");
            self.clear();
            return None;
        }
        Some(identity)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    /// Identity or an `Unauthorized` error for pages that need a session
    pub fn require(&self) -> AppResult<Identity> {
        self.identity()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }

    fn publish(&self, token: Option<String>, identity: Option<Identity>) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = token;
        self.identity.send_replace(identity);
    }

    fn clear(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear stored session: {}", e);
        }
        self.publish(None, None);
    }
}

impl TokenProvider for SessionService {
    fn bearer_token(&self) -> Option<String> {
        self.identity()?;
        self.token.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::user::Role;
    use jsonwebtoken::{encode, EncodingKey, Header};

    pub(crate) fn token_for(id: i64, role: Role, ttl_secs: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            sub: format!("user{}@example.com", id),
            id,
            role,
            nome: Some(format!("User {}", id)),
            exp: now + ttl_secs,
            iat: Some(now),
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"server-secret")).unwrap()
    }

    #[test]
    fn test_decode_ignores_signature_but_checks_expiry() {
        let identity = decode_token(&token_for(5, Role::Librarian, 3600)).unwrap();
        assert_eq!(identity.id, 5);
        assert!(identity.is_librarian());
        assert_eq!(identity.display_name(), "User 5");

        assert!(decode_token(&token_for(5, Role::Reader, -3600)).is_err());
        assert!(decode_token("not-a-token").is_err());
    }

    #[test]
    fn test_restore_clears_invalid_token() {
        let store = Arc::new(MemoryTokenStore::with_token("garbage"));
        let session = SessionService::new(store.clone());

        assert!(session.restore().is_none());
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_restore_clears_expired_token() {
        let store = Arc::new(MemoryTokenStore::with_token(token_for(1, Role::Reader, -120)));
        let session = SessionService::new(store.clone());

        assert!(session.restore().is_none());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_login_publishes_identity_and_logout_clears() {
        let store = Arc::new(MemoryTokenStore::default());
        let session = SessionService::new(store.clone());
        let mut rx = session.subscribe();

        let token = token_for(9, Role::Reader, 3600);
        let identity = session.login(&token).unwrap();
        assert_eq!(identity.id, 9);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().as_ref().map(|i| i.id), Some(9));
        assert_eq!(session.bearer_token(), Some(token.clone()));
        assert_eq!(store.load().unwrap(), Some(token));

        session.logout();
        assert!(session.identity().is_none());
        assert!(session.bearer_token().is_none());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_login_rejects_bad_token_without_touching_storage() {
        let store = Arc::new(MemoryTokenStore::with_token("previous"));
        let session = SessionService::new(store.clone());

        assert!(session.login("broken").is_err());
        assert_eq!(store.load().unwrap().as_deref(), Some("previous"));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("estante-test-{}", std::process::id()));
        let store = FileTokenStore::new(dir.join("nested/token"));

        assert!(store.load().unwrap().is_none());
        store.save("abc").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));
        store.clear().unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        let _ = fs::remove_dir_all(dir);
    }
}
