//! In-memory fake backend shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use tokio::sync::Notify;

use estante_client::{
    config::AppConfig,
    repository::{HttpMethod, HttpRequest, HttpResponse, Transport},
    services::session::MemoryTokenStore,
    AppResult, AppState,
};

pub const BASE_URL: &str = "http://backend.test";

type Handler = Box<dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync>;

/// Routes requests by method and path, recording every call
#[derive(Default)]
pub struct FakeBackend {
    routes: Mutex<HashMap<(HttpMethod, String), Handler>>,
    gates: Mutex<HashMap<(HttpMethod, String), Arc<Notify>>>,
    held: Mutex<HashMap<(HttpMethod, String), Arc<Notify>>>,
    calls: Mutex<Vec<HttpRequest>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Fixed reply
    pub fn on(&self, method: HttpMethod, path: &str, status: u16, body: &str) {
        let body = body.to_string();
        self.on_with(method, path, move |_| HttpResponse::new(status, body.clone()));
    }

    /// Reply computed per request
    pub fn on_with<F>(&self, method: HttpMethod, path: &str, handler: F)
    where
        F: Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Box::new(handler));
    }

    /// Hold requests to this route until the returned signal fires
    pub fn gate(&self, method: HttpMethod, path: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert((method, path.to_string()), notify.clone());
        notify
    }

    /// Hold only the next request to this route until the signal fires
    pub fn hold_next(&self, method: HttpMethod, path: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.held
            .lock()
            .unwrap()
            .insert((method, path.to_string()), notify.clone());
        notify
    }

    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: HttpMethod, path: &str) -> usize {
        let url = format!("{}{}", BASE_URL, path);
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn execute(&self, request: HttpRequest) -> AppResult<HttpResponse> {
        let path = request
            .url
            .strip_prefix(BASE_URL)
            .unwrap_or(&request.url)
            .to_string();
        let key = (request.method, path);
        self.calls.lock().unwrap().push(request.clone());

        // Answered on arrival; a gate only delays delivery
        let response = match self.routes.lock().unwrap().get(&key) {
            Some(handler) => handler(&request),
            None => HttpResponse::new(404, format!(r#"{{"message":"no route {:?} {}"}}"#, key.0, key.1)),
        };

        let held = self.held.lock().unwrap().remove(&key);
        let gate = held.or_else(|| self.gates.lock().unwrap().get(&key).cloned());
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(response)
    }
}

/// Bearer token as the backend would issue it
pub fn token(id: i64, role: &str, ttl_secs: i64) -> String {
    let now = Utc::now().timestamp();
    let claims = json!({
        "sub": format!("user{}@estante.test", id),
        "id": id,
        "role": role,
        "nome": format!("User {}", id),
        "iat": now,
        "exp": now + ttl_secs,
    });
    encode(&Header::default(), &claims, &EncodingKey::from_secret(b"backend-secret")).unwrap()
}

pub fn app(backend: &Arc<FakeBackend>) -> AppState {
    let mut config = AppConfig::default();
    config.api.base_url = BASE_URL.to_string();
    AppState::new(config, backend.clone(), Arc::new(MemoryTokenStore::default()))
}

/// App with a signed-in user
pub fn signed_in(backend: &Arc<FakeBackend>, id: i64, role: &str) -> AppState {
    let app = app(backend);
    app.session().login(&token(id, role, 3600)).unwrap();
    app
}

pub fn reservation(id: i64, user: i64, book: i64, at: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "usuario": {"id": user, "nome": format!("Reader {}", user)},
        "livro": {"id": book, "titulo": format!("Book {}", book)},
        "dataReserva": at,
        "statusReserva": status,
    })
}

pub fn loan(id: i64, book: i64, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "usuario": {"id": 30, "nome": "Reader 30"},
        "livro": {"id": book, "titulo": format!("Book {}", book)},
        "dataEmprestimo": "2024-05-01T10:00:00",
        "dataDevolucaoPrevista": "2024-05-15T10:00:00",
        "statusEmprestimo": status,
    })
}

pub fn fine(id: i64, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "tituloLivro": format!("Book {}", id),
        "usuarioNome": "Reader",
        "valor": 7.5,
        "statusMulta": status,
    })
}
