//! Shared API client acting as the request interceptor

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use super::transport::{HttpMethod, HttpRequest, HttpResponse, Transport};
use crate::error::{AppError, AppResult};

/// Source of the bearer token attached to non-public requests
pub trait TokenProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Builds requests against the backend base URL and attaches the session
/// token to every non-public request
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            transport,
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a request for `path`, relative to the base URL
    pub fn request(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest::new(method, format!("{}{}", self.base_url, path))
    }

    /// Send a request, mapping non-2xx responses to [`AppError`]
    pub async fn send(&self, mut request: HttpRequest) -> AppResult<HttpResponse> {
        if !request.public {
            if let Some(token) = self.tokens.bearer_token() {
                request = request.bearer_token(&token);
            }
        }

        tracing::debug!(method = ?request.method, url = %request.url, "Sending request");

        let response = self.transport.execute(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            let error = AppError::from_response(response.status, &response.body);
            tracing::warn!(status = response.status, error = %error, "Request rejected");
            Err(error)
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        self.send(self.request(HttpMethod::Get, path)).await?.json()
    }

    pub async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> AppResult<Vec<T>> {
        let mut request = self.request(HttpMethod::Get, path);
        for (key, value) in query {
            request = request.query(*key, value.clone());
        }
        self.send(request).await?.json_list()
    }

    pub async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> AppResult<HttpResponse> {
        self.send(self.request(HttpMethod::Post, path).json(body)?).await
    }

    pub async fn put(&self, path: &str) -> AppResult<HttpResponse> {
        self.send(self.request(HttpMethod::Put, path)).await
    }

    pub async fn delete(&self, path: &str) -> AppResult<HttpResponse> {
        self.send(self.request(HttpMethod::Delete, path)).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repository::transport::MockTransport;

    pub(crate) struct FixedToken(pub Option<&'static str>);

    impl TokenProvider for FixedToken {
        fn bearer_token(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    #[tokio::test]
    async fn test_attaches_bearer_to_private_requests() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|req| {
                req.url == "http://api.test/reservas/minhas"
                    && req.header_value("Authorization") == Some("Bearer abc")
            })
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, "[]")));

        let client = ApiClient::new(
            "http://api.test/",
            Arc::new(transport),
            Arc::new(FixedToken(Some("abc"))),
        );
        let list: Vec<serde_json::Value> = client.get_list("/reservas/minhas", &[]).await.unwrap();
        assert!(list.is_empty());
    }

    #[tokio::test]
    async fn test_public_requests_skip_token() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .withf(|req| req.header_value("Authorization").is_none())
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, r#"{"token":"t"}"#)));

        let client = ApiClient::new(
            "http://api.test",
            Arc::new(transport),
            Arc::new(FixedToken(Some("abc"))),
        );
        let request = client
            .request(HttpMethod::Post, "/auth/login")
            .public();
        assert!(client.send(request).await.is_ok());
    }

    #[tokio::test]
    async fn test_maps_rejections() {
        let mut transport = MockTransport::new();
        transport
            .expect_execute()
            .returning(|_| Ok(HttpResponse::new(409, r#"{"message":"Sem exemplares"}"#)));

        let client = ApiClient::new("http://api.test", Arc::new(transport), Arc::new(FixedToken(None)));
        let err = client.put("/emprestimos/devolver/1").await.unwrap_err();
        assert_eq!(err.user_message(), "Sem exemplares");
    }
}
