//! Checks against a running backend

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080";

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_catalog_is_public_json() {
    let client = Client::new();

    let response = client
        .get(format!("{}/livros", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    // The catalog may require a session depending on the deployment
    assert!(response.status().is_success() || response.status() == 401 || response.status() == 403);
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({
            "email": "nobody@example.com",
            "senha": "wrong"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_client_error());
}

#[tokio::test]
#[ignore]
async fn test_login_returns_token() {
    let email = std::env::var("ESTANTE_TEST_EMAIL").expect("ESTANTE_TEST_EMAIL not set");
    let password = std::env::var("ESTANTE_TEST_PASSWORD").expect("ESTANTE_TEST_PASSWORD not set");
    let client = Client::new();

    let response = client
        .post(format!("{}/auth/login", BASE_URL))
        .json(&json!({ "email": email, "senha": password }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    let token = body["token"].as_str().expect("No token in response");
    let identity = estante_client::services::session::decode_token(token).expect("Undecodable token");
    assert!(!identity.email.is_empty());
}
