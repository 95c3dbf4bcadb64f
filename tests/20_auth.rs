mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn login_with_missing_password_is_400() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/login", server.base_url))
        .json(&json!({ "username": common::TEST_USER }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "error");
    assert!(
        body["message"].as_str().unwrap_or("").contains("password"),
        "message should name the missing field: {}",
        body
    );

    Ok(())
}

#[tokio::test]
async fn login_with_wrong_password_is_401() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/login", server.base_url))
        .json(&json!({ "username": common::TEST_USER, "password": "nope" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn login_with_unknown_user_is_401() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/login", server.base_url))
        .json(&json!({ "username": "ghost", "password": common::TEST_PASSWORD }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn protected_endpoint_without_token_is_401() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/get_recap_values", server.base_url))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "error");

    Ok(())
}

#[tokio::test]
async fn protected_endpoint_with_wrong_scheme_is_401() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/get_recap_values", server.base_url))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn protected_endpoint_with_unknown_token_is_401() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/get_recap_values", server.base_url))
        .header("Authorization", "Bearer 0000000000000000")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn token_lifecycle_login_use_logout() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let token = common::login(server).await?;
    assert_eq!(token.len(), 64, "expected a 64-hex-char token");

    // Token is accepted: the gateway may 5xx (no database behind the test
    // server) but must not 401
    let res = client
        .get(format!("{}/get_recap_values", server.base_url))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await?;
    assert_ne!(
        res.status(),
        StatusCode::UNAUTHORIZED,
        "live token was rejected"
    );

    // Logout revokes it
    let res = client
        .post(format!("{}/logout", server.base_url))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "success");

    // Same token afterwards is rejected
    let res = client
        .get(format!("{}/get_recap_values", server.base_url))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn tokens_are_distinct_per_login() -> Result<()> {
    let server = common::ensure_server().await?;

    let t1 = common::login(server).await?;
    let t2 = common::login(server).await?;
    assert_ne!(t1, t2);

    Ok(())
}
