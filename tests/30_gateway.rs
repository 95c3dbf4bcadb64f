mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

/// Identifier validation must reject before any database work: these all
/// come back 400 even though the test server has no reachable database.
#[tokio::test]
async fn malformed_table_identifier_is_400_without_database() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::login(server).await?;

    for evil in ["servers; DROP TABLE servers", "`servers`", "a.b", "1abc"] {
        let res = client
            .post(format!("{}/get_info_server", server.base_url))
            .header("Authorization", format!("Bearer {}", token))
            .json(&json!({ "db_table": evil, "server_name": "db01" }))
            .send()
            .await?;

        assert_eq!(
            res.status(),
            StatusCode::BAD_REQUEST,
            "identifier {:?} was not rejected",
            evil
        );
        let body = res.json::<serde_json::Value>().await?;
        assert_eq!(body["status"], "error");
    }

    Ok(())
}

#[tokio::test]
async fn well_formed_but_unlisted_table_is_400() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::login(server).await?;

    let res = client
        .post(format!("{}/get_info_server", server.base_url))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "db_table": "mysql_user", "server_name": "db01" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn insert_with_missing_field_is_400() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::login(server).await?;

    // sgbd_type missing
    let res = client
        .post(format!("{}/insert", server.base_url))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "db_table": "servers",
            "server_name": "db01",
            "server_ip": "10.0.0.1",
        }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert!(
        body["message"].as_str().unwrap_or("").contains("sgbd_type"),
        "message should name the missing field: {}",
        body
    );

    Ok(())
}

#[tokio::test]
async fn insert_without_body_is_400() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::login(server).await?;

    let res = client
        .post(format!("{}/insert", server.base_url))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "error");

    Ok(())
}

#[tokio::test]
async fn delete_with_malformed_table_is_400() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::login(server).await?;

    let res = client
        .delete(format!("{}/delete", server.base_url))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "db_table": "servers--", "server_ip": "10.0.0.1" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn recap_values_with_empty_mapping_is_400() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::login(server).await?;

    let res = client
        .post(format!("{}/insert_recap_values", server.base_url))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "server_name": "db01", "value_data": {} }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

/// A valid descriptor reaches the (unreachable) database and surfaces the
/// driver failure as a 500 with the uniform error body - not a crash, not
/// a hung worker.
#[tokio::test]
async fn valid_request_with_database_down_is_500() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::login(server).await?;

    let res = client
        .post(format!("{}/get_info_server", server.base_url))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "db_table": "servers", "server_name": "db01" }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "error");
    assert!(body.get("message").is_some());

    Ok(())
}

#[tokio::test]
async fn feed_endpoint_with_database_down_is_500_not_401() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let token = common::login(server).await?;

    let res = client
        .post(format!("{}/feed_dbai", server.base_url))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "args": ["db01"] }))
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}
