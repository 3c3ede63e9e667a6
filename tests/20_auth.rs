mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use therapy_crm::auth::{generate_jwt, Claims};

#[tokio::test]
async fn dashboard_routes_require_bearer_token() -> Result<()> {
    let server = common::TestServer::start().await?;
    let client = server.anonymous();

    for res in [
        client.get(server.url("/patients")).send().await?,
        client.post(server.url("/patients")).json(&json!({"name": "x", "email": "x@y.z"})).send().await?,
        client.delete(server.url("/patients?id=00000000-0000-0000-0000-000000000000")).send().await?,
        client.post(server.url("/send-email")).send().await?,
        client.get(server.url("/trigger-emails")).send().await?,
        client.post(server.url("/notify-session")).send().await?,
    ] {
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = res.json().await?;
        assert_eq!(body["code"], "UNAUTHORIZED");
        assert_eq!(body["error"], true);
    }
    Ok(())
}

#[tokio::test]
async fn token_signed_with_another_secret_is_rejected() -> Result<()> {
    let server = common::TestServer::start().await?;
    let forged = generate_jwt(&Claims::therapist("mallory", 1), "not-the-secret")?;

    let res = server
        .anonymous()
        .get(server.url("/patients"))
        .bearer_auth(forged)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn form_routes_need_no_login() -> Result<()> {
    let server = common::TestServer::start().await?;

    let res = server.anonymous().get(server.url("/form/not-a-token")).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "INVALID_TOKEN");

    let res = server
        .anonymous()
        .post(server.url("/submit-form"))
        .json(&json!({ "token": "not-a-token", "mood": 3 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
