mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn batch_reports_only_delivered_reminders() -> Result<()> {
    let server = common::TestServer::start().await?;
    server.add_patient("Ann Lee", "ann@example.com").await?;
    server.add_patient("Ben Ortiz", "ben@example.com").await?;
    server.add_patient("Cara Diaz", "cara@example.com").await?;
    server.mailer.fail_for("ben@example.com");

    let res = server.post("/send-email").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Emails sent");
    let mut sent: Vec<&str> = body["sentTo"].as_array().unwrap().iter().filter_map(Value::as_str).collect();
    sent.sort();
    assert_eq!(sent, vec!["ann@example.com", "cara@example.com"]);

    let reminder = &server.mailer.sent_to("ann@example.com")[0];
    assert_eq!(reminder.subject, "Hi Ann Lee, How Are You Feeling?");

    // Everyone now holds an open link, including Ben whose email bounced
    let body: Value = server.get("/trigger-emails").send().await?.json().await?;
    assert_eq!(body, json!({ "message": "No patients need reminders", "sentTo": [] }));
    Ok(())
}

#[tokio::test]
async fn recently_active_patients_are_skipped() -> Result<()> {
    let server = common::TestServer::start().await?;
    let recent = chrono::Utc::now().to_rfc3339();
    server
        .post("/patients")
        .json(&json!({ "name": "Dee Park", "email": "dee@example.com", "last_response_date": recent }))
        .send()
        .await?;
    server
        .post("/patients")
        .json(&json!({ "name": "Eli Moss", "email": "eli@example.com", "last_response_date": "2024-01-01T00:00:00Z" }))
        .send()
        .await?;

    let body: Value = server.get("/trigger-emails").send().await?.json().await?;
    assert_eq!(body["sentTo"], json!(["eli@example.com"]));
    assert!(server.mailer.sent_to("dee@example.com").is_empty());
    Ok(())
}
