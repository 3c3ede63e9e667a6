use std::time::Duration;

use anyhow::Context;
use clap::Args;
use serde_json::Value;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;
use crate::config;

#[derive(Args)]
pub struct TriggerArgs {
    #[arg(long, default_value = "http://localhost:3000", help = "Server base URL")]
    pub url: String,

    #[arg(long, help = "Dashboard JWT (minted from the local secret if omitted)")]
    pub token: Option<String>,
}

pub async fn handle(args: TriggerArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let token = match args.token {
        Some(token) => token,
        None => {
            let security = &config::config().security;
            generate_jwt(&Claims::therapist("crm-cli", 1), &security.jwt_secret)?
        }
    };

    let url = format!("{}/send-email", args.url.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(&url)
        .bearer_auth(token)
        .timeout(Duration::from_secs(120))
        .send()
        .await
        .with_context(|| format!("request to {} failed", url))?;

    let status = response.status();
    let body: Value = response.json().await.context("server returned a non-JSON body")?;
    let message = body.get("message").and_then(Value::as_str).unwrap_or("No message");

    if !status.is_success() {
        output_error(&output_format, message, body.get("code").and_then(Value::as_str))?;
        anyhow::bail!("server responded with {}", status);
    }

    output_success(&output_format, message, Some(body.clone()))
}
