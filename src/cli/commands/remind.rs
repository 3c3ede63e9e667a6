use chrono::Utc;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;
use crate::state::AppState;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let state = AppState::from_config(config::config().clone()).await?;
    let report = state.reminders().run(Utc::now()).await?;

    if let OutputFormat::Text = output_format {
        for address in &report.failed {
            eprintln!("✗ {}", address);
        }
    }

    output_success(
        &output_format,
        report.message(),
        Some(json!({
            "eligible": report.eligible,
            "sentTo": report.sent_to,
            "failed": report.failed,
        })),
    )
}
