use anyhow::Context;
use chrono::Utc;
use tracing::info;

use newsletter::core::config::AppConfig;
use newsletter::core::models::EmailRecipient;
use newsletter::google::{GmailClient, GoogleDocsClient};
use newsletter::slack::SlackClient;
use newsletter::workflow::NewsletterWorkflow;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the variables may come from the environment.
    let _ = dotenvy::dotenv();
    newsletter::setup_logging();

    let config = AppConfig::from_env().context("Failed to load configuration")?;

    let slack = SlackClient::new(config.slack_bot_token.clone());
    slack
        .test_connection()
        .await
        .context("Slack connection check failed")?;

    let docs = GoogleDocsClient::new(config.google_access_token.clone());
    let workflow = NewsletterWorkflow::from_config(slack, docs, &config);

    let outcome = if config.recipients.is_empty() {
        workflow.generate_newsletter().await?
    } else {
        let gmail = GmailClient::new(config.google_access_token.clone())
            .with_sender(config.sender_email.clone());
        let recipients: Vec<EmailRecipient> = config
            .recipients
            .iter()
            .map(EmailRecipient::new)
            .collect();
        workflow
            .generate_and_send(&gmail, &recipients, Utc::now())
            .await?
    };

    info!(
        document_url = %outcome.document.url,
        title = %outcome.document.title,
        channels_processed = outcome.channels_processed,
        channels_skipped = outcome.channels_skipped,
        total_messages = outcome.total_messages,
        important_messages = outcome.important_messages,
        date_range = %outcome.date_range,
        emailed = outcome.delivery.is_some(),
        "Newsletter generated"
    );
    println!("{}", outcome.document.url);

    Ok(())
}
