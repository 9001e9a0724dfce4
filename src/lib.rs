/// Newsletter - builds a weekly digest of Slack activity as a Google Doc.
///
/// The bot reads recent messages from every channel it belongs to, keeps the
/// important ones, groups them by topic, pulls out date mentions, and
/// publishes the result as a Google Doc. It can also email a link to the
/// document through Gmail.
///
/// # Architecture
///
/// The system uses:
/// - `analysis` for the stateless heuristics (importance, topics, dates, mentions)
/// - slack-morphism and the Slack Web API as the message source
/// - Google Docs/Drive/Gmail REST endpoints as the document and notification sinks
/// - a generic `NewsletterWorkflow` wiring them together
/// - Tokio for async runtime
///
/// # Example
///
/// ```no_run
/// use newsletter::core::config::AppConfig;
/// use newsletter::google::GoogleDocsClient;
/// use newsletter::slack::SlackClient;
/// use newsletter::workflow::NewsletterWorkflow;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     newsletter::setup_logging();
///
///     let config = AppConfig::from_env()?;
///     let workflow = NewsletterWorkflow::from_config(
///         SlackClient::new(config.slack_bot_token.clone()),
///         GoogleDocsClient::new(config.google_access_token.clone()),
///         &config,
///     );
///
///     let outcome = workflow.generate_newsletter().await?;
///     println!("Newsletter: {}", outcome.document.url);
///     Ok(())
/// }
/// ```
// Module declarations
pub mod analysis;
pub mod core;
pub mod errors;
pub mod google;
pub mod slack;
pub mod utils;
pub mod workflow;

/// Configure structured JSON logging.
///
/// The filter comes from `RUST_LOG` and defaults to `info`. Calling this
/// more than once is harmless; later calls leave the first subscriber in place.
///
/// # Example
///
/// ```
/// newsletter::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
