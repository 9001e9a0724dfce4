use slack_morphism::errors::SlackClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NewsletterError {
    #[error("Message source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Document or notification sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("Missing configuration: {0}")]
    ConfigurationMissing(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Failed to parse provider response: {0}")]
    ParseError(String),
}

impl NewsletterError {
    /// Transport failures may succeed on a later attempt; everything else is permanent.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, NewsletterError::HttpError(_))
    }
}

impl From<SlackClientError> for NewsletterError {
    fn from(error: SlackClientError) -> Self {
        NewsletterError::SourceUnavailable(error.to_string())
    }
}

impl From<reqwest::Error> for NewsletterError {
    fn from(error: reqwest::Error) -> Self {
        NewsletterError::HttpError(error.to_string())
    }
}

impl From<serde_json::Error> for NewsletterError {
    fn from(error: serde_json::Error) -> Self {
        NewsletterError::ParseError(error.to_string())
    }
}

impl From<lettre::error::Error> for NewsletterError {
    fn from(error: lettre::error::Error) -> Self {
        NewsletterError::SinkUnavailable(format!("Failed to build email: {error}"))
    }
}

impl From<lettre::address::AddressError> for NewsletterError {
    fn from(error: lettre::address::AddressError) -> Self {
        NewsletterError::SinkUnavailable(format!("Invalid email address: {error}"))
    }
}
