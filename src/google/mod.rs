//! Google Docs, Drive and Gmail REST clients.
//!
//! Access tokens come from configuration; the OAuth flow that produces them
//! lives outside this crate.

pub mod docs;
pub mod gmail;

pub use docs::{GoogleDocsClient, ShareRole};
pub use gmail::GmailClient;

use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use std::sync::LazyLock;
use std::time::Duration;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::warn;

use crate::errors::NewsletterError;

static HTTP_CLIENT: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
});

/// Bearer-authenticated JSON transport shared by the Google clients.
#[derive(Debug, Clone)]
pub(crate) struct GoogleApi {
    access_token: String,
}

impl GoogleApi {
    pub(crate) fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    /// Send one request, retrying throttling and server errors.
    ///
    /// Returns `Value::Null` for empty bodies (Drive deletes answer 204).
    pub(crate) async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Value, NewsletterError> {
        let strategy = ExponentialBackoff::from_millis(100).map(jitter).take(5);

        RetryIf::spawn(
            strategy,
            || {
                let method = method.clone();
                async move {
                    let mut req = HTTP_CLIENT
                        .request(method, url)
                        .bearer_auth(&self.access_token);
                    if let Some(body) = body {
                        req = req.json(body);
                    }

                    let resp = req.send().await?;
                    let status = resp.status();
                    let text = resp.text().await?;

                    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                        warn!("Google API {} returned {}, retrying", url, status);
                        return Err(NewsletterError::HttpError(format!("{url} HTTP {status}")));
                    }
                    if !status.is_success() {
                        return Err(NewsletterError::SinkUnavailable(format!(
                            "{url} HTTP {status}: {text}"
                        )));
                    }
                    if text.trim().is_empty() {
                        return Ok(Value::Null);
                    }
                    Ok(serde_json::from_str(&text)?)
                }
            },
            NewsletterError::is_retryable,
        )
        .await
    }
}

/// Read a required string field out of a provider response.
pub(crate) fn required_str(body: &Value, field: &str) -> Result<String, NewsletterError> {
    body.get(field)
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| NewsletterError::ParseError(format!("response has no `{field}`")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_str_reports_missing_field() {
        let body = json!({"documentId": "abc"});
        assert_eq!(required_str(&body, "documentId").unwrap(), "abc");
        assert!(matches!(
            required_str(&body, "id"),
            Err(NewsletterError::ParseError(_))
        ));
    }
}
