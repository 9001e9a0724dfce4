use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use lettre::message::{Mailbox, MultiPart, SinglePart};
use reqwest::Method;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::{GoogleApi, required_str};
use crate::core::collaborators::NotificationSink;
use crate::core::models::{DeliveryReceipt, EmailRecipient};
use crate::errors::NewsletterError;

const GMAIL_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1/users/me";

/// Used when the profile lookup fails and no sender is configured.
pub const FALLBACK_SENDER: &str = "newsletter@example.com";
const UNKNOWN_SENDER: &str = "unknown@example.com";

fn mailbox(recipient: &EmailRecipient) -> Result<Mailbox, NewsletterError> {
    let address: lettre::Address = recipient.email.parse()?;
    Ok(Mailbox::new(recipient.name.clone(), address))
}

/// Build a MIME message and encode it the way `users.messages.send` expects.
///
/// With a plain-text body the message is multipart/alternative; otherwise it
/// is a single HTML part.
///
/// # Errors
///
/// Returns `SinkUnavailable` for an empty recipient list or an unparsable address.
pub fn build_raw_message(
    from: &str,
    recipients: &[EmailRecipient],
    subject: &str,
    html_body: &str,
    text_body: Option<&str>,
) -> Result<String, NewsletterError> {
    if recipients.is_empty() {
        return Err(NewsletterError::SinkUnavailable(
            "No email recipients given".to_string(),
        ));
    }

    let mut builder = lettre::Message::builder()
        .from(from.parse::<Mailbox>()?)
        .subject(subject);
    for recipient in recipients {
        builder = builder.to(mailbox(recipient)?);
    }

    let message = match text_body {
        Some(text) => builder.multipart(MultiPart::alternative_plain_html(
            text.to_string(),
            html_body.to_string(),
        ))?,
        None => builder.singlepart(SinglePart::html(html_body.to_string()))?,
    };

    Ok(URL_SAFE_NO_PAD.encode(message.formatted()))
}

/// Gmail sender for newsletter notifications.
#[derive(Debug, Clone)]
pub struct GmailClient {
    api: GoogleApi,
    configured_sender: Option<String>,
}

impl GmailClient {
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            api: GoogleApi::new(access_token),
            configured_sender: None,
        }
    }

    /// Send as `sender` instead of the authenticated account's address.
    #[must_use]
    pub fn with_sender(mut self, sender: Option<String>) -> Self {
        self.configured_sender = sender.filter(|s| !s.trim().is_empty());
        self
    }

    /// The configured sender, else the authenticated account's address.
    ///
    /// Never fails: a profile lookup error degrades to [`FALLBACK_SENDER`].
    pub async fn sender_email(&self) -> String {
        if let Some(sender) = &self.configured_sender {
            return sender.clone();
        }

        let url = format!("{GMAIL_API_BASE}/profile");
        match self.api.request(Method::GET, &url, None).await {
            Ok(profile) => profile
                .get("emailAddress")
                .and_then(Value::as_str)
                .unwrap_or(UNKNOWN_SENDER)
                .to_string(),
            Err(e) => {
                warn!("Could not get sender email: {}", e);
                FALLBACK_SENDER.to_string()
            }
        }
    }
}

#[async_trait]
impl NotificationSink for GmailClient {
    async fn send_email(
        &self,
        recipients: &[EmailRecipient],
        subject: &str,
        html_body: &str,
        text_body: Option<&str>,
    ) -> Result<DeliveryReceipt, NewsletterError> {
        let sender = self.sender_email().await;
        let raw = build_raw_message(&sender, recipients, subject, html_body, text_body)?;

        let url = format!("{GMAIL_API_BASE}/messages/send");
        let sent = self
            .api
            .request(Method::POST, &url, Some(&json!({ "raw": raw })))
            .await?;

        let receipt = DeliveryReceipt {
            message_id: required_str(&sent, "id")?,
            thread_id: sent
                .get("threadId")
                .and_then(Value::as_str)
                .map(ToString::to_string),
            recipients: recipients.iter().map(|r| r.email.clone()).collect(),
            subject: subject.to_string(),
            sent_at: Utc::now(),
        };

        info!(
            "Sent email {} to {} recipients",
            receipt.message_id,
            receipt.recipients.len()
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(raw: &str) -> String {
        String::from_utf8(URL_SAFE_NO_PAD.decode(raw).unwrap()).unwrap()
    }

    #[test]
    fn raw_message_is_multipart_alternative_with_plain_text() {
        let recipients = vec![
            EmailRecipient::new("a@example.com"),
            EmailRecipient {
                email: "b@example.com".into(),
                name: Some("Bea".into()),
            },
        ];
        let raw = build_raw_message(
            "bot@example.com",
            &recipients,
            "Weekly digest",
            "<p>hi</p>",
            Some("hi"),
        )
        .unwrap();

        let mime = decode(&raw);
        assert!(mime.contains("Subject: Weekly digest"));
        assert!(mime.contains("a@example.com"));
        assert!(mime.contains("Bea <b@example.com>"));
        assert!(mime.contains("multipart/alternative"));
        assert!(!raw.contains('+') && !raw.contains('/'));
    }

    #[test]
    fn html_only_message_is_single_part() {
        let raw = build_raw_message(
            "bot@example.com",
            &[EmailRecipient::new("a@example.com")],
            "s",
            "<p>hi</p>",
            None,
        )
        .unwrap();
        let mime = decode(&raw);
        assert!(mime.contains("text/html"));
        assert!(!mime.contains("multipart/alternative"));
    }

    #[test]
    fn empty_recipients_and_bad_addresses_are_rejected() {
        assert!(matches!(
            build_raw_message("bot@example.com", &[], "s", "h", None),
            Err(NewsletterError::SinkUnavailable(_))
        ));
        assert!(matches!(
            build_raw_message("bot@example.com", &[EmailRecipient::new("not an address")], "s", "h", None),
            Err(NewsletterError::SinkUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn configured_sender_skips_profile_lookup() {
        let client = GmailClient::new("token").with_sender(Some("news@team.dev".into()));
        assert_eq!(client.sender_email().await, "news@team.dev");

        let blank = GmailClient::new("token").with_sender(Some("  ".into()));
        assert!(blank.configured_sender.is_none());
    }
}
