//! Narrow interfaces to the chat, document and mail providers.
//!
//! The workflow only talks to these traits, so tests can swap the real
//! clients for in-memory fakes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use super::models::{ChannelInfo, DeliveryReceipt, DocumentInfo, EmailRecipient, Message, UserInfo};
use crate::errors::NewsletterError;
use crate::workflow::deliver::document_link_email;

/// Resolves a user identifier to names.
#[async_trait]
pub trait UserLookup: Send + Sync {
    /// # Errors
    ///
    /// Returns `SourceUnavailable` when the directory cannot be reached.
    async fn lookup_user(&self, user_id: &str) -> Result<UserInfo, NewsletterError>;
}

/// Where messages come from.
#[async_trait]
pub trait MessageSource: UserLookup {
    /// Channels the bot is a member of.
    ///
    /// # Errors
    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, NewsletterError>;

    /// Messages posted in `channel_id` between `start` and `end`, oldest
    /// provider ordering preserved. Bot and system entries are already removed.
    ///
    /// # Errors
    async fn fetch_messages(
        &self,
        channel_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Message>, NewsletterError>;
}

/// Persists rendered documents.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// # Errors
    async fn create_document(&self, title: &str, body: &str)
    -> Result<DocumentInfo, NewsletterError>;

    /// Insert `text` at the start of the document body.
    ///
    /// # Errors
    async fn append_content(&self, document_id: &str, text: &str) -> Result<(), NewsletterError>;

    /// Bold and enlarge the title line.
    ///
    /// # Errors
    async fn apply_title_style(&self, document_id: &str) -> Result<(), NewsletterError>;
}

/// Dispatches a single email.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// # Errors
    async fn send_email(
        &self,
        recipients: &[EmailRecipient],
        subject: &str,
        html_body: &str,
        text_body: Option<&str>,
    ) -> Result<DeliveryReceipt, NewsletterError>;

    /// Email `recipients` a summary plus a link to the published document.
    ///
    /// # Errors
    ///
    /// Returns the `send_email` error unchanged.
    async fn send_newsletter_with_document_link(
        &self,
        recipients: &[EmailRecipient],
        newsletter_title: &str,
        document_url: &str,
        summary: &str,
    ) -> Result<DeliveryReceipt, NewsletterError> {
        let email = document_link_email(newsletter_title, document_url, summary);
        info!(
            "Emailing {} recipients a link to {}",
            recipients.len(),
            document_url
        );
        self.send_email(recipients, &email.subject, &email.html, Some(&email.text))
            .await
    }
}
