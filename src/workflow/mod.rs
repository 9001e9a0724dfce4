//! End-to-end newsletter generation: collect, classify, render, publish.

pub mod collect;
pub mod deliver;
pub mod render;

pub use collect::{collect_channel, enrich_message};
pub use deliver::{DocumentLinkEmail, document_link_email, newsletter_subject};
pub use render::{document_title, render_email_html, render_email_text, render_newsletter};

use chrono::{DateTime, Duration, Utc};
use tracing::{error, info, warn};

use crate::analysis::importance::ImportanceRules;
use crate::analysis::mentions::UserCache;
use crate::analysis::topics::TopicTable;
use crate::core::collaborators::{DocumentSink, MessageSource, NotificationSink};
use crate::core::config::{AppConfig, DEFAULT_DAYS_BACK, DEFAULT_TITLE_PREFIX};
use crate::core::models::{EmailRecipient, NewsletterOutcome, NewsletterReport};
use crate::errors::NewsletterError;

/// Orchestrates one newsletter run against a message source and a document sink.
pub struct NewsletterWorkflow<S, D> {
    source: S,
    documents: D,
    rules: ImportanceRules,
    topics: TopicTable,
    days_back: i64,
    title_prefix: String,
}

impl<S, D> NewsletterWorkflow<S, D>
where
    S: MessageSource,
    D: DocumentSink,
{
    #[must_use]
    pub fn new(source: S, documents: D) -> Self {
        Self {
            source,
            documents,
            rules: ImportanceRules::default(),
            topics: TopicTable::default(),
            days_back: DEFAULT_DAYS_BACK,
            title_prefix: DEFAULT_TITLE_PREFIX.to_string(),
        }
    }

    #[must_use]
    pub fn from_config(source: S, documents: D, config: &AppConfig) -> Self {
        Self::new(source, documents)
            .with_days_back(config.days_back)
            .with_title_prefix(config.title_prefix.clone())
    }

    #[must_use]
    pub fn with_rules(mut self, rules: ImportanceRules) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn with_topics(mut self, topics: TopicTable) -> Self {
        self.topics = topics;
        self
    }

    #[must_use]
    pub fn with_days_back(mut self, days_back: i64) -> Self {
        self.days_back = days_back;
        self
    }

    #[must_use]
    pub fn with_title_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.title_prefix = prefix.into();
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn documents(&self) -> &D {
        &self.documents
    }

    /// Collect every channel for the period ending at `end`.
    ///
    /// Returns the report and the number of channels skipped because their
    /// history could not be fetched.
    ///
    /// # Errors
    ///
    /// Fails when the channel list is unavailable or empty.
    pub async fn build_report(
        &self,
        end: DateTime<Utc>,
    ) -> Result<(NewsletterReport, usize), NewsletterError> {
        let start = end - Duration::days(self.days_back);
        info!(
            "Generating newsletter for {} to {}",
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d")
        );

        let channels = self.source.list_channels().await?;
        if channels.is_empty() {
            return Err(NewsletterError::SourceUnavailable(
                "No channels found. Make sure the bot is added to some channels.".to_string(),
            ));
        }
        info!("Found {} channels to analyze", channels.len());

        let users = UserCache::new(&self.source);
        let mut digests = Vec::with_capacity(channels.len());
        let mut skipped = 0usize;

        for channel in channels {
            let name = channel.name.clone();
            match collect_channel(
                &self.source,
                &users,
                channel,
                &self.rules,
                &self.topics,
                start,
                end,
            )
            .await
            {
                Ok(digest) => digests.push(digest),
                Err(e) => {
                    warn!("Skipping #{}: {}", name, e);
                    skipped += 1;
                }
            }
        }

        let report = NewsletterReport {
            title: document_title(&self.title_prefix, end),
            generated_at: end,
            period_start: start,
            period_end: end,
            channels: digests,
        };
        Ok((report, skipped))
    }

    async fn publish(
        &self,
        end: DateTime<Utc>,
    ) -> Result<(NewsletterReport, NewsletterOutcome), NewsletterError> {
        let (report, skipped) = self.build_report(end).await?;
        let body = render_newsletter(&report);

        let document = self.documents.create_document(&report.title, &body).await?;
        if let Err(e) = self.documents.apply_title_style(&document.document_id).await {
            warn!("Could not apply title formatting: {}", e);
        }

        let outcome = NewsletterOutcome {
            document,
            channels_processed: report.channels.len(),
            channels_skipped: skipped,
            total_messages: report.total_messages(),
            important_messages: report.important_messages(),
            date_range: report.date_range(),
            delivery: None,
        };

        info!(
            "Newsletter ready at {} ({} channels, {} messages, {} important)",
            outcome.document.url,
            outcome.channels_processed,
            outcome.total_messages,
            outcome.important_messages
        );
        Ok((report, outcome))
    }

    /// Generate and publish the newsletter for the period ending now.
    ///
    /// # Errors
    ///
    /// Returns `SourceUnavailable` when no channels can be listed and
    /// `SinkUnavailable` when the document cannot be created.
    pub async fn generate_newsletter(&self) -> Result<NewsletterOutcome, NewsletterError> {
        self.generate_newsletter_at(Utc::now()).await
    }

    /// # Errors
    ///
    /// Same as [`NewsletterWorkflow::generate_newsletter`].
    pub async fn generate_newsletter_at(
        &self,
        end: DateTime<Utc>,
    ) -> Result<NewsletterOutcome, NewsletterError> {
        self.publish(end).await.map(|(_, outcome)| outcome)
    }

    /// Generate the newsletter, then email `recipients` a link to it.
    ///
    /// A failed email is logged and leaves `delivery` empty; the document
    /// already exists at that point.
    ///
    /// # Errors
    ///
    /// Same as [`NewsletterWorkflow::generate_newsletter`].
    pub async fn generate_and_send<N>(
        &self,
        notifier: &N,
        recipients: &[EmailRecipient],
        end: DateTime<Utc>,
    ) -> Result<NewsletterOutcome, NewsletterError>
    where
        N: NotificationSink + ?Sized,
    {
        let (report, mut outcome) = self.publish(end).await?;
        if recipients.is_empty() {
            return Ok(outcome);
        }

        match notifier
            .send_newsletter_with_document_link(
                recipients,
                &outcome.document.title,
                &outcome.document.url,
                &report.summary(),
            )
            .await
        {
            Ok(receipt) => outcome.delivery = Some(receipt),
            Err(e) => error!("Failed to email newsletter link: {}", e),
        }
        Ok(outcome)
    }
}
