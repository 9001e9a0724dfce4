use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analysis::dates::DateMention;
use crate::analysis::topics::TopicCategory;

/// A single chat message as handed to the classification pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
    pub author: String,
    pub timestamp: String,
    pub channel: String,
    pub thread_ts: Option<String>,
    /// Sum over every reaction kind on the message.
    pub reaction_count: u32,
    #[serde(default)]
    pub reply_count: u32,
}

impl Message {
    #[must_use]
    pub fn new(text: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: author.into(),
            timestamp: String::new(),
            channel: String::new(),
            thread_ts: None,
            reaction_count: 0,
            reply_count: 0,
        }
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    #[must_use]
    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = channel.into();
        self
    }

    #[must_use]
    pub fn with_reactions(mut self, reaction_count: u32) -> Self {
        self.reaction_count = reaction_count;
        self
    }

    #[must_use]
    pub fn with_replies(mut self, reply_count: u32) -> Self {
        self.reply_count = reply_count;
        self
    }
}

/// A message after mention resolution, date extraction and topic assignment.
#[derive(Debug, Clone, Serialize)]
pub struct EnrichedMessage {
    pub message: Message,
    pub author_name: String,
    /// Message text with `<@ID>` tokens replaced where lookups succeeded.
    pub resolved_text: String,
    pub dates: Vec<DateMention>,
    pub topic: TopicCategory,
}

impl EnrichedMessage {
    #[must_use]
    pub fn has_dates(&self) -> bool {
        !self.dates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
    pub is_private: bool,
    pub member_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub display_name: Option<String>,
    pub real_name: Option<String>,
}

impl UserInfo {
    /// Display name, else real name, else the raw identifier.
    #[must_use]
    pub fn preferred_name(&self) -> &str {
        [self.display_name.as_deref(), self.real_name.as_deref()]
            .into_iter()
            .flatten()
            .find(|name| !name.trim().is_empty())
            .unwrap_or(&self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub document_id: String,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecipient {
    pub email: String,
    pub name: Option<String>,
}

impl EmailRecipient {
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub message_id: String,
    pub thread_id: Option<String>,
    pub recipients: Vec<String>,
    pub subject: String,
    pub sent_at: DateTime<Utc>,
}

/// Render input for one channel.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelDigest {
    pub channel: ChannelInfo,
    /// Messages fetched before importance filtering.
    pub total_messages: usize,
    pub important: Vec<EnrichedMessage>,
}

impl ChannelDigest {
    /// Important messages grouped by topic, groups ordered by first appearance.
    #[must_use]
    pub fn topic_groups(&self) -> Vec<(TopicCategory, Vec<&EnrichedMessage>)> {
        let mut groups: Vec<(TopicCategory, Vec<&EnrichedMessage>)> = Vec::new();
        for msg in &self.important {
            match groups.iter_mut().find(|(topic, _)| *topic == msg.topic) {
                Some((_, members)) => members.push(msg),
                None => groups.push((msg.topic, vec![msg])),
            }
        }
        groups
    }

    pub fn dated_messages(&self) -> impl Iterator<Item = &EnrichedMessage> {
        self.important.iter().filter(|m| m.has_dates())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewsletterReport {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub channels: Vec<ChannelDigest>,
}

impl NewsletterReport {
    #[must_use]
    pub fn total_messages(&self) -> usize {
        self.channels.iter().map(|c| c.total_messages).sum()
    }

    #[must_use]
    pub fn important_messages(&self) -> usize {
        self.channels.iter().map(|c| c.important.len()).sum()
    }

    /// `YYYY-MM-DD to YYYY-MM-DD`.
    #[must_use]
    pub fn date_range(&self) -> String {
        format!(
            "{} to {}",
            self.period_start.format("%Y-%m-%d"),
            self.period_end.format("%Y-%m-%d")
        )
    }

    /// One-paragraph summary used in the document and the notification email.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "This week, our team was active across {} channels with {} total messages. \
             We've identified {} important updates and discussions worth highlighting.",
            self.channels.len(),
            self.total_messages(),
            self.important_messages()
        )
    }
}

#[derive(Debug, Serialize)]
pub struct NewsletterOutcome {
    pub document: DocumentInfo,
    pub channels_processed: usize,
    pub channels_skipped: usize,
    pub total_messages: usize,
    pub important_messages: usize,
    pub date_range: String,
    pub delivery: Option<DeliveryReceipt>,
}
