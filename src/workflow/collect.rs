use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::analysis::dates::extract_dates;
use crate::analysis::importance::ImportanceRules;
use crate::analysis::mentions::resolve_mentions;
use crate::analysis::topics::TopicTable;
use crate::core::collaborators::{MessageSource, UserLookup};
use crate::core::models::{ChannelDigest, ChannelInfo, EnrichedMessage, Message};
use crate::errors::NewsletterError;

/// Attach author name, mention-resolved text, dates and topic to one message.
///
/// Lookup failures degrade: the author falls back to the raw identifier and
/// unresolved mentions stay as `<@ID>`.
pub async fn enrich_message<L>(message: Message, topics: &TopicTable, users: &L) -> EnrichedMessage
where
    L: UserLookup + ?Sized,
{
    let author_name = if message.author.is_empty() {
        "Unknown".to_string()
    } else {
        match users.lookup_user(&message.author).await {
            Ok(user) => user.preferred_name().to_string(),
            Err(e) => {
                warn!("Could not resolve author {}: {}", message.author, e);
                message.author.clone()
            }
        }
    };

    let resolved_text = resolve_mentions(&message.text, users).await;
    let dates = extract_dates(&resolved_text);
    let topic = topics.categorize(&message.text);

    EnrichedMessage {
        message,
        author_name,
        resolved_text,
        dates,
        topic,
    }
}

/// Fetch, filter and enrich one channel.
///
/// # Errors
///
/// Propagates the source's error when the history cannot be fetched.
pub async fn collect_channel<S, L>(
    source: &S,
    users: &L,
    channel: ChannelInfo,
    rules: &ImportanceRules,
    topics: &TopicTable,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<ChannelDigest, NewsletterError>
where
    S: MessageSource + ?Sized,
    L: UserLookup + ?Sized,
{
    info!("Processing #{}", channel.name);

    let messages = source.fetch_messages(&channel.id, start, end).await?;
    let total_messages = messages.len();

    let important = rules.filter(&messages);
    let topic_count = topics.group(&important).len();

    // One message at a time so the per-run user cache sees each author once.
    let mut enriched = Vec::with_capacity(important.len());
    for msg in important {
        enriched.push(enrich_message(msg, topics, users).await);
    }
    let important = enriched;

    info!(
        "#{}: {} total, {} important, {} topics",
        channel.name,
        total_messages,
        important.len(),
        topic_count
    );

    Ok(ChannelDigest {
        channel,
        total_messages,
        important,
    })
}
