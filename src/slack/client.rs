//! Slack API client module
//!
//! Encapsulates the Slack Web API calls the newsletter needs, with retry
//! logic and error handling.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use slack_morphism::errors::SlackClientError;
use slack_morphism::hyper_tokio::{SlackClientHyperConnector, SlackHyperClient};
use slack_morphism::prelude::{
    SlackApiConversationsHistoryRequest, SlackApiConversationsListRequest,
    SlackApiUsersInfoRequest,
};
use slack_morphism::{
    SlackApiToken, SlackApiTokenValue, SlackChannelId, SlackChannelInfo, SlackConversationType,
    SlackCursorId, SlackHistoryMessage, SlackResponseMetadata, SlackTs, SlackUserId,
};
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, info, warn};

use crate::core::collaborators::{MessageSource, UserLookup};
use crate::core::models::{ChannelInfo, Message, UserInfo};
use crate::errors::NewsletterError;
use crate::utils::filters::filter_user_messages;

/// Upper bound on messages pulled from one channel per run.
pub const MAX_HISTORY_MESSAGES: usize = 1000;
const HISTORY_PAGE_SIZE: usize = 200;
const CHANNEL_PAGE_SIZE: u16 = 200;

// Build the Slack client connector safely without panicking.
// If connector construction fails, store None and surface an error at call sites.
static SLACK_CLIENT: std::sync::LazyLock<Option<SlackHyperClient>> =
    std::sync::LazyLock::new(|| match SlackClientHyperConnector::new() {
        Ok(connector) => Some(SlackHyperClient::new(connector)),
        Err(e) => {
            warn!("Failed to create Slack HTTP connector: {}", e);
            None
        }
    });

fn connector() -> Result<&'static SlackHyperClient, NewsletterError> {
    SLACK_CLIENT.as_ref().ok_or_else(|| {
        NewsletterError::SourceUnavailable("Slack HTTP connector not initialized".to_string())
    })
}

/// Format a timestamp the way Slack's `oldest`/`latest` parameters expect.
#[must_use]
pub fn to_slack_ts(at: DateTime<Utc>) -> SlackTs {
    SlackTs::new(format!(
        "{}.{:06}",
        at.timestamp(),
        at.timestamp_subsec_micros()
    ))
}

fn next_cursor(meta: Option<SlackResponseMetadata>) -> Option<SlackCursorId> {
    meta.and_then(|m| m.next_cursor)
        .filter(|c| !c.0.is_empty())
}

/// Convert a history entry into the pipeline's `Message`, summing reaction counts.
#[must_use]
pub fn history_to_message(msg: SlackHistoryMessage, channel_id: &str) -> Message {
    let reaction_count = msg
        .content
        .reactions
        .as_deref()
        .unwrap_or_default()
        .iter()
        .fold(0u32, |acc, r| {
            acc.saturating_add(u32::try_from(r.count).unwrap_or(u32::MAX))
        });
    let reply_count = msg
        .parent
        .reply_count
        .map_or(0, |n| u32::try_from(n).unwrap_or(u32::MAX));

    Message {
        text: msg.content.text.unwrap_or_default(),
        author: msg.sender.user.map(|u| u.0).unwrap_or_default(),
        timestamp: msg.origin.ts.0,
        channel: channel_id.to_string(),
        thread_ts: msg.origin.thread_ts.map(|ts| ts.0),
        reaction_count,
        reply_count,
    }
}

fn to_channel_info(channel: SlackChannelInfo) -> ChannelInfo {
    ChannelInfo {
        id: channel.id.0,
        name: channel.name.unwrap_or_default(),
        is_private: channel.flags.is_private.unwrap_or(false),
        member_count: channel.num_members.unwrap_or(0),
    }
}

/// Map a Slack client failure, waiting out `Retry-After` when rate limited
/// so the next backoff attempt lands after the window.
async fn slack_failure(method: &str, error: SlackClientError) -> NewsletterError {
    if let SlackClientError::RateLimitError(limit) = &error {
        let retry_after = limit.retry_after.unwrap_or(Duration::from_secs(1));
        warn!(
            "Slack rate limited {}, waiting {}s",
            method,
            retry_after.as_secs()
        );
        tokio::time::sleep(retry_after).await;
        return NewsletterError::HttpError(format!("{method} rate limited"));
    }
    warn!("Slack {} failed: {}", method, error);
    error.into()
}

/// Slack API client with retry logic and error handling
pub struct SlackClient {
    token: SlackApiToken,
    bot_user_id: OnceCell<String>,
}

impl SlackClient {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self {
            token: SlackApiToken::new(SlackApiTokenValue::new(token)),
            bot_user_id: OnceCell::new(),
        }
    }

    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, NewsletterError>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, NewsletterError>> + Send,
        T: Send,
    {
        let strategy = ExponentialBackoff::from_millis(100).map(jitter).take(5);

        RetryIf::spawn(strategy, operation, NewsletterError::is_retryable).await
    }

    /// The bot's own user id from `auth.test`, fetched once per client.
    async fn bot_user_id(&self) -> Result<&str, NewsletterError> {
        let user_id = self
            .bot_user_id
            .get_or_try_init(|| async {
                self.with_retry(|| async {
                    let session = connector()?.open_session(&self.token);
                    match session.auth_test().await {
                        Ok(test_resp) => Ok(test_resp.user_id.0),
                        Err(e) => Err(slack_failure("auth.test", e).await),
                    }
                })
                .await
            })
            .await?;
        Ok(user_id.as_str())
    }

    /// Verify the token and return the bot's own user id.
    ///
    /// # Errors
    ///
    /// Returns an error if `auth.test` fails.
    pub async fn test_connection(&self) -> Result<String, NewsletterError> {
        let user_id = self.bot_user_id().await?;
        info!("Connected to Slack as {}", user_id);
        Ok(user_id.to_string())
    }

    /// # Errors
    ///
    /// Returns `SourceUnavailable` if `users.info` fails.
    pub async fn get_user_info(&self, user_id: &str) -> Result<UserInfo, NewsletterError> {
        self.with_retry(|| async {
            let session = connector()?.open_session(&self.token);
            let user_info_req = SlackApiUsersInfoRequest::new(SlackUserId(user_id.to_string()));

            let info = match session.users_info(&user_info_req).await {
                Ok(info) => info,
                Err(e) => return Err(slack_failure("users.info", e).await),
            };
            let profile = info.user.profile.as_ref();

            Ok(UserInfo {
                id: user_id.to_string(),
                display_name: profile.and_then(|p| p.display_name.clone()),
                real_name: profile.and_then(|p| p.real_name.clone()),
            })
        })
        .await
    }

    /// Public and private channels the bot is a member of, archived ones excluded.
    ///
    /// # Errors
    pub async fn get_bot_channels(&self) -> Result<Vec<ChannelInfo>, NewsletterError> {
        let mut channels = Vec::new();
        let mut cursor: Option<SlackCursorId> = None;

        loop {
            let request = SlackApiConversationsListRequest::new()
                .with_types(vec![SlackConversationType::Public, SlackConversationType::Private])
                .with_exclude_archived(true)
                .with_limit(CHANNEL_PAGE_SIZE)
                .opt_cursor(cursor.take());

            let page = self
                .with_retry(|| async {
                    let session = connector()?.open_session(&self.token);
                    match session.conversations_list(&request).await {
                        Ok(page) => Ok(page),
                        Err(e) => Err(slack_failure("conversations.list", e).await),
                    }
                })
                .await?;

            channels.extend(
                page.channels
                    .into_iter()
                    .filter(|c| c.flags.is_member.unwrap_or(false))
                    .map(to_channel_info),
            );

            match next_cursor(page.response_metadata) {
                Some(c) => cursor = Some(c),
                None => break,
            }
        }

        debug!("Bot is a member of {} channels", channels.len());
        Ok(channels)
    }

    /// History between `start` and `end` (inclusive), capped at
    /// [`MAX_HISTORY_MESSAGES`].
    ///
    /// # Errors
    pub async fn get_channel_history(
        &self,
        channel_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<SlackHistoryMessage>, NewsletterError> {
        let mut messages: Vec<SlackHistoryMessage> = Vec::new();
        let mut cursor: Option<SlackCursorId> = None;

        while messages.len() < MAX_HISTORY_MESSAGES {
            let remaining = MAX_HISTORY_MESSAGES - messages.len();
            let request = SlackApiConversationsHistoryRequest::new()
                .with_channel(SlackChannelId(channel_id.to_string()))
                .with_oldest(to_slack_ts(start))
                .with_latest(to_slack_ts(end))
                .with_inclusive(true)
                .with_limit(u16::try_from(remaining.min(HISTORY_PAGE_SIZE)).unwrap_or(200))
                .opt_cursor(cursor.take());

            let page = self
                .with_retry(|| async {
                    let session = connector()?.open_session(&self.token);
                    match session.conversations_history(&request).await {
                        Ok(page) => Ok(page),
                        Err(e) => Err(slack_failure("conversations.history", e).await),
                    }
                })
                .await?;

            let has_more = page.has_more.unwrap_or(false);
            messages.extend(page.messages);

            match next_cursor(page.response_metadata) {
                Some(c) if has_more => cursor = Some(c),
                _ => break,
            }
        }

        messages.truncate(MAX_HISTORY_MESSAGES);
        Ok(messages)
    }
}

#[async_trait]
impl UserLookup for SlackClient {
    async fn lookup_user(&self, user_id: &str) -> Result<UserInfo, NewsletterError> {
        self.get_user_info(user_id).await
    }
}

#[async_trait]
impl MessageSource for SlackClient {
    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, NewsletterError> {
        self.get_bot_channels().await
    }

    async fn fetch_messages(
        &self,
        channel_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Message>, NewsletterError> {
        let history = self.get_channel_history(channel_id, start, end).await?;
        let bot_user_id = match self.bot_user_id().await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Could not resolve bot user id, own posts are not filtered: {}", e);
                None
            }
        };

        Ok(filter_user_messages(history, bot_user_id)
            .into_iter()
            .map(|msg| history_to_message(msg, channel_id))
            .collect())
    }
}
