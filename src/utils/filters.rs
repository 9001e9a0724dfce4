use slack_morphism::SlackHistoryMessage;
use slack_morphism::events::SlackMessageEventType;

/// Filters a list of Slack messages, retaining only those written by people:
/// no system or bot subtypes, and nothing posted by this bot itself.
#[must_use]
pub fn filter_user_messages(
    messages: Vec<SlackHistoryMessage>,
    bot_user_id: Option<&str>,
) -> Vec<SlackHistoryMessage> {
    messages
        .into_iter()
        .filter(|msg| {
            let is_system_message = match &msg.subtype {
                Some(subtype) => matches!(
                    subtype,
                    SlackMessageEventType::BotMessage
                        | SlackMessageEventType::ChannelJoin
                        | SlackMessageEventType::ChannelLeave
                ),
                None => false,
            };
            let is_bot_post = msg.sender.user.is_none() && msg.sender.bot_id.is_some();
            let is_from_this_bot = bot_user_id
                .and_then(|bot_id| msg.sender.user.as_ref().map(|u| u.0 == bot_id))
                .unwrap_or(false);

            !is_system_message && !is_bot_post && !is_from_this_bot
        })
        .collect()
}
