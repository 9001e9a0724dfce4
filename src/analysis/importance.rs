use crate::core::models::Message;

/// Keywords that mark a message important on their own.
pub const IMPORTANT_KEYWORDS: [&str; 20] = [
    "release",
    "deploy",
    "ship",
    "launch",
    "update",
    "decision",
    "meeting",
    "demo",
    "announcement",
    "milestone",
    "completed",
    "bug",
    "issue",
    "fix",
    "feature",
    "breaking",
    "shift",
    "client",
    "caregiver",
    "cover",
];

/// Thresholds and keywords for the importance predicate.
///
/// Any single rule firing is enough; nothing is weighted.
#[derive(Debug, Clone)]
pub struct ImportanceRules {
    /// Total reactions at or above this count.
    pub min_reactions: u32,
    /// Replies strictly above this count.
    pub replies_above: u32,
    /// Text longer than this many characters.
    pub length_above: usize,
    /// Lower-cased keywords, matched as substrings.
    pub keywords: Vec<String>,
}

impl Default for ImportanceRules {
    fn default() -> Self {
        Self {
            min_reactions: 2,
            replies_above: 1,
            length_above: 100,
            keywords: IMPORTANT_KEYWORDS.iter().map(ToString::to_string).collect(),
        }
    }
}

impl ImportanceRules {
    #[must_use]
    pub fn is_important(&self, message: &Message) -> bool {
        if message.reaction_count >= self.min_reactions {
            return true;
        }
        if message.reply_count > self.replies_above {
            return true;
        }
        if message.text.chars().count() > self.length_above {
            return true;
        }

        let text_lower = message.text.to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| !keyword.is_empty() && text_lower.contains(keyword.as_str()))
    }

    /// Keep the important messages, in input order.
    #[must_use]
    pub fn filter(&self, messages: &[Message]) -> Vec<Message> {
        messages
            .iter()
            .filter(|msg| self.is_important(msg))
            .cloned()
            .collect()
    }
}

/// [`ImportanceRules::is_important`] with the default rules.
#[must_use]
pub fn is_important(message: &Message) -> bool {
    ImportanceRules::default().is_important(message)
}

/// [`ImportanceRules::filter`] with the default rules.
#[must_use]
pub fn filter_important_messages(messages: &[Message]) -> Vec<Message> {
    ImportanceRules::default().filter(messages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engagement_rule_needs_two_reactions() {
        assert!(!is_important(&Message::new("ok", "U1").with_reactions(1)));
        assert!(is_important(&Message::new("ok", "U1").with_reactions(2)));
    }

    #[test]
    fn discussion_rule_needs_two_replies() {
        assert!(!is_important(&Message::new("ok", "U1").with_replies(1)));
        assert!(is_important(&Message::new("ok", "U1").with_replies(2)));
    }

    #[test]
    fn length_rule_counts_characters_not_bytes() {
        assert!(!is_important(&Message::new("é".repeat(100), "U1")));
        assert!(is_important(&Message::new("é".repeat(101), "U1")));
    }

    #[test]
    fn keyword_rule_is_case_insensitive_substring() {
        assert!(is_important(&Message::new("We DEPLOYED it", "U1")));
        assert!(is_important(&Message::new("bugfix landed", "U1")));
        assert!(!is_important(&Message::new("Short message", "U1")));
    }

    #[test]
    fn empty_text_only_passes_on_engagement() {
        assert!(!is_important(&Message::new("", "U1")));
        assert!(is_important(&Message::new("", "U1").with_replies(3)));
    }

    #[test]
    fn substituted_rules_are_honoured() {
        let rules = ImportanceRules {
            min_reactions: 10,
            replies_above: 10,
            length_above: 1000,
            keywords: vec!["lunch".to_string()],
        };
        assert!(rules.is_important(&Message::new("Lunch at noon", "U1")));
        assert!(!rules.is_important(&Message::new("release day", "U1").with_reactions(5)));
    }
}
