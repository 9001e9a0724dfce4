use serde::{Serialize, Serializer};
use std::fmt;

use crate::core::models::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicCategory {
    Scheduling,
    ClientManagement,
    Announcements,
    TechnicalDiscussions,
    QuestionsAndHelp,
    Celebrations,
    ProjectUpdates,
    TeamBuilding,
    ToolsAndResources,
    General,
}

impl TopicCategory {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            TopicCategory::Scheduling => "Scheduling",
            TopicCategory::ClientManagement => "Client Management",
            TopicCategory::Announcements => "Announcements",
            TopicCategory::TechnicalDiscussions => "Technical Discussions",
            TopicCategory::QuestionsAndHelp => "Questions & Help",
            TopicCategory::Celebrations => "Celebrations",
            TopicCategory::ProjectUpdates => "Project Updates",
            TopicCategory::TeamBuilding => "Team Building",
            TopicCategory::ToolsAndResources => "Tools & Resources",
            TopicCategory::General => "General",
        }
    }
}

impl fmt::Display for TopicCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for TopicCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Ordered `(category, keywords)` table used for scoring.
///
/// Declaration order is the tie-break: on equal scores the earlier category
/// wins. Several categories share keywords ("shift", "cover").
#[derive(Debug, Clone)]
pub struct TopicTable {
    entries: Vec<(TopicCategory, Vec<String>)>,
}

const BUILTIN_TABLE: &[(TopicCategory, &[&str])] = &[
    (
        TopicCategory::Scheduling,
        &[
            "meeting",
            "schedule",
            "calendar",
            "tomorrow",
            "today",
            "deadline",
            "shift",
            "cover",
            "availability",
            "reschedule",
            "time off",
            "pto",
            "appointment",
            "standup",
        ],
    ),
    (
        TopicCategory::ClientManagement,
        &[
            "client",
            "customer",
            "caregiver",
            "replacement",
            "shift",
            "cover",
            "care plan",
            "family",
            "visit",
        ],
    ),
    (
        TopicCategory::Announcements,
        &[
            "announcement",
            "announce",
            "attention",
            "reminder",
            "heads up",
            "fyi",
            "policy",
            "important",
        ],
    ),
    (
        TopicCategory::TechnicalDiscussions,
        &[
            "deploy",
            "production",
            "bug",
            "fix",
            "feature",
            "release",
            "code",
            "server",
            "database",
            "pull request",
            "merge",
            "build",
        ],
    ),
    (
        TopicCategory::QuestionsAndHelp,
        &[
            "help",
            "question",
            "how do",
            "how to",
            "can someone",
            "anyone know",
            "does anyone",
            "stuck",
            "issue",
            "problem",
            "?",
        ],
    ),
    (
        TopicCategory::Celebrations,
        &[
            "congrat",
            "birthday",
            "anniversary",
            "celebrate",
            "kudos",
            "shoutout",
            "shout out",
            "well done",
            "great job",
            "🎉",
        ],
    ),
    (
        TopicCategory::ProjectUpdates,
        &[
            "update",
            "progress",
            "milestone",
            "completed",
            "launch",
            "shipped",
            "status",
            "roadmap",
            "sprint",
        ],
    ),
    (
        TopicCategory::TeamBuilding,
        &[
            "team lunch",
            "happy hour",
            "offsite",
            "team building",
            "social",
            "coffee",
            "outing",
            "volunteer",
            "game night",
        ],
    ),
    (
        TopicCategory::ToolsAndResources,
        &[
            "tool",
            "resource",
            "documentation",
            "guide",
            "tutorial",
            "template",
            "wiki",
            "http",
        ],
    ),
];

impl Default for TopicTable {
    fn default() -> Self {
        Self {
            entries: BUILTIN_TABLE
                .iter()
                .map(|(category, keywords)| {
                    (*category, keywords.iter().map(ToString::to_string).collect())
                })
                .collect(),
        }
    }
}

impl TopicTable {
    /// Build a table from explicit entries. Keywords are lower-cased; any
    /// `General` entry is ignored since it is the fallback, never a candidate.
    #[must_use]
    pub fn new(entries: Vec<(TopicCategory, Vec<String>)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .filter(|(category, _)| *category != TopicCategory::General)
                .map(|(category, keywords)| {
                    (
                        category,
                        keywords.into_iter().map(|k| k.to_lowercase()).collect(),
                    )
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn entries(&self) -> &[(TopicCategory, Vec<String>)] {
        &self.entries
    }

    /// Stable argmax over keyword hit counts; `General` when nothing hits.
    #[must_use]
    pub fn categorize(&self, text: &str) -> TopicCategory {
        let text_lower = text.to_lowercase();
        let mut best = TopicCategory::General;
        let mut best_score = 0usize;

        for (category, keywords) in &self.entries {
            let score = keywords
                .iter()
                .filter(|k| !k.is_empty() && text_lower.contains(k.as_str()))
                .count();
            if score > best_score {
                best = *category;
                best_score = score;
            }
        }

        best
    }

    /// Group messages by topic. Groups appear in the order their first
    /// message was seen; messages keep input order within a group.
    #[must_use]
    pub fn group<'a>(&self, messages: &'a [Message]) -> Vec<TopicGroup<'a>> {
        let mut groups: Vec<TopicGroup<'a>> = Vec::new();
        for msg in messages {
            let topic = self.categorize(&msg.text);
            match groups.iter_mut().find(|g| g.topic == topic) {
                Some(group) => group.messages.push(msg),
                None => groups.push(TopicGroup {
                    topic,
                    messages: vec![msg],
                }),
            }
        }
        groups
    }
}

#[derive(Debug, Clone)]
pub struct TopicGroup<'a> {
    pub topic: TopicCategory,
    pub messages: Vec<&'a Message>,
}

/// [`TopicTable::categorize`] with the built-in table.
#[must_use]
pub fn categorize(text: &str) -> TopicCategory {
    TopicTable::default().categorize(text)
}

/// [`TopicTable::group`] with the built-in table.
#[must_use]
pub fn group_messages_by_topic(messages: &[Message]) -> Vec<TopicGroup<'_>> {
    TopicTable::default().group(messages)
}
