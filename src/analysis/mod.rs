//! Stateless text heuristics: importance, topics, dates and mentions.
//!
//! Everything here except mention resolution is a pure function of its
//! input and safe to call from any number of tasks at once.

pub mod dates;
pub mod importance;
pub mod mentions;
pub mod topics;

pub use dates::{DateMention, DatePatternKind, extract_dates};
pub use importance::{ImportanceRules, filter_important_messages, is_important};
pub use mentions::{UserCache, resolve_mentions};
pub use topics::{TopicCategory, TopicGroup, TopicTable, categorize, group_messages_by_topic};
