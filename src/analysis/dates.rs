//! Date and time mention extraction from free text.
//!
//! Patterns run independently and in a fixed order. Results are grouped by
//! pattern (declaration order), left-to-right within each pattern, so a time
//! reference early in the text still sorts after a date found later on.
//! Matches from different patterns may overlap.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Characters of surrounding text kept on each side of a match.
pub const CONTEXT_MARGIN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePatternKind {
    MonthDay,
    DayMonth,
    SlashDate,
    IsoDate,
    RelativeDay,
    RelativePeriod,
    RelativeFuture,
    RelativePast,
    TimeReference,
}

impl DatePatternKind {
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            DatePatternKind::MonthDay => "month_day",
            DatePatternKind::DayMonth => "day_month",
            DatePatternKind::SlashDate => "slash_date",
            DatePatternKind::IsoDate => "iso_date",
            DatePatternKind::RelativeDay => "relative_day",
            DatePatternKind::RelativePeriod => "relative_period",
            DatePatternKind::RelativeFuture => "relative_future",
            DatePatternKind::RelativePast => "relative_past",
            DatePatternKind::TimeReference => "time_reference",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateMention {
    /// Lower-cased text of the match.
    pub matched_text: String,
    pub pattern_kind: DatePatternKind,
    /// Match plus up to [`CONTEXT_MARGIN`] characters either side, from the original text.
    pub context_window: String,
    /// Byte offsets of the match in the source text.
    pub span: (usize, usize),
}

const MONTHS: &str = r"(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";
const UNITS: &str = r"(?:minutes?|hours?|days?|weeks?|months?|years?)";

fn compile(pattern: &str) -> Regex {
    // Patterns are static; a failure here is a programming error caught by the tests below.
    Regex::new(&format!("(?i){pattern}"))
        .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
}

static DATE_PATTERNS: LazyLock<Vec<(DatePatternKind, Regex)>> = LazyLock::new(|| {
    vec![
        (
            DatePatternKind::MonthDay,
            compile(&format!(
                r"\b{MONTHS}\.?\s+\d{{1,2}}(?:st|nd|rd|th)?(?:,?\s+\d{{4}})?\b"
            )),
        ),
        (
            DatePatternKind::DayMonth,
            compile(&format!(
                r"\b\d{{1,2}}(?:st|nd|rd|th)?\s+(?:of\s+)?{MONTHS}\b(?:,?\s+\d{{4}}\b)?"
            )),
        ),
        (
            DatePatternKind::SlashDate,
            compile(r"\b\d{1,2}/\d{1,2}(?:/\d{2,4})?\b"),
        ),
        (DatePatternKind::IsoDate, compile(r"\b\d{4}-\d{2}-\d{2}\b")),
        (
            DatePatternKind::RelativeDay,
            compile(r"\b(?:today|tomorrow|yesterday)\b"),
        ),
        (
            DatePatternKind::RelativePeriod,
            compile(
                r"\b(?:next|this|last)\s+(?:week|weekend|month|quarter|year|monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
            ),
        ),
        (
            DatePatternKind::RelativeFuture,
            compile(&format!(r"\bin\s+(?:\d+|a|an)\s+{UNITS}\b")),
        ),
        (
            DatePatternKind::RelativePast,
            compile(&format!(r"\b(?:\d+|a|an)\s+{UNITS}\s+ago\b")),
        ),
        (
            DatePatternKind::TimeReference,
            compile(
                r"\b(?:at|by|before|after|around|until)\s+\d{1,2}(?::\d{2}(?:\s*(?:am|pm))?|\s*(?:am|pm))\b",
            ),
        ),
    ]
});

/// Every date mention in `text`, grouped by pattern kind.
#[must_use]
pub fn extract_dates(text: &str) -> Vec<DateMention> {
    let mut mentions = Vec::new();

    for (kind, regex) in DATE_PATTERNS.iter() {
        for m in regex.find_iter(text) {
            mentions.push(DateMention {
                matched_text: m.as_str().to_lowercase(),
                pattern_kind: *kind,
                context_window: context_window(text, m.start(), m.end()),
                span: (m.start(), m.end()),
            });
        }
    }

    mentions
}

/// Slice of `text` from `CONTEXT_MARGIN` chars before `start` to
/// `CONTEXT_MARGIN` chars after `end`, clipped to the string.
fn context_window(text: &str, start: usize, end: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(CONTEXT_MARGIN)
        .last()
        .map_or(start, |(idx, _)| idx);

    let to = text[end..]
        .char_indices()
        .nth(CONTEXT_MARGIN)
        .map_or(text.len(), |(idx, _)| end + idx);

    text[from..to].to_string()
}
