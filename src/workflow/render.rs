//! Plain-text newsletter layout and the notification email bodies.

use chrono::{DateTime, Utc};

use crate::core::models::{ChannelDigest, EnrichedMessage, Message, NewsletterReport};

pub const NEWSLETTER_HEADING: &str = "Weekly Development Newsletter";

/// Character budget for a message shown under its topic.
pub const TOPIC_PREVIEW_CHARS: usize = 120;
/// Character budget for a message in the top-updates list.
pub const TOP_UPDATE_CHARS: usize = 150;
pub const ELLIPSIS: &str = "...";

const MESSAGES_PER_TOPIC: usize = 3;
const DATED_MESSAGES_SHOWN: usize = 5;
const DATES_PER_MESSAGE: usize = 2;
const TOP_UPDATES_SHOWN: usize = 5;
const RULE_WIDTH: usize = 50;

const FOOTER: &str = "📝 ABOUT THIS NEWSLETTER\n\
This newsletter is automatically generated from Slack conversations using our MCP (Model Context Protocol) server. \
It identifies important messages based on engagement (reactions, replies) and content analysis.\n\n\
Generated by Newsletter MCP Bot 🤖";

/// `<prefix> - Month DD, YYYY`.
#[must_use]
pub fn document_title(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{prefix} - {}", at.format("%B %d, %Y"))
}

/// Collapse newlines, trim, and cut to `budget` characters plus `...`.
#[must_use]
pub fn clip(text: &str, budget: usize) -> String {
    let single_line = text.replace('\n', " ");
    let trimmed = single_line.trim();

    if trimmed.chars().count() > budget {
        let head: String = trimmed.chars().take(budget).collect();
        format!("{head}{ELLIPSIS}")
    } else {
        trimmed.to_string()
    }
}

/// ` [👍r 💬c]`, or nothing when the message drew no engagement.
fn engagement(msg: &Message) -> String {
    let mut parts = Vec::with_capacity(2);
    if msg.reaction_count > 0 {
        parts.push(format!("👍{}", msg.reaction_count));
    }
    if msg.reply_count > 0 {
        parts.push(format!("💬{}", msg.reply_count));
    }

    if parts.is_empty() {
        String::new()
    } else {
        format!(" [{}]", parts.join(" "))
    }
}

fn render_topics(digest: &ChannelDigest, out: &mut String) {
    let groups = digest.topic_groups();
    if groups.is_empty() {
        return;
    }

    out.push_str("📂 ORGANIZED BY TOPIC:\n\n");
    for (topic, messages) in groups {
        out.push_str(&format!(
            "🔹 {} ({} updates)\n",
            topic.label().to_uppercase(),
            messages.len()
        ));
        for (i, msg) in messages.iter().take(MESSAGES_PER_TOPIC).enumerate() {
            out.push_str(&format!(
                "  {}. {}{}\n",
                i + 1,
                clip(&msg.resolved_text, TOPIC_PREVIEW_CHARS),
                engagement(&msg.message)
            ));
        }
        if messages.len() > MESSAGES_PER_TOPIC {
            out.push_str(&format!(
                "    ... and {} more\n",
                messages.len() - MESSAGES_PER_TOPIC
            ));
        }
        out.push('\n');
    }
}

fn render_dates(digest: &ChannelDigest, out: &mut String) {
    let dated: Vec<&EnrichedMessage> = digest.dated_messages().take(DATED_MESSAGES_SHOWN).collect();
    if dated.is_empty() {
        return;
    }

    out.push_str("📅 UPCOMING DATES & DEADLINES:\n");
    for msg in dated {
        for date in msg.dates.iter().take(DATES_PER_MESSAGE) {
            out.push_str(&format!(
                "  • {}: {} ({})\n",
                msg.author_name,
                date.matched_text,
                date.context_window.trim()
            ));
        }
    }
    out.push('\n');
}

fn render_top_updates(digest: &ChannelDigest, out: &mut String) {
    out.push_str("📝 TOP UPDATES:\n\n");
    for (i, msg) in digest.important.iter().take(TOP_UPDATES_SHOWN).enumerate() {
        out.push_str(&format!(
            "{}. {}: {}{}\n\n",
            i + 1,
            msg.author_name,
            clip(&msg.resolved_text, TOP_UPDATE_CHARS),
            engagement(&msg.message)
        ));
    }
    if digest.important.len() > TOP_UPDATES_SHOWN {
        out.push_str(&format!(
            "... and {} more important updates\n\n",
            digest.important.len() - TOP_UPDATES_SHOWN
        ));
    }
}

/// Full document body. Channels without important messages are omitted.
#[must_use]
pub fn render_newsletter(report: &NewsletterReport) -> String {
    let mut out = format!(
        "{NEWSLETTER_HEADING}\nGenerated on {}\nReport Period: {} - {}\n\n📊 SUMMARY\n{}\n\n",
        report.generated_at.format("%B %d, %Y"),
        report.period_start.format("%b %d"),
        report.period_end.format("%b %d, %Y"),
        report.summary()
    );

    out.push_str("🏢 CHANNEL UPDATES\n\n");

    for digest in report.channels.iter().filter(|d| !d.important.is_empty()) {
        out.push_str(&format!("#{}\n", digest.channel.name.to_uppercase()));
        out.push_str(&format!(
            "Members: {} | Important Updates: {}\n\n",
            digest.channel.member_count,
            digest.important.len()
        ));

        render_topics(digest, &mut out);
        render_dates(digest, &mut out);
        render_top_updates(digest, &mut out);

        out.push_str(&"─".repeat(RULE_WIDTH));
        out.push_str("\n\n");
    }

    out.push_str(FOOTER);
    out
}

/// HTML notification body: title, summary and a button linking to the document.
#[must_use]
pub fn render_email_html(title: &str, summary: &str, document_url: &str) -> String {
    let title = html_escape::encode_text(title);
    let summary = html_escape::encode_text(summary);
    let url = html_escape::encode_double_quoted_attribute(document_url);

    format!(
        r#"<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
  <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1 style="color: #2c3e50; border-bottom: 3px solid #3498db; padding-bottom: 10px;">📰 {title}</h1>
    <div style="background-color: #f8f9fa; padding: 20px; border-radius: 8px; margin: 20px 0;">
      <h2 style="color: #2c3e50; margin-top: 0;">📋 Summary</h2>
      <p style="font-size: 16px;">{summary}</p>
    </div>
    <div style="text-align: center; margin: 30px 0;">
      <a href="{url}" style="background-color: #3498db; color: white; padding: 12px 30px; text-decoration: none; border-radius: 5px; font-weight: bold; display: inline-block;">📄 Read Full Newsletter</a>
    </div>
    <div style="margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee; font-size: 14px; color: #7f8c8d;">
      <p>This newsletter was automatically generated from Slack conversations.</p>
      <p>Generated by Newsletter MCP Bot 🤖</p>
    </div>
  </div>
</body>
</html>
"#
    )
}

#[must_use]
pub fn render_email_text(title: &str, summary: &str, document_url: &str) -> String {
    format!(
        "{title}\n\nSUMMARY:\n{summary}\n\nRead the full newsletter at: {document_url}\n\n---\n\
         This newsletter was automatically generated from Slack conversations.\n\
         Generated by Newsletter MCP Bot 🤖\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn clip_flattens_and_bounds_text() {
        assert_eq!(clip("  line one\nline two  ", 50), "line one line two");
        let long = "x".repeat(200);
        let clipped = clip(&long, TOPIC_PREVIEW_CHARS);
        assert_eq!(clipped.chars().count(), TOPIC_PREVIEW_CHARS + ELLIPSIS.len());
        assert!(clipped.ends_with("..."));
        assert_eq!(clip(&"y".repeat(120), 120), "y".repeat(120));
    }

    #[test]
    fn clip_counts_characters_not_bytes() {
        let text = "é".repeat(130);
        let clipped = clip(&text, 120);
        assert_eq!(clipped.chars().count(), 123);
    }

    #[test]
    fn engagement_annotation_omits_zero_counts() {
        assert_eq!(engagement(&Message::new("t", "U")), "");
        assert_eq!(engagement(&Message::new("t", "U").with_reactions(3)), " [👍3]");
        assert_eq!(
            engagement(&Message::new("t", "U").with_reactions(2).with_replies(4)),
            " [👍2 💬4]"
        );
    }

    #[test]
    fn document_title_uses_long_month() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap();
        assert_eq!(
            document_title("Weekly Dev Newsletter", at),
            "Weekly Dev Newsletter - March 05, 2024"
        );
    }

    #[test]
    fn email_html_escapes_user_content() {
        let html = render_email_html("Q&A <weekly>", "a < b", "https://x.test/?a=1&b=\"2\"");
        assert!(html.contains("📰 Q&amp;A &lt;weekly&gt;"));
        assert!(html.contains("a &lt; b"));
        assert!(!html.contains("b=\"2\""));
    }

    #[test]
    fn email_text_carries_link() {
        let text = render_email_text("News", "Summary here", "https://docs.example/d/1");
        assert!(text.starts_with("News\n\nSUMMARY:\nSummary here\n"));
        assert!(text.contains("Read the full newsletter at: https://docs.example/d/1"));
    }
}
