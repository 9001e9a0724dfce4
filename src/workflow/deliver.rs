use super::render::{render_email_html, render_email_text};

/// `📰 <title>`.
#[must_use]
pub fn newsletter_subject(title: &str) -> String {
    format!("📰 {title}")
}

/// Subject and bodies of the email announcing a published newsletter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLinkEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Compose the summary-plus-link email for a published document.
#[must_use]
pub fn document_link_email(newsletter_title: &str, document_url: &str, summary: &str) -> DocumentLinkEmail {
    DocumentLinkEmail {
        subject: newsletter_subject(newsletter_title),
        html: render_email_html(newsletter_title, summary, document_url),
        text: render_email_text(newsletter_title, summary, document_url),
    }
}
