use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use newsletter::core::collaborators::{DocumentSink, MessageSource, NotificationSink, UserLookup};
use newsletter::core::models::{
    ChannelInfo, DeliveryReceipt, DocumentInfo, EmailRecipient, Message, UserInfo,
};
use newsletter::errors::NewsletterError;
use newsletter::workflow::NewsletterWorkflow;

struct FakeSlack {
    channels: Vec<ChannelInfo>,
    history: HashMap<String, Vec<Message>>,
    users: HashMap<String, UserInfo>,
    lookups: AtomicUsize,
}

impl FakeSlack {
    fn new() -> Self {
        Self {
            channels: Vec::new(),
            history: HashMap::new(),
            users: HashMap::new(),
            lookups: AtomicUsize::new(0),
        }
    }

    fn channel(mut self, id: &str, name: &str, members: u64, messages: Vec<Message>) -> Self {
        self.channels.push(ChannelInfo {
            id: id.to_string(),
            name: name.to_string(),
            is_private: false,
            member_count: members,
        });
        self.history.insert(id.to_string(), messages);
        self
    }

    fn user(mut self, id: &str, display: &str) -> Self {
        self.users.insert(
            id.to_string(),
            UserInfo {
                id: id.to_string(),
                display_name: Some(display.to_string()),
                real_name: None,
            },
        );
        self
    }
}

#[async_trait]
impl UserLookup for FakeSlack {
    async fn lookup_user(&self, user_id: &str) -> Result<UserInfo, NewsletterError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.users
            .get(user_id)
            .cloned()
            .ok_or_else(|| NewsletterError::SourceUnavailable("user_not_found".into()))
    }
}

#[async_trait]
impl MessageSource for FakeSlack {
    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, NewsletterError> {
        Ok(self.channels.clone())
    }

    async fn fetch_messages(
        &self,
        channel_id: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<Message>, NewsletterError> {
        self.history
            .get(channel_id)
            .cloned()
            .ok_or_else(|| NewsletterError::SourceUnavailable("not_in_channel".into()))
    }
}

#[derive(Default)]
struct FakeDocs {
    created: Mutex<Vec<(String, String)>>,
    styled: AtomicUsize,
    fail_create: bool,
    fail_style: bool,
}

#[async_trait]
impl DocumentSink for FakeDocs {
    async fn create_document(&self, title: &str, body: &str) -> Result<DocumentInfo, NewsletterError> {
        if self.fail_create {
            return Err(NewsletterError::SinkUnavailable("quota exceeded".into()));
        }
        self.created
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        Ok(DocumentInfo {
            document_id: "doc-1".into(),
            title: title.to_string(),
            url: "https://docs.google.com/document/d/doc-1/edit".into(),
            created_at: Utc::now(),
        })
    }

    async fn append_content(&self, _document_id: &str, _text: &str) -> Result<(), NewsletterError> {
        Ok(())
    }

    async fn apply_title_style(&self, _document_id: &str) -> Result<(), NewsletterError> {
        if self.fail_style {
            return Err(NewsletterError::HttpError("timeout".into()));
        }
        self.styled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
struct FakeMail {
    sent: Mutex<Vec<(Vec<String>, String, String, Option<String>)>>,
    fail: bool,
}

#[async_trait]
impl NotificationSink for FakeMail {
    async fn send_email(
        &self,
        recipients: &[EmailRecipient],
        subject: &str,
        html_body: &str,
        text_body: Option<&str>,
    ) -> Result<DeliveryReceipt, NewsletterError> {
        if self.fail {
            return Err(NewsletterError::SinkUnavailable("smtp down".into()));
        }
        let emails: Vec<String> = recipients.iter().map(|r| r.email.clone()).collect();
        self.sent.lock().unwrap().push((
            emails.clone(),
            subject.to_string(),
            html_body.to_string(),
            text_body.map(ToString::to_string),
        ));
        Ok(DeliveryReceipt {
            message_id: "msg-1".into(),
            thread_id: Some("thread-1".into()),
            recipients: emails,
            subject: subject.to_string(),
            sent_at: Utc::now(),
        })
    }
}

fn run_end() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 14, 17, 0, 0).unwrap()
}

fn busy_workspace() -> FakeSlack {
    FakeSlack::new()
        .user("U1", "alice")
        .user("U2", "bob")
        .channel(
            "C1",
            "engineering",
            8,
            vec![
                Message::new("Release 2.0 shipped, thanks <@U2>!", "U1").with_reactions(4),
                Message::new("lol", "U2"),
                Message::new("Bug in checkout, fix lands tomorrow at 10am", "U2").with_replies(3),
                Message::new("Deploy window moved, ping <@U9>", "U1"),
            ],
        )
        .channel("C2", "watercooler", 20, vec![Message::new("coffee?", "U2")])
}

#[tokio::test]
async fn test_generate_newsletter_end_to_end() {
    let workflow = NewsletterWorkflow::new(busy_workspace(), FakeDocs::default())
        .with_title_prefix("Team Digest");

    let outcome = workflow.generate_newsletter_at(run_end()).await.unwrap();

    assert_eq!(outcome.channels_processed, 2);
    assert_eq!(outcome.channels_skipped, 0);
    assert_eq!(outcome.total_messages, 5);
    assert_eq!(outcome.important_messages, 3);
    assert_eq!(outcome.date_range, "2024-06-07 to 2024-06-14");
    assert_eq!(outcome.document.title, "Team Digest - June 14, 2024");
    assert!(outcome.delivery.is_none());

    let created = workflow.documents().created.lock().unwrap().clone();
    assert_eq!(created.len(), 1);
    let body = &created[0].1;

    assert!(body.starts_with("Weekly Development Newsletter\nGenerated on June 14, 2024\n"));
    assert!(body.contains("Report Period: Jun 07 - Jun 14, 2024"));
    assert!(body.contains("#ENGINEERING\nMembers: 8 | Important Updates: 3\n"));
    assert!(!body.contains("#WATERCOOLER"));
    assert!(body.contains("1. alice: Release 2.0 shipped, thanks @bob! [👍4]"));
    assert!(body.contains("2. bob: Bug in checkout, fix lands tomorrow at 10am [💬3]"));
    // Unknown mention stays as the raw token.
    assert!(body.contains("3. alice: Deploy window moved, ping <@U9>"));
    assert!(body.contains("  • bob: tomorrow ("));
    assert!(body.contains("  • bob: at 10am ("));

    assert_eq!(workflow.documents().styled.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_user_lookups_are_cached_per_run() {
    let workflow = NewsletterWorkflow::new(busy_workspace(), FakeDocs::default());
    workflow.generate_newsletter_at(run_end()).await.unwrap();

    // U1, U2 once each; U9 fails and is retried on its single occurrence only.
    assert_eq!(workflow.source().lookups.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_failed_channel_is_skipped() {
    let mut slack = busy_workspace();
    slack.channels.push(ChannelInfo {
        id: "C404".into(),
        name: "archived-ish".into(),
        is_private: true,
        member_count: 1,
    });

    let workflow = NewsletterWorkflow::new(slack, FakeDocs::default());
    let outcome = workflow.generate_newsletter_at(run_end()).await.unwrap();

    assert_eq!(outcome.channels_processed, 2);
    assert_eq!(outcome.channels_skipped, 1);
}

#[tokio::test]
async fn test_no_channels_is_an_error() {
    let workflow = NewsletterWorkflow::new(FakeSlack::new(), FakeDocs::default());
    let err = workflow.generate_newsletter_at(run_end()).await.unwrap_err();
    assert!(matches!(err, NewsletterError::SourceUnavailable(_)));
    assert!(workflow.documents().created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_document_failure_is_fatal_but_styling_failure_is_not() {
    let failing = FakeDocs {
        fail_create: true,
        ..FakeDocs::default()
    };
    let workflow = NewsletterWorkflow::new(busy_workspace(), failing);
    assert!(matches!(
        workflow.generate_newsletter_at(run_end()).await,
        Err(NewsletterError::SinkUnavailable(_))
    ));

    let unstyled = FakeDocs {
        fail_style: true,
        ..FakeDocs::default()
    };
    let workflow = NewsletterWorkflow::new(busy_workspace(), unstyled);
    assert!(workflow.generate_newsletter_at(run_end()).await.is_ok());
}

#[tokio::test]
async fn test_generate_and_send_emails_document_link() {
    let workflow = NewsletterWorkflow::new(busy_workspace(), FakeDocs::default());
    let mail = FakeMail::default();
    let recipients = vec![EmailRecipient::new("team@example.com")];

    let outcome = workflow
        .generate_and_send(&mail, &recipients, run_end())
        .await
        .unwrap();

    let receipt = outcome.delivery.expect("email should be sent");
    assert_eq!(receipt.recipients, vec!["team@example.com".to_string()]);

    let sent = mail.sent.lock().unwrap();
    let (_, subject, html, text) = &sent[0];
    assert_eq!(subject, &format!("📰 {}", outcome.document.title));
    assert!(html.contains("https://docs.google.com/document/d/doc-1/edit"));
    assert!(html.contains("We&#x27;ve identified 3 important updates") || html.contains("We've identified 3 important updates"));
    assert!(text.as_deref().unwrap().contains("Read the full newsletter at: https://docs.google.com/document/d/doc-1/edit"));
}

#[tokio::test]
async fn test_failed_email_keeps_document() {
    let workflow = NewsletterWorkflow::new(busy_workspace(), FakeDocs::default());
    let mail = FakeMail {
        fail: true,
        ..FakeMail::default()
    };

    let outcome = workflow
        .generate_and_send(&mail, &[EmailRecipient::new("team@example.com")], run_end())
        .await
        .unwrap();
    assert!(outcome.delivery.is_none());
    assert_eq!(outcome.document.document_id, "doc-1");
}

#[tokio::test]
async fn test_no_recipients_sends_nothing() {
    let workflow = NewsletterWorkflow::new(busy_workspace(), FakeDocs::default());
    let mail = FakeMail::default();

    let outcome = workflow.generate_and_send(&mail, &[], run_end()).await.unwrap();
    assert!(outcome.delivery.is_none());
    assert!(mail.sent.lock().unwrap().is_empty());
}
