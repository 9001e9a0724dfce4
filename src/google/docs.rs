use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde_json::{Value, json};
use tracing::{debug, info};

use super::{GoogleApi, required_str};
use crate::core::collaborators::DocumentSink;
use crate::core::models::DocumentInfo;
use crate::errors::NewsletterError;

const DOCS_API_BASE: &str = "https://docs.googleapis.com/v1/documents";
const DRIVE_FILES_BASE: &str = "https://www.googleapis.com/drive/v3/files";

/// Only paragraphs starting before this index are title candidates.
const TITLE_SEARCH_LIMIT: i64 = 50;
const TITLE_FONT_SIZE_PT: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareRole {
    Reader,
    Writer,
    Owner,
}

impl ShareRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ShareRole::Reader => "reader",
            ShareRole::Writer => "writer",
            ShareRole::Owner => "owner",
        }
    }
}

#[must_use]
pub fn document_url(document_id: &str) -> String {
    format!("https://docs.google.com/document/d/{document_id}/edit")
}

/// Drive endpoint that deletes a document outright.
#[must_use]
pub fn delete_url(document_id: &str) -> String {
    format!("{DRIVE_FILES_BASE}/{document_id}")
}

/// Drive permission endpoint and body granting `email` the given role.
/// Drive's own notification email is suppressed.
#[must_use]
pub fn share_request(document_id: &str, email: &str, role: ShareRole) -> (String, Value) {
    let url = format!("{DRIVE_FILES_BASE}/{document_id}/permissions?sendNotificationEmail=false");
    let permission = json!({
        "type": "user",
        "role": role.as_str(),
        "emailAddress": email,
    });
    (url, permission)
}

/// `updateTextStyle` request for the first early paragraph mentioning
/// "Newsletter", excluding its trailing newline.
#[must_use]
pub fn title_style_request(document: &Value) -> Option<Value> {
    let content = document.pointer("/body/content")?.as_array()?;

    content.iter().find_map(|element| {
        let first = element.pointer("/paragraph/elements/0")?;
        let text = first.pointer("/textRun/content")?.as_str()?;
        let start = first.get("startIndex").and_then(Value::as_i64).unwrap_or(0);
        let end = first.get("endIndex").and_then(Value::as_i64).unwrap_or(0);

        if !text.contains("Newsletter") || start >= TITLE_SEARCH_LIMIT {
            return None;
        }

        Some(json!({
            "updateTextStyle": {
                "range": { "startIndex": start, "endIndex": end - 1 },
                "textStyle": {
                    "fontSize": { "magnitude": TITLE_FONT_SIZE_PT, "unit": "PT" },
                    "bold": true
                },
                "fields": "fontSize,bold"
            }
        }))
    })
}

/// Google Docs client; Drive is used for sharing and deletion.
#[derive(Debug, Clone)]
pub struct GoogleDocsClient {
    api: GoogleApi,
}

impl GoogleDocsClient {
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            api: GoogleApi::new(access_token),
        }
    }

    async fn batch_update(&self, document_id: &str, requests: Vec<Value>) -> Result<(), NewsletterError> {
        let url = format!("{DOCS_API_BASE}/{document_id}:batchUpdate");
        self.api
            .request(Method::POST, &url, Some(&json!({ "requests": requests })))
            .await?;
        Ok(())
    }

    /// Permanently delete a document. Drive does not move it to the trash.
    ///
    /// # Errors
    ///
    /// Returns `SinkUnavailable` if Drive rejects the deletion.
    pub async fn delete_document(&self, document_id: &str) -> Result<(), NewsletterError> {
        self.api
            .request(Method::DELETE, &delete_url(document_id), None)
            .await?;
        info!("Deleted document {}", document_id);
        Ok(())
    }

    /// Grant `email` access to a document without sending Drive's own notification.
    ///
    /// # Errors
    ///
    /// Returns `SinkUnavailable` if Drive rejects the permission.
    pub async fn share_document(
        &self,
        document_id: &str,
        email: &str,
        role: ShareRole,
    ) -> Result<(), NewsletterError> {
        let (url, permission) = share_request(document_id, email, role);
        self.api.request(Method::POST, &url, Some(&permission)).await?;
        info!("Shared document {} with {} as {}", document_id, email, role.as_str());
        Ok(())
    }
}

#[async_trait]
impl DocumentSink for GoogleDocsClient {
    async fn create_document(&self, title: &str, body: &str) -> Result<DocumentInfo, NewsletterError> {
        let created = self
            .api
            .request(Method::POST, DOCS_API_BASE, Some(&json!({ "title": title })))
            .await?;
        let document_id = required_str(&created, "documentId")?;

        if !body.is_empty() {
            self.append_content(&document_id, body).await?;
        }

        info!("Created document {} ({})", title, document_id);
        Ok(DocumentInfo {
            url: document_url(&document_id),
            document_id,
            title: title.to_string(),
            created_at: Utc::now(),
        })
    }

    async fn append_content(&self, document_id: &str, text: &str) -> Result<(), NewsletterError> {
        let insert = json!({
            "insertText": {
                "location": { "index": 1 },
                "text": text
            }
        });
        self.batch_update(document_id, vec![insert]).await
    }

    async fn apply_title_style(&self, document_id: &str) -> Result<(), NewsletterError> {
        let url = format!("{DOCS_API_BASE}/{document_id}");
        let document = self.api.request(Method::GET, &url, None).await?;

        match title_style_request(&document) {
            Some(request) => self.batch_update(document_id, vec![request]).await,
            None => {
                debug!("No title paragraph found in {}", document_id);
                Ok(())
            }
        }
    }
}
