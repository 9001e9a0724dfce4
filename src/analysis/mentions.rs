//! `<@USERID>` mention resolution.

use async_trait::async_trait;
use futures::future::join_all;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::core::collaborators::UserLookup;
use crate::core::models::UserInfo;
use crate::errors::NewsletterError;

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<@([A-Z0-9]+)>")
        .unwrap_or_else(|_| Regex::new(r"$^").expect("fallback regex compiles"))
});

/// Distinct identifiers mentioned in `text`, sorted.
#[must_use]
pub fn mentioned_user_ids(text: &str) -> BTreeSet<String> {
    MENTION_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Replace every `<@ID>` token with `@name`.
///
/// Each distinct identifier is looked up once, concurrently. An identifier
/// whose lookup fails keeps its original bracketed token.
pub async fn resolve_mentions<L>(text: &str, lookup: &L) -> String
where
    L: UserLookup + ?Sized,
{
    let ids = mentioned_user_ids(text);
    if ids.is_empty() {
        return text.to_string();
    }

    let lookups = ids
        .iter()
        .map(|id| async move { (id, lookup.lookup_user(id).await) });

    let mut resolved = text.to_string();
    for (id, result) in join_all(lookups).await {
        match result {
            Ok(user) => {
                let token = format!("<@{id}>");
                resolved = resolved.replace(&token, &format!("@{}", user.preferred_name()));
            }
            Err(e) => {
                warn!("Leaving mention <@{}> unresolved: {}", id, e);
            }
        }
    }

    resolved
}

/// Memoises successful user lookups for as long as the caller keeps it.
///
/// A workflow run creates one of these per batch, so the same author or
/// mention is fetched at most once per run. Failures are not cached.
pub struct UserCache<'a, L: UserLookup + ?Sized> {
    inner: &'a L,
    entries: Mutex<HashMap<String, UserInfo>>,
}

impl<'a, L: UserLookup + ?Sized> UserCache<'a, L> {
    #[must_use]
    pub fn new(inner: &'a L) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl<L: UserLookup + ?Sized> UserLookup for UserCache<'_, L> {
    async fn lookup_user(&self, user_id: &str) -> Result<UserInfo, NewsletterError> {
        if let Some(hit) = self.entries.lock().await.get(user_id) {
            debug!("User cache hit for {}", user_id);
            return Ok(hit.clone());
        }

        let user = self.inner.lookup_user(user_id).await?;
        self.entries
            .lock()
            .await
            .insert(user_id.to_string(), user.clone());
        Ok(user)
    }
}
