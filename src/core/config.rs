use std::env;

use crate::errors::NewsletterError;

pub const DEFAULT_DAYS_BACK: i64 = 7;
pub const DEFAULT_TITLE_PREFIX: &str = "Weekly Dev Newsletter";
pub const MAX_DAYS_BACK: i64 = 365;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub slack_bot_token: String,
    pub google_access_token: String,
    pub days_back: i64,
    pub title_prefix: String,
    pub recipients: Vec<String>,
    pub sender_email: Option<String>,
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns `ConfigurationMissing` when a required token is absent or a
    /// numeric setting cannot be parsed.
    pub fn from_env() -> Result<Self, NewsletterError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`AppConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, NewsletterError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| NewsletterError::ConfigurationMissing(key.to_string()))
        };

        let days_back = match lookup("NEWSLETTER_DAYS_BACK") {
            Some(raw) => raw.trim().parse::<i64>().map_err(|e| {
                NewsletterError::ConfigurationMissing(format!("NEWSLETTER_DAYS_BACK: {e}"))
            })?,
            None => DEFAULT_DAYS_BACK,
        };
        if !(1..=MAX_DAYS_BACK).contains(&days_back) {
            return Err(NewsletterError::ConfigurationMissing(format!(
                "NEWSLETTER_DAYS_BACK must be between 1 and {MAX_DAYS_BACK}, got {days_back}"
            )));
        }

        Ok(Self {
            slack_bot_token: required("SLACK_BOT_TOKEN")?,
            google_access_token: required("GOOGLE_ACCESS_TOKEN")?,
            days_back,
            title_prefix: lookup("NEWSLETTER_TITLE_PREFIX")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE_PREFIX.to_string()),
            recipients: lookup("NEWSLETTER_RECIPIENTS")
                .map(|raw| parse_recipients(&raw))
                .unwrap_or_default(),
            sender_email: lookup("NEWSLETTER_SENDER_EMAIL").filter(|v| !v.trim().is_empty()),
        })
    }
}

/// Split a comma separated address list, dropping blanks.
#[must_use]
pub fn parse_recipients(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_slack_token_is_configuration_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("GOOGLE_ACCESS_TOKEN", "g")]))
            .unwrap_err();
        assert!(matches!(err, NewsletterError::ConfigurationMissing(ref k) if k == "SLACK_BOT_TOKEN"));
    }

    #[test]
    fn defaults_apply_when_optional_values_absent() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("SLACK_BOT_TOKEN", "xoxb"),
            ("GOOGLE_ACCESS_TOKEN", "ya29"),
        ]))
        .unwrap();
        assert_eq!(cfg.days_back, DEFAULT_DAYS_BACK);
        assert_eq!(cfg.title_prefix, DEFAULT_TITLE_PREFIX);
        assert!(cfg.recipients.is_empty());
        assert!(cfg.sender_email.is_none());
    }

    #[test]
    fn recipients_are_split_and_trimmed() {
        assert_eq!(
            parse_recipients(" a@example.com, ,b@example.com "),
            vec!["a@example.com".to_string(), "b@example.com".to_string()]
        );
    }

    #[test]
    fn bad_days_back_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[
            ("SLACK_BOT_TOKEN", "xoxb"),
            ("GOOGLE_ACCESS_TOKEN", "ya29"),
            ("NEWSLETTER_DAYS_BACK", "week"),
        ]))
        .unwrap_err();
        assert!(matches!(err, NewsletterError::ConfigurationMissing(_)));
    }

    #[test]
    fn days_back_outside_range_is_rejected() {
        for raw in ["0", "-3", "366"] {
            let result = AppConfig::from_lookup(lookup_from(&[
                ("SLACK_BOT_TOKEN", "xoxb"),
                ("GOOGLE_ACCESS_TOKEN", "ya29"),
                ("NEWSLETTER_DAYS_BACK", raw),
            ]));
            assert!(result.is_err(), "{raw} should be rejected");
        }
    }
}
