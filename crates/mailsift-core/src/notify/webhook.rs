//! Slack and generic JSON webhook notifiers.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use super::{Notifier, NotifyError};
use crate::record::EmailRecord;

/// Characters of body kept in the generic webhook payload.
const SNIPPET_CHARS: usize = 150;

/// Collapses whitespace runs and cuts the body to a short preview.
#[must_use]
pub fn body_snippet(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    let snippet: String = collapsed.chars().take(SNIPPET_CHARS).collect();
    format!("{snippet}...")
}

/// Slack incoming-webhook message for an interested reply.
#[must_use]
pub fn slack_payload(record: &EmailRecord) -> Value {
    let subject = &record.subject;
    json!({
        "text": format!("New interested email: {subject}"),
        "blocks": [
            {
                "type": "header",
                "text": { "type": "plain_text", "text": "New interested lead" }
            },
            {
                "type": "section",
                "fields": [
                    { "type": "mrkdwn", "text": format!("*From:*\n{}", record.sender) },
                    { "type": "mrkdwn", "text": format!("*Subject:*\n{subject}") },
                    { "type": "mrkdwn", "text": format!("*Account:*\n{}", record.account) },
                    { "type": "mrkdwn", "text": format!("*UID:*\n{}", record.uid) }
                ]
            }
        ]
    })
}

/// Generic webhook body.
#[must_use]
pub fn webhook_payload(record: &EmailRecord) -> Value {
    json!({
        "category": record.category.as_str(),
        "account": record.account.as_str(),
        "subject": record.subject,
        "from": record.sender,
        "date": record.date.to_rfc3339(),
        "body_snippet": body_snippet(&record.body),
        "email_id": record.document_id().as_str(),
    })
}

async fn post_json(http: &reqwest::Client, url: &str, payload: &Value) -> Result<(), NotifyError> {
    let response = http.post(url).json(payload).send().await?;
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(NotifyError::Status(status.as_u16()))
    }
}

/// Posts to a Slack incoming webhook.
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    http: reqwest::Client,
    url: String,
}

impl SlackNotifier {
    /// Creates a notifier posting to `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &'static str {
        "slack"
    }

    async fn notify(&self, record: &EmailRecord) -> Result<(), NotifyError> {
        post_json(&self.http, &self.url, &slack_payload(record)).await?;
        debug!(id = %record.document_id(), "Slack notification sent");
        Ok(())
    }
}

/// Posts a JSON summary to an arbitrary webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    http: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    /// Creates a notifier posting to `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn notify(&self, record: &EmailRecord) -> Result<(), NotifyError> {
        post_json(&self.http, &self.url, &webhook_payload(record)).await?;
        debug!(id = %record.document_id(), "Webhook notification sent");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::account::AccountId;
    use crate::record::Category;
    use chrono::{TimeZone, Utc};

    fn record() -> EmailRecord {
        EmailRecord {
            account: AccountId::new("work"),
            uid: 12,
            folder: "INBOX".to_string(),
            subject: "Demo next week?".to_string(),
            sender: "Dana <dana@example.com>".to_string(),
            date: Utc.with_ymd_and_hms(2025, 7, 1, 9, 30, 0).unwrap(),
            body: "Hi,\n\n  we would   like a demo.\n".to_string(),
            category: Category::Interested,
        }
    }

    #[test]
    fn test_body_snippet_collapses_whitespace() {
        assert_eq!(body_snippet("Hi,\n\n  a   b\t c"), "Hi, a b c...");
        let long = "y".repeat(400);
        assert_eq!(body_snippet(&long).chars().count(), SNIPPET_CHARS + 3);
    }

    #[test]
    fn test_webhook_payload_fields() {
        let payload = webhook_payload(&record());
        assert_eq!(payload["category"], "Interested");
        assert_eq!(payload["account"], "work");
        assert_eq!(payload["from"], "Dana <dana@example.com>");
        assert_eq!(payload["email_id"], "work:12");
        assert_eq!(payload["body_snippet"], "Hi, we would like a demo....");
        assert_eq!(payload["date"], "2025-07-01T09:30:00+00:00");
    }

    #[test]
    fn test_slack_payload_fields() {
        let payload = slack_payload(&record());
        assert_eq!(payload["text"], "New interested email: Demo next week?");
        let fields = payload["blocks"][1]["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[2]["text"], "*Account:*\nwork");
        assert_eq!(fields[3]["text"], "*UID:*\n12");
    }

    #[test]
    fn test_notifier_names() {
        assert_eq!(SlackNotifier::new("http://localhost/slack").name(), "slack");
        assert_eq!(WebhookNotifier::new("http://localhost/hook").name(), "webhook");
    }
}
