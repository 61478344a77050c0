//! Construction of [`EmailRecord`]s from parsed messages.

use chrono::Utc;
use mailsift_mime::encoding::decode_encoded_words;

use super::model::{Category, EmailRecord, Uid};
use super::parser::ParsedMessage;
use crate::account::AccountId;

/// Appended to bodies cut at the length limit.
pub const TRUNCATION_MARKER: &str = "... (truncated)";

/// Subject used when the header is missing or blank.
pub const DEFAULT_SUBJECT: &str = "No Subject";

/// Sender used when the header is missing or blank.
pub const DEFAULT_SENDER: &str = "Unknown";

/// Why a message produced no record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// Neither a text nor an html body with content.
    #[error("message has no readable body")]
    EmptyBody,
}

/// Builds canonical records: decoded headers, normalized body, defaults.
#[derive(Debug, Clone, Copy)]
pub struct MessageRecordBuilder {
    body_limit: usize,
}

impl Default for MessageRecordBuilder {
    fn default() -> Self {
        Self::new(5000)
    }
}

impl MessageRecordBuilder {
    /// Creates a builder truncating bodies at `body_limit` characters.
    #[must_use]
    pub const fn new(body_limit: usize) -> Self {
        Self { body_limit }
    }

    /// Builds an uncategorized record.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::EmptyBody`] if the message has no body text
    /// after trimming.
    pub fn build(
        &self,
        account: &AccountId,
        folder: &str,
        uid: Uid,
        parsed: &ParsedMessage,
    ) -> Result<EmailRecord, BuildError> {
        let body = normalize_body(parsed.text.as_deref(), parsed.html.as_deref(), self.body_limit)
            .ok_or(BuildError::EmptyBody)?;

        Ok(EmailRecord {
            account: account.clone(),
            uid,
            folder: folder.to_string(),
            subject: decode_header(parsed.subject.as_deref(), DEFAULT_SUBJECT),
            sender: decode_header(parsed.from.as_deref(), DEFAULT_SENDER),
            date: parsed.date.unwrap_or_else(Utc::now),
            body,
            category: Category::Uncategorized,
        })
    }
}

fn decode_header(value: Option<&str>, fallback: &str) -> String {
    let decoded = value.map(decode_encoded_words).unwrap_or_default();
    let decoded = decoded.trim();
    if decoded.is_empty() {
        fallback.to_string()
    } else {
        decoded.to_string()
    }
}

/// Picks the plain text body, falling back to html, trims it and cuts it
/// at `limit` characters.
///
/// Returns `None` when nothing but whitespace remains.
#[must_use]
pub fn normalize_body(text: Option<&str>, html: Option<&str>, limit: usize) -> Option<String> {
    let body = text
        .filter(|t| !t.is_empty())
        .or(html)
        .unwrap_or_default()
        .trim();
    if body.is_empty() {
        return None;
    }

    match body.char_indices().nth(limit) {
        Some((cut, _)) => Some(format!("{}{TRUNCATION_MARKER}", &body[..cut])),
        None => Some(body.to_string()),
    }
}
