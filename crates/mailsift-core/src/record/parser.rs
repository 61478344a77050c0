//! Raw message parsing capability.

use chrono::{DateTime, Utc};
use mailsift_mime::Message;

/// Parser error, re-exported from the MIME crate.
pub type ParseError = mailsift_mime::Error;

/// Header and body fields extracted from a raw message.
///
/// Header values are raw: encoded words are decoded by the record
/// builder, not by the parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMessage {
    /// Raw `Subject` header.
    pub subject: Option<String>,
    /// Raw `From` header.
    pub from: Option<String>,
    /// Parsed `Date` header.
    pub date: Option<DateTime<Utc>>,
    /// First `text/plain` body.
    pub text: Option<String>,
    /// First `text/html` body.
    pub html: Option<String>,
}

/// Turns raw message bytes into [`ParsedMessage`] fields.
pub trait MessageParser: Send + Sync {
    /// Parses one message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is structurally unreadable.
    fn parse(&self, raw: &[u8]) -> Result<ParsedMessage, ParseError>;
}

/// [`MessageParser`] backed by `mailsift-mime`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MimeParser;

impl MessageParser for MimeParser {
    fn parse(&self, raw: &[u8]) -> Result<ParsedMessage, ParseError> {
        let message = Message::parse(raw)?;
        Ok(ParsedMessage {
            subject: message.subject().map(str::to_string),
            from: message.from().map(str::to_string),
            date: message.date().map(|d| d.with_timezone(&Utc)),
            text: message.text,
            html: message.html,
        })
    }
}
