//! Raw message parsing.

use chrono::{DateTime, FixedOffset};

use crate::content_type::ContentType;
use crate::encoding::{decode_base64, decode_charset, decode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;

/// Nested multipart sections deeper than this are not walked.
const MAX_MULTIPART_DEPTH: usize = 8;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit data.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Parses a `Content-Transfer-Encoding` value. Unknown values map to 7bit.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "8bit" => Self::EightBit,
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            "binary" => Self::Binary,
            _ => Self::SevenBit,
        }
    }

    /// Decodes a body encoded with this transfer encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if a Base64 body is malformed.
    pub fn decode(self, body: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Base64 => decode_base64(&String::from_utf8_lossy(body)),
            Self::QuotedPrintable => Ok(decode_quoted_printable(body)),
            Self::SevenBit | Self::EightBit | Self::Binary => Ok(body.to_vec()),
        }
    }
}

/// A parsed message: top-level headers plus the readable bodies.
///
/// Only the first `text/plain` and the first `text/html` part are kept.
/// Attachments and other media types are skipped.
#[derive(Debug, Clone, Default)]
pub struct Message {
    /// Top-level headers, values still raw.
    pub headers: Headers,
    /// Decoded `text/plain` body.
    pub text: Option<String>,
    /// Decoded `text/html` body.
    pub html: Option<String>,
}

impl Message {
    /// Parses a complete RFC 5322 message.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, carries no header fields,
    /// declares a multipart body without a boundary, or contains a
    /// malformed Base64 text part.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Err(Error::Empty);
        }

        let (head, body) = split_header_block(raw);
        let headers = Headers::parse(&String::from_utf8_lossy(head));
        if headers.is_empty() {
            return Err(Error::MissingHeaders);
        }

        let mut bodies = Bodies::default();
        bodies.collect(&headers, body, 0)?;
        Ok(Self {
            headers,
            text: bodies.text,
            html: bodies.html,
        })
    }

    /// Returns the raw `Subject` header.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.headers.get("subject")
    }

    /// Returns the raw `From` header.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.headers.get("from")
    }

    /// Parses the `Date` header.
    ///
    /// A trailing comment such as `(UTC)` is ignored.
    #[must_use]
    pub fn date(&self) -> Option<DateTime<FixedOffset>> {
        let value = self.headers.get("date")?.trim();
        let value = match value.rfind('(') {
            Some(idx) if value.ends_with(')') => value[..idx].trim_end(),
            _ => value,
        };
        DateTime::parse_from_rfc2822(value).ok()
    }
}

/// First text and html bodies found while walking a message.
#[derive(Default)]
struct Bodies {
    text: Option<String>,
    html: Option<String>,
}

impl Bodies {
    fn collect(&mut self, headers: &Headers, body: &[u8], depth: usize) -> Result<()> {
        let content_type = headers
            .get("content-type")
            .map_or_else(ContentType::default, ContentType::parse);

        if content_type.is_multipart() {
            if depth >= MAX_MULTIPART_DEPTH {
                return Ok(());
            }
            let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
            for part in split_multipart(body, boundary) {
                let (head, part_body) = split_header_block(part);
                let part_headers = Headers::parse(&String::from_utf8_lossy(head));
                self.collect(&part_headers, part_body, depth + 1)?;
            }
            return Ok(());
        }

        let is_attachment = headers
            .get("content-disposition")
            .is_some_and(|v| v.trim_start().to_ascii_lowercase().starts_with("attachment"));
        if is_attachment || content_type.main_type != "text" {
            return Ok(());
        }

        let slot = match content_type.sub_type.as_str() {
            "plain" if self.text.is_none() => &mut self.text,
            "html" if self.html.is_none() => &mut self.html,
            _ => return Ok(()),
        };

        let encoding = headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::SevenBit, TransferEncoding::parse);
        let bytes = encoding.decode(body)?;
        let charset = content_type.charset().unwrap_or("utf-8");
        *slot = Some(decode_charset(&bytes, charset));
        Ok(())
    }
}

/// Splits a message or part at the first empty line.
///
/// Without an empty line the whole input is treated as headers.
fn split_header_block(raw: &[u8]) -> (&[u8], &[u8]) {
    let mut offset = 0;
    for line in raw.split_inclusive(|b| *b == b'\n') {
        if line == b"\n" || line == b"\r\n" {
            return (&raw[..offset], &raw[offset + line.len()..]);
        }
        offset += line.len();
    }
    (raw, &[])
}

/// Returns the body of every part between `--boundary` delimiters.
///
/// The preamble and epilogue are dropped. A missing close delimiter ends
/// the last part at the end of the input.
fn split_multipart<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let close = format!("{delimiter}--");
    let mut parts = Vec::new();
    let mut start: Option<usize> = None;
    let mut offset = 0;

    for line in body.split_inclusive(|b| *b == b'\n') {
        let trimmed = trim_line(line);
        let is_close = trimmed == close.as_bytes();
        if is_close || trimmed == delimiter.as_bytes() {
            if let Some(begin) = start.take() {
                parts.push(strip_line_ending(&body[begin..offset]));
            }
            if is_close {
                return parts;
            }
            start = Some(offset + line.len());
        }
        offset += line.len();
    }

    if let Some(begin) = start {
        parts.push(&body[begin..]);
    }
    parts
}

fn trim_line(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |i| i + 1);
    &line[..end]
}

/// Drops the line break that belongs to the following delimiter.
fn strip_line_ending(part: &[u8]) -> &[u8] {
    let part = part.strip_suffix(b"\n").unwrap_or(part);
    part.strip_suffix(b"\r").unwrap_or(part)
}
