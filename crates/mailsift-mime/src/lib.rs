//! # mailsift-mime
//!
//! MIME message parsing for mailbox ingestion.
//!
//! ## Features
//!
//! - **Header parsing**: Folded header lines are unfolded into single values
//! - **Encoded words**: RFC 2047 `B` and `Q` encoded words with charset decoding
//! - **Transfer encodings**: Base64 and Quoted-Printable bodies
//! - **Multipart walking**: Finds the first `text/plain` and `text/html` parts,
//!   including nested `multipart/alternative` sections
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailsift_mime::Message;
//! use mailsift_mime::encoding::decode_encoded_words;
//!
//! let raw = b"From: sender@example.com\r\n\
//!             Subject: =?UTF-8?B?SGVsbG8=?=\r\n\
//!             Content-Type: text/plain\r\n\
//!             \r\n\
//!             Hello, World!";
//!
//! let message = Message::parse(raw)?;
//! assert_eq!(decode_encoded_words(message.subject().unwrap_or_default()), "Hello");
//! assert_eq!(message.text.as_deref(), Some("Hello, World!"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod content_type;
mod error;
mod header;
mod message;

pub mod encoding;

pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, TransferEncoding};
