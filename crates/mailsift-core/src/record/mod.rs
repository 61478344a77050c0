//! Email records.
//!
//! The unit of work of the pipeline: a message of one account, decoded
//! and normalized, waiting for (or carrying) its classification label.

mod builder;
mod model;
mod parser;

pub use builder::{
    BuildError, DEFAULT_SENDER, DEFAULT_SUBJECT, MessageRecordBuilder, TRUNCATION_MARKER,
    normalize_body,
};
pub use model::{Category, DocumentId, EmailRecord, Uid};
pub use parser::{MessageParser, MimeParser, ParseError, ParsedMessage};
