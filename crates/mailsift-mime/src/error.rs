//! Parse failures.

/// Shorthand used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a raw message could not be turned into a structured one.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The raw message contained no bytes besides whitespace.
    #[error("Empty message")]
    Empty,

    /// The message has no parseable header block.
    #[error("Message has no headers")]
    MissingHeaders,

    /// A base64 body part was malformed.
    #[error("Invalid base64 content: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// A `multipart/*` part declared no `boundary` parameter.
    #[error("Multipart content without a boundary")]
    MissingBoundary,
}
