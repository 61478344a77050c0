//! Message classification.
//!
//! A [`Classifier`] maps subject and body to a label. The
//! [`ClassificationGate`] wraps it with retries and guarantees a valid
//! [`Category`](crate::record::Category) comes out.

mod gate;
mod ollama;

use async_trait::async_trait;

pub use gate::ClassificationGate;
pub use ollama::{OllamaClassifier, OllamaConfig};

/// Errors returned by a classifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    /// The backend is temporarily unavailable; worth retrying.
    #[error("classifier unavailable")]
    Unavailable,

    /// Any other failure.
    #[error("classification failed: {0}")]
    Failed(String),
}

/// Text-in, label-out classification backend.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Returns the raw label for a message.
    ///
    /// The label is not validated; the gate coerces unknown values.
    async fn classify(&self, subject: &str, body: &str) -> Result<String, ClassifyError>;
}
