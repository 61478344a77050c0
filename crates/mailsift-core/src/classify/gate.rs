//! Retry and fallback policy around a [`Classifier`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::{Classifier, ClassifyError};
use crate::record::Category;

/// Applies a classifier with bounded retries and a safe fallback.
///
/// Never fails: the result is always one of the [`Category`] labels.
#[derive(Clone)]
pub struct ClassificationGate {
    classifier: Arc<dyn Classifier>,
    max_attempts: u32,
    limiter: Option<Arc<Semaphore>>,
}

impl ClassificationGate {
    /// Creates a gate allowing up to `max_attempts` calls per message.
    #[must_use]
    pub fn new(classifier: Arc<dyn Classifier>, max_attempts: u32) -> Self {
        Self {
            classifier,
            max_attempts: max_attempts.max(1),
            limiter: None,
        }
    }

    /// Shares a concurrency cap with other gates.
    ///
    /// A permit is held only for the duration of each classifier call,
    /// not across backoff sleeps.
    #[must_use]
    pub fn with_limiter(mut self, limiter: Arc<Semaphore>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Classifies a message.
    ///
    /// [`ClassifyError::Unavailable`] is retried after `2^attempt`
    /// seconds. Other errors, exhausted attempts and unknown labels all
    /// yield [`Category::Uncategorized`].
    pub async fn classify(&self, subject: &str, body: &str) -> Category {
        let mut attempt = 1;

        loop {
            let result = {
                let _permit = match &self.limiter {
                    Some(limiter) => limiter.acquire().await.ok(),
                    None => None,
                };
                self.classifier.classify(subject, body).await
            };

            match result {
                Ok(label) => {
                    return Category::parse(&label).unwrap_or_else(|| {
                        warn!(label = %label, "Unknown classification label");
                        Category::Uncategorized
                    });
                }
                Err(ClassifyError::Unavailable) if attempt < self.max_attempts => {
                    let delay = retry_delay(attempt);
                    debug!(attempt, delay_secs = delay.as_secs(), "Classifier unavailable, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(attempt, error = %err, "Classification failed, using fallback");
                    return Category::Uncategorized;
                }
            }
        }
    }
}

/// Wait after failed attempt `attempt`: `2^attempt` seconds, unbounded.
fn retry_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64.checked_shl(attempt).unwrap_or(u64::MAX))
}
