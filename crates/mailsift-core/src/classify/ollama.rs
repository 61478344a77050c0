//! Classifier backed by an Ollama-compatible `/api/generate` endpoint.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{Classifier, ClassifyError};
use crate::record::Category;

/// Body characters included in the prompt.
const PROMPT_BODY_CHARS: usize = 1000;

const INSTRUCTION: &str = "You sort replies to sales outreach. \
Answer with a single JSON object of the form {\"category\": \"<label>\"} and nothing else.\n\
Rules:\n\
- 'Meeting Booked': an explicit scheduling confirmation.\n\
- 'Out of Office': an automatic absence reply.\n\
- 'Interested': a personal reply showing positive intent about the offer.\n\
- 'Not Interested': a personal reply declining the offer.\n\
- 'Spam': promotions, newsletters, notifications and any other bulk or unrelated mail.\n\
- 'Uncategorized': only when the body is blank or unreadable.";

/// Endpoint settings for [`OllamaClassifier`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Full URL of the generate endpoint.
    pub endpoint: String,
    /// Model name.
    pub model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434/api/generate".to_string(),
            model: "phi3".to_string(),
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    format: &'static str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct Verdict {
    category: String,
}

/// Local language model classifier.
#[derive(Debug, Clone)]
pub struct OllamaClassifier {
    http: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaClassifier {
    /// Creates a classifier for the given endpoint.
    #[must_use]
    pub fn new(config: OllamaConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

/// Builds the generation prompt.
fn build_prompt(subject: &str, body: &str) -> String {
    let labels: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
    let body: String = body.chars().take(PROMPT_BODY_CHARS).collect();
    format!(
        "{INSTRUCTION}\nAvailable labels: {}.\n\nEmail:\nSubject: {subject}\n\nBody: {body}\n\nJSON:",
        labels.join(", ")
    )
}

/// Maps a non-success status to a classifier error.
fn status_error(status: StatusCode) -> ClassifyError {
    if status == StatusCode::SERVICE_UNAVAILABLE {
        ClassifyError::Unavailable
    } else {
        ClassifyError::Failed(format!("model endpoint returned {status}"))
    }
}

/// Pulls the label out of the model's text, tolerating chatter around
/// the JSON object.
fn extract_label(response: &str) -> Result<String, ClassifyError> {
    let start = response.find('{');
    let end = response.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &response[start..=end],
        _ => return Err(ClassifyError::Failed("no JSON object in model output".to_string())),
    };
    serde_json::from_str::<Verdict>(json)
        .map(|v| v.category)
        .map_err(|e| ClassifyError::Failed(format!("invalid model output: {e}")))
}

#[async_trait]
impl Classifier for OllamaClassifier {
    async fn classify(&self, subject: &str, body: &str) -> Result<String, ClassifyError> {
        let request = GenerateRequest {
            model: &self.config.model,
            prompt: build_prompt(subject, body),
            format: "json",
            stream: false,
            options: GenerateOptions { temperature: 0.1 },
        };

        let response = self
            .http
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClassifyError::Failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(status));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ClassifyError::Failed(e.to_string()))?;
        extract_label(generated.response.trim())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_labels_and_cut_body() {
        let body = "x".repeat(PROMPT_BODY_CHARS + 500);
        let prompt = build_prompt("Pricing?", &body);
        assert!(prompt.contains("Meeting Booked, Not Interested"));
        assert!(prompt.contains("Subject: Pricing?"));
        assert!(prompt.contains(&"x".repeat(PROMPT_BODY_CHARS)));
        assert!(!prompt.contains(&"x".repeat(PROMPT_BODY_CHARS + 1)));
    }

    #[test]
    fn test_extract_label() {
        assert_eq!(extract_label("{\"category\": \"Spam\"}").unwrap(), "Spam");
        assert_eq!(
            extract_label("Sure! {\"category\": \"Interested\"} Hope this helps").unwrap(),
            "Interested"
        );
        assert!(extract_label("no json here").is_err());
        assert!(extract_label("{\"label\": \"Spam\"}").is_err());
        assert!(extract_label("} {").is_err());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_error(StatusCode::SERVICE_UNAVAILABLE),
            ClassifyError::Unavailable
        );
        assert!(matches!(
            status_error(StatusCode::INTERNAL_SERVER_ERROR),
            ClassifyError::Failed(_)
        ));
    }

    #[test]
    fn test_default_config() {
        let config = OllamaConfig::default();
        assert_eq!(config.model, "phi3");
        assert!(config.endpoint.ends_with("/api/generate"));
    }
}
