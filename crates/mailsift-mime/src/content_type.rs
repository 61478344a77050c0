//! `Content-Type` values.

use std::collections::HashMap;

/// Parsed `Content-Type` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Lowercased top-level type, such as `text`.
    pub main_type: String,
    /// Lowercased subtype, such as `html`.
    pub sub_type: String,
    /// Parameters keyed by lowercased name.
    pub parameters: HashMap<String, String>,
}

impl Default for ContentType {
    /// `text/plain; charset=us-ascii`, the RFC 2045 default.
    fn default() -> Self {
        let mut parameters = HashMap::new();
        parameters.insert("charset".to_string(), "us-ascii".to_string());
        Self {
            main_type: "text".to_string(),
            sub_type: "plain".to_string(),
            parameters,
        }
    }
}

impl ContentType {
    /// Declared charset.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameters.get("charset").map(String::as_str)
    }

    /// Multipart delimiter.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameters.get("boundary").map(String::as_str)
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type == "multipart"
    }

    /// Checks for an exact `main/sub` match.
    #[must_use]
    pub fn is(&self, main_type: &str, sub_type: &str) -> bool {
        self.main_type == main_type && self.sub_type == sub_type
    }

    /// Parses a content type value.
    ///
    /// Format: `type/subtype; param1=value1; param2="value 2"`. Values
    /// that cannot be understood fall back to the RFC default of
    /// `text/plain`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        let mut parts = s.split(';');
        let type_str = parts.next().unwrap_or_default().trim();

        let Some((main, sub)) = type_str.split_once('/') else {
            return Self::default();
        };
        let (main, sub) = (main.trim(), sub.trim());
        if main.is_empty() || sub.is_empty() {
            return Self::default();
        }

        let mut parameters = HashMap::new();
        for param in parts {
            if let Some((key, value)) = param.trim().split_once('=') {
                parameters.insert(
                    key.trim().to_ascii_lowercase(),
                    value.trim().trim_matches('"').to_string(),
                );
            }
        }

        Self {
            main_type: main.to_ascii_lowercase(),
            sub_type: sub.to_ascii_lowercase(),
            parameters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_parse() {
        let ct = ContentType::parse("Text/HTML; Charset=UTF-8");
        assert!(ct.is("text", "html"));
        assert_eq!(ct.charset(), Some("UTF-8"));
        assert!(!ct.is_multipart());
    }

    #[test]
    fn test_content_type_parse_quoted_boundary() {
        let ct = ContentType::parse("multipart/alternative; boundary=\"----=_Part_123\"");
        assert!(ct.is_multipart());
        assert_eq!(ct.boundary(), Some("----=_Part_123"));
    }

    #[test]
    fn test_content_type_fallback() {
        let ct = ContentType::parse("garbage");
        assert!(ct.is("text", "plain"));
        assert_eq!(ct.charset(), Some("us-ascii"));

        assert_eq!(ContentType::parse("/"), ContentType::default());
    }
}
