//! Search filter and result page.

use serde::{Deserialize, Serialize};

use crate::record::{Category, EmailRecord};

/// Default page size.
pub const DEFAULT_LIMIT: u32 = 10;

/// Criteria for [`SearchIndex::search`](super::SearchIndex::search).
///
/// Unset fields do not filter. Results are ordered newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilter {
    /// Free text matched against subject and body.
    pub query: Option<String>,
    /// Exact account id.
    pub account: Option<String>,
    /// Exact folder name.
    pub folder: Option<String>,
    /// Exact category.
    pub category: Option<Category>,
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            query: None,
            account: None,
            folder: None,
            category: None,
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl SearchFilter {
    /// Rows to skip for the requested page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.limit)
    }

    /// The query as a `LIKE` pattern, with wildcards in it escaped by `\`.
    #[must_use]
    pub fn like_pattern(&self) -> Option<String> {
        let query = self.query.as_deref()?.trim();
        if query.is_empty() {
            return None;
        }
        let mut pattern = String::with_capacity(query.len() + 2);
        pattern.push('%');
        for c in query.chars() {
            if matches!(c, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        Some(pattern)
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Number of records matching the filter, across all pages.
    pub total: u64,
    /// Page number returned.
    pub page: u32,
    /// Page size used.
    pub limit: u32,
    /// Records on this page.
    pub emails: Vec<EmailRecord>,
}
