//! Email record data models.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::AccountId;

/// Mailbox-scoped message identifier (IMAP UID).
///
/// Unique only within one account and folder.
pub type Uid = u32;

/// Classification label.
///
/// The set is closed: anything else a classifier returns becomes
/// [`Category::Uncategorized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Category {
    /// The sender wants to continue the conversation.
    Interested,
    /// A meeting has been scheduled.
    #[serde(rename = "Meeting Booked")]
    MeetingBooked,
    /// The sender declined.
    #[serde(rename = "Not Interested")]
    NotInterested,
    /// Automatic absence reply.
    #[serde(rename = "Out of Office")]
    OutOfOffice,
    /// Unsolicited bulk mail.
    Spam,
    /// Not classified, or classification failed.
    #[default]
    Uncategorized,
}

impl Category {
    /// Every label, in display order.
    pub const ALL: [Self; 6] = [
        Self::Interested,
        Self::MeetingBooked,
        Self::NotInterested,
        Self::OutOfOffice,
        Self::Spam,
        Self::Uncategorized,
    ];

    /// Parses an exact label.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == s.trim())
    }

    /// The label as stored and exchanged with the classifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Interested => "Interested",
            Self::MeetingBooked => "Meeting Booked",
            Self::NotInterested => "Not Interested",
            Self::OutOfOffice => "Out of Office",
            Self::Spam => "Spam",
            Self::Uncategorized => "Uncategorized",
        }
    }

    /// Whether records with this label trigger notifications.
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        matches!(self, Self::Interested)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index key of a record: `<account>:<uid>`.
///
/// The uid is numeric and always last, so two different
/// `(account, uid)` pairs can never produce the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Derives the id of a message.
    #[must_use]
    pub fn new(account: &AccountId, uid: Uid) -> Self {
        Self(format!("{account}:{uid}"))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A fetched, decoded and (eventually) classified message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRecord {
    /// Owning account.
    pub account: AccountId,
    /// Mailbox-scoped identifier.
    pub uid: Uid,
    /// Folder the message was fetched from.
    pub folder: String,
    /// Decoded subject.
    pub subject: String,
    /// Decoded `From` header.
    #[serde(rename = "from")]
    pub sender: String,
    /// Message date, or processing time when the header was missing.
    pub date: DateTime<Utc>,
    /// Normalized and truncated body.
    pub body: String,
    /// Classification label.
    pub category: Category,
}

impl EmailRecord {
    /// The record's index key.
    #[must_use]
    pub fn document_id(&self) -> DocumentId {
        DocumentId::new(&self.account, self.uid)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_category_parse_exact_labels() {
        for category in Category::ALL {
            assert_eq!(Category::parse(category.as_str()), Some(category));
        }
        assert_eq!(Category::parse(" Spam "), Some(Category::Spam));
        assert_eq!(Category::parse("interested"), None);
        assert_eq!(Category::parse("Urgent"), None);
    }

    #[test]
    fn test_category_default_and_actionable() {
        assert_eq!(Category::default(), Category::Uncategorized);
        assert!(Category::Interested.is_actionable());
        assert!(!Category::MeetingBooked.is_actionable());
    }

    #[test]
    fn test_category_serde_uses_labels() {
        let json = serde_json::to_string(&Category::OutOfOffice).unwrap();
        assert_eq!(json, "\"Out of Office\"");
        let parsed: Category = serde_json::from_str("\"Meeting Booked\"").unwrap();
        assert_eq!(parsed, Category::MeetingBooked);
    }

    #[test]
    fn test_document_id_format() {
        let id = DocumentId::new(&AccountId::new("work"), 42);
        assert_eq!(id.as_str(), "work:42");
    }

    proptest! {
        #[test]
        fn prop_document_ids_unique_across_accounts(
            a in "[a-z0-9:._-]{1,12}",
            b in "[a-z0-9:._-]{1,12}",
            u in any::<u32>(),
            v in any::<u32>(),
        ) {
            prop_assume!(a != b);
            let left = DocumentId::new(&AccountId::new(a), u);
            let right = DocumentId::new(&AccountId::new(b), v);
            prop_assert_ne!(left, right);
        }

        #[test]
        fn prop_same_pair_same_id(a in "[a-z0-9]{1,12}", u in any::<u32>()) {
            let account = AccountId::new(a);
            prop_assert_eq!(DocumentId::new(&account, u), DocumentId::new(&account, u));
        }
    }
}
