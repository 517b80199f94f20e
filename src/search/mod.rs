//! Candidate search
//!
//! The picker never talks to the backend directly: it asks an
//! [`EntitySearchProvider`] through a [`SearchCoordinator`], which debounces
//! requests and tags every result with the generation that produced it.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod debounce;

pub use debounce::{SearchCoordinator, SearchUpdate, SearchUpdates};

/// A search result surfaced while a mention token is open
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_ref: Option<String>,
}

impl Candidate {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            secondary_label: None,
            avatar_ref: None,
        }
    }

    pub fn with_secondary(mut self, secondary: impl Into<String>) -> Self {
        self.secondary_label = Some(secondary.into());
        self
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar_ref = Some(avatar.into());
        self
    }

    /// Two-letter initials for avatar-less rendering
    pub fn initials(&self) -> String {
        initials(&self.label)
    }
}

/// First letter of the first and last word, uppercased
pub fn initials(name: &str) -> String {
    let mut words = name.split_whitespace();
    let Some(first) = words.next() else {
        return String::new();
    };

    let mut out: String = first.chars().take(1).flat_map(char::to_uppercase).collect();
    if let Some(last) = words.last() {
        out.extend(last.chars().take(1).flat_map(char::to_uppercase));
    }
    out
}

/// Something that can turn a partial query into ranked candidates.
///
/// Must accept an empty query (typically "most recent").
#[async_trait]
pub trait EntitySearchProvider: Send + Sync {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Candidate>>;
}

/// Fixed, in-process directory. Used by demo mode and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    entries: Vec<Candidate>,
}

impl InMemoryDirectory {
    pub fn new(entries: Vec<Candidate>) -> Self {
        Self { entries }
    }

    /// A handful of made-up contacts for `chat --demo`
    pub fn sample() -> Self {
        Self::new(vec![
            Candidate::new("c1", "John Smith").with_secondary("john@example.com"),
            Candidate::new("c2", "Sarah Connor").with_secondary("sarah@example.com"),
            Candidate::new("c3", "Patrick Jane").with_secondary("patrick@example.com"),
            Candidate::new("c4", "Anna Lee").with_secondary("anna@example.com"),
            Candidate::new("c5", "Ann Lee").with_secondary("ann.lee@example.com"),
            Candidate::new("c6", "Johanna Berg"),
        ])
    }

    /// Case-insensitive substring match on label or secondary label
    pub fn matches(&self, query: &str) -> Vec<Candidate> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .filter(|c| {
                needle.is_empty()
                    || c.label.to_lowercase().contains(&needle)
                    || c
                        .secondary_label
                        .as_deref()
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EntitySearchProvider for InMemoryDirectory {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Candidate>> {
        let mut found = self.matches(query);
        found.truncate(limit);
        Ok(found)
    }
}
