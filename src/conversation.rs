//! Append-only transcript of composed commands and their replies

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dispatch::DispatchOutcome;
use crate::mention::ResolvedMention;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Side effects the interpreter reported
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools_used: Vec<String>,
    /// Mentions that were live in this message, for highlighting
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mentions: Vec<ResolvedMention>,
}

impl Entry {
    fn new(role: Role, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            timestamp: Utc::now(),
            tools_used: Vec::new(),
            mentions: Vec::new(),
        }
    }

    /// Literal texts to highlight when rendering this entry
    pub fn mention_literals(&self) -> Vec<&str> {
        self.mentions.iter().map(|m| m.literal_text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    entries: Vec<Entry>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push_user(&mut self, content: impl Into<String>, mentions: Vec<ResolvedMention>) -> &Entry {
        let mut entry = Entry::new(Role::User, content.into());
        entry.mentions = mentions;
        self.push(entry)
    }

    pub fn push_assistant(&mut self, content: impl Into<String>, tools_used: Vec<String>) -> &Entry {
        let mut entry = Entry::new(Role::Assistant, content.into());
        entry.tools_used = tools_used;
        self.push(entry)
    }

    pub fn push_error(&mut self, content: impl Into<String>) -> &Entry {
        self.push(Entry::new(Role::Error, content.into()))
    }

    /// Append whatever a dispatch produced
    pub fn push_outcome(&mut self, outcome: &DispatchOutcome) -> &Entry {
        match outcome {
            DispatchOutcome::Reply {
                text, side_effects, ..
            } => self.push_assistant(text.clone(), side_effects.clone()),
            DispatchOutcome::Failure { detail, .. } => self.push_error(detail.clone()),
        }
    }

    fn push(&mut self, entry: Entry) -> &Entry {
        self.entries.push(entry);
        let last = self.entries.len() - 1;
        &self.entries[last]
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Serialize the whole transcript
    pub fn snapshot(&self) -> Result<String> {
        serde_json::to_string(&self.entries).context("Failed to serialize conversation")
    }

    /// Rebuild a transcript from [`snapshot`](Self::snapshot) output
    pub fn restore(snapshot: &str) -> Result<Self> {
        let entries: Vec<Entry> =
            serde_json::from_str(snapshot).context("Failed to parse conversation snapshot")?;
        Ok(Self { entries })
    }

    /// Like [`restore`](Self::restore), but a corrupt snapshot starts empty
    pub fn restore_or_empty(snapshot: &str) -> Self {
        match Self::restore(snapshot) {
            Ok(log) => log,
            Err(e) => {
                tracing::warn!("Discarding unreadable conversation snapshot: {:#}", e);
                Self::new()
            }
        }
    }
}
