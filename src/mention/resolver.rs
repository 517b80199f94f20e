use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A confirmed mention: the literal spliced into the buffer and its entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedMention {
    /// Exact inserted text (marker + canonical label), used as the key
    pub literal_text: String,
    pub entity_id: String,
}

/// Literal-text-keyed mapping of confirmed mentions.
///
/// The buffer is the source of truth: a mention counts as present exactly as
/// long as its literal text is a substring of the current buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MentionResolver {
    mentions: Vec<ResolvedMention>,
}

impl MentionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a mapping. A literal already recorded is re-pointed at `entity_id`.
    pub fn record_mention(&mut self, literal_text: impl Into<String>, entity_id: impl Into<String>) {
        let literal_text = literal_text.into();
        let entity_id = entity_id.into();

        if let Some(existing) = self
            .mentions
            .iter_mut()
            .find(|m| m.literal_text == literal_text)
        {
            if existing.entity_id != entity_id {
                tracing::debug!(
                    "Mention {} re-pointed from {} to {}",
                    literal_text,
                    existing.entity_id,
                    entity_id
                );
                existing.entity_id = entity_id;
            }
            return;
        }

        tracing::debug!("Recorded mention {} -> {}", literal_text, entity_id);
        self.mentions.push(ResolvedMention {
            literal_text,
            entity_id,
        });
    }

    /// Entity ids whose literal is still in `current_text`, deduplicated,
    /// in the order they were first recorded
    pub fn active_entity_ids(&self, current_text: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.active_mentions(current_text)
            .filter(|m| seen.insert(m.entity_id.as_str()))
            .map(|m| m.entity_id.clone())
            .collect()
    }

    /// Recorded mentions whose literal is still in `current_text`
    pub fn active_mentions<'a>(
        &'a self,
        current_text: &'a str,
    ) -> impl Iterator<Item = &'a ResolvedMention> + 'a {
        self.mentions
            .iter()
            .filter(move |m| current_text.contains(m.literal_text.as_str()))
    }

    pub fn mentions(&self) -> &[ResolvedMention] {
        &self.mentions
    }

    pub fn len(&self) -> usize {
        self.mentions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mentions.is_empty()
    }

    pub fn clear(&mut self) {
        self.mentions.clear();
    }
}
