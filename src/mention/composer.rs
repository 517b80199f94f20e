use serde::{Deserialize, Serialize};

use super::resolver::MentionResolver;

/// The text of a submitted message plus the entities it still references.
/// Built once per submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedCommand {
    text: String,
    referenced_entity_ids: Vec<String>,
}

impl ComposedCommand {
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Deduplicated, in first-recorded order
    pub fn referenced_entity_ids(&self) -> &[String] {
        &self.referenced_entity_ids
    }

    pub fn into_parts(self) -> (String, Vec<String>) {
        (self.text, self.referenced_entity_ids)
    }
}

/// Reconcile the resolver against the final buffer.
///
/// Pure: neither argument is modified. Mentions are matched against the buffer
/// as typed; the outgoing text is trimmed.
pub fn compose(text: &str, resolver: &MentionResolver) -> ComposedCommand {
    ComposedCommand {
        text: text.trim().to_string(),
        referenced_entity_ids: resolver.active_entity_ids(text),
    }
}
