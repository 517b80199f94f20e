//! Mention token detection
//!
//! Decides, from nothing but the buffer and the caret, whether the caret sits
//! inside an open mention token. Nothing is remembered between calls.

/// An in-progress mention: the marker and what has been typed after it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionToken {
    /// Byte offset of the marker in the buffer
    pub start_offset: usize,
    /// Text typed since the marker, excluding the marker itself
    pub raw_query: String,
}

impl MentionToken {
    /// Byte offset one past the end of the `marker + query` span
    pub fn end_offset(&self, marker: char) -> usize {
        self.start_offset + marker.len_utf8() + self.raw_query.len()
    }

    /// Whether `caret` still lies within `[start, start + 1 + len(query)]`
    pub fn contains_caret(&self, marker: char, caret: usize) -> bool {
        caret >= self.start_offset && caret <= self.end_offset(marker)
    }
}

/// Detect the open mention token around `caret`, if any.
///
/// Only the nearest marker behind the caret is considered. It must sit at the
/// start of the buffer or directly after whitespace, and the span between it
/// and the caret must contain no whitespace.
pub fn detect(text: &str, caret: usize, marker: char) -> Option<MentionToken> {
    let caret = caret.min(text.len());
    if !text.is_char_boundary(caret) {
        return None;
    }

    let before = &text[..caret];
    let start = before.rfind(marker)?;

    let eligible = before[..start]
        .chars()
        .next_back()
        .map_or(true, char::is_whitespace);
    if !eligible {
        return None;
    }

    let query = &before[start + marker.len_utf8()..];
    if query.chars().any(char::is_whitespace) {
        return None;
    }

    Some(MentionToken {
        start_offset: start,
        raw_query: query.to_string(),
    })
}
