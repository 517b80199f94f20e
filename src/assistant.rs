//! The assistant box: free-text entry with @-mentions
//!
//! Owns the text buffer and caret, and re-derives mention state from them on
//! every edit. Candidate searches go out through a [`SearchCoordinator`];
//! their results come back on the coordinator's channel and are handed to
//! [`AssistantBox::apply_search_update`] by the host loop.

use unicode_width::UnicodeWidthStr;

use crate::conversation::ConversationLog;
use crate::dispatch::{CommandRequest, DispatchOutcome};
use crate::input::Key;
use crate::mention::{
    compose, detect, ComposedCommand, MentionResolver, MentionToken, ResolvedMention,
    SelectionState,
};
use crate::overlay::{Overlay, OverlayAnchor};
use crate::search::{Candidate, SearchCoordinator, SearchUpdate};

/// What the host should do after a key press
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// The box consumed the key
    Handled,
    /// A message was composed; the host must dispatch it and report back
    /// through [`AssistantBox::finish_dispatch`]
    Submit(Submission),
    /// Not ours (e.g. Up with no picker open); the host may use it
    Ignored,
}

/// A composed command ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub command: ComposedCommand,
    pub request: CommandRequest,
}

/// Everything needed to put a message back if its dispatch fails
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub command: ComposedCommand,
    buffer: String,
    caret: usize,
    resolver: MentionResolver,
}

impl PendingSubmission {
    /// The buffer exactly as it was when submitted
    pub fn text(&self) -> &str {
        &self.buffer
    }
}

pub struct AssistantBox<O: Overlay> {
    marker: char,
    buffer: String,
    caret: usize,
    token: Option<MentionToken>,
    /// Marker offset of a token closed with Escape; caret moves don't reopen it
    dismissed: Option<usize>,
    selection: SelectionState<Candidate>,
    resolver: MentionResolver,
    search: SearchCoordinator,
    overlay: O,
    log: ConversationLog,
    conversation_id: Option<String>,
    pending: Option<PendingSubmission>,
    last_failed: Option<PendingSubmission>,
    edited_since_submit: bool,
}

impl<O: Overlay> AssistantBox<O> {
    pub fn new(marker: char, search: SearchCoordinator, overlay: O) -> Self {
        Self {
            marker,
            buffer: String::new(),
            caret: 0,
            token: None,
            dismissed: None,
            selection: SelectionState::new(),
            resolver: MentionResolver::new(),
            search,
            overlay,
            log: ConversationLog::new(),
            conversation_id: None,
            pending: None,
            last_failed: None,
            edited_since_submit: false,
        }
    }

    // === Accessors ===

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Caret as a byte offset into [`buffer`](Self::buffer)
    pub fn caret(&self) -> usize {
        self.caret
    }

    /// Caret as a display column
    pub fn caret_column(&self) -> usize {
        self.buffer[..self.caret].width()
    }

    pub fn marker(&self) -> char {
        self.marker
    }

    pub fn token(&self) -> Option<&MentionToken> {
        self.token.as_ref()
    }

    pub fn selection(&self) -> &SelectionState<Candidate> {
        &self.selection
    }

    pub fn resolver(&self) -> &MentionResolver {
        &self.resolver
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    /// Whether a dispatch is in flight
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_failed(&self) -> Option<&PendingSubmission> {
        self.last_failed.as_ref()
    }

    // === Editing ===

    pub fn insert_char(&mut self, c: char) {
        self.buffer.insert(self.caret, c);
        self.caret += c.len_utf8();
        self.edited();
    }

    pub fn insert_str(&mut self, text: &str) {
        self.buffer.insert_str(self.caret, text);
        self.caret += text.len();
        self.edited();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = self.buffer[..self.caret].chars().next_back() {
            self.caret -= prev.len_utf8();
            self.buffer.remove(self.caret);
            self.edited();
        }
    }

    pub fn delete(&mut self) {
        if self.caret < self.buffer.len() {
            self.buffer.remove(self.caret);
            self.edited();
        }
    }

    pub fn cursor_left(&mut self) {
        if let Some(prev) = self.buffer[..self.caret].chars().next_back() {
            self.caret -= prev.len_utf8();
            self.refresh_token();
        }
    }

    pub fn cursor_right(&mut self) {
        if let Some(next) = self.buffer[self.caret..].chars().next() {
            self.caret += next.len_utf8();
            self.refresh_token();
        }
    }

    pub fn cursor_home(&mut self) {
        self.caret = 0;
        self.refresh_token();
    }

    pub fn cursor_end(&mut self) {
        self.caret = self.buffer.len();
        self.refresh_token();
    }

    /// Take a fresh snapshot from a host that owns the text surface.
    /// An out-of-range or mid-character caret is clamped back to a boundary.
    pub fn sync(&mut self, text: &str, caret: usize) {
        let text_changed = self.buffer != text;
        self.buffer = text.to_string();
        let mut caret = caret.min(self.buffer.len());
        while !self.buffer.is_char_boundary(caret) {
            caret -= 1;
        }
        self.caret = caret;

        if text_changed {
            self.edited();
        } else {
            self.refresh_token();
        }
    }

    fn edited(&mut self) {
        self.dismissed = None;
        self.edited_since_submit = true;
        self.refresh_token();
    }

    // === Mention token ===

    /// Re-run detection against the current buffer and caret
    fn refresh_token(&mut self) {
        let detected = detect(&self.buffer, self.caret, self.marker)
            .filter(|t| self.dismissed != Some(t.start_offset));

        let Some(token) = detected else {
            self.close_token();
            return;
        };

        let moved = self.token.as_ref().map(|t| t.start_offset) != Some(token.start_offset);
        let query_changed = moved
            || self
                .token
                .as_ref()
                .map_or(true, |t| t.raw_query != token.raw_query);

        if moved {
            tracing::debug!("Mention token opened at {}", token.start_offset);
            let column = self.buffer[..token.start_offset].width();
            self.overlay.open(OverlayAnchor {
                offset: token.start_offset,
                column,
            });
        }

        if query_changed {
            self.selection.begin_loading();
            self.search.request(&token.raw_query);
        }

        self.token = Some(token);
    }

    fn close_token(&mut self) {
        if self.token.take().is_some() || self.selection.is_open() {
            tracing::debug!("Mention token closed");
            self.selection.close();
            self.search.cancel();
            self.overlay.close();
        }
    }

    /// Close the open token without touching the buffer
    pub fn cancel_mention(&mut self) {
        if let Some(token) = &self.token {
            self.dismissed = Some(token.start_offset);
        }
        self.close_token();
    }

    /// Feed a search result from the coordinator's channel.
    ///
    /// Returns whether it was applied. Results for anything but the most
    /// recently initiated request, or for a query the buffer no longer holds,
    /// are dropped.
    pub fn apply_search_update(&mut self, update: SearchUpdate) -> bool {
        if !self.search.is_current(&update) {
            tracing::debug!(
                "Dropping stale results for {:?} (gen {})",
                update.query,
                update.generation
            );
            return false;
        }

        let Some(token) = &self.token else {
            return false;
        };
        if token.raw_query != update.query {
            tracing::debug!(
                "Dropping results for {:?}, query is now {:?}",
                update.query,
                token.raw_query
            );
            return false;
        }

        match update.outcome {
            Ok(candidates) => self.selection.resolve(candidates),
            Err(_) => self.selection.fail(),
        }
        true
    }

    // === Selection ===

    pub fn select_down(&mut self) {
        self.selection.move_down();
    }

    pub fn select_up(&mut self) {
        self.selection.move_up();
    }

    /// Pointer hover over a candidate row
    pub fn hover(&mut self, index: usize) {
        self.selection.highlight(index);
    }

    /// Confirm the highlighted candidate. False if nothing is confirmable.
    pub fn confirm_highlighted(&mut self) -> bool {
        match self.selection.confirmable().cloned() {
            Some(candidate) => {
                self.confirm(candidate);
                true
            }
            None => false,
        }
    }

    /// Confirm the candidate at `index` (a click on its row)
    pub fn confirm_index(&mut self, index: usize) -> bool {
        if !self.selection.is_open() {
            return false;
        }
        match self.selection.candidates().get(index).cloned() {
            Some(candidate) => {
                self.confirm(candidate);
                true
            }
            None => false,
        }
    }

    /// Splice `marker + label` over the `marker + query` span, add one
    /// space, park the caret after it and record the mapping.
    fn confirm(&mut self, candidate: Candidate) {
        let Some(token) = self.token.take() else {
            return;
        };

        let literal = format!("{}{}", self.marker, candidate.label);
        let end = token.end_offset(self.marker).min(self.buffer.len());

        let mut spliced = String::with_capacity(self.buffer.len() + literal.len() + 1);
        spliced.push_str(&self.buffer[..token.start_offset]);
        spliced.push_str(&literal);
        spliced.push(' ');
        spliced.push_str(&self.buffer[end..]);

        self.buffer = spliced;
        self.caret = token.start_offset + literal.len() + 1;
        self.resolver.record_mention(literal, candidate.id);

        self.dismissed = None;
        self.edited_since_submit = true;
        self.selection.close();
        self.search.cancel();
        self.overlay.close();
    }

    // === Submit / dispatch ===

    /// Compose the buffer into a command and reset for the next message.
    ///
    /// The pre-reset buffer and mentions are kept until
    /// [`finish_dispatch`](Self::finish_dispatch) reports the outcome.
    pub fn submit(&mut self) -> Option<Submission> {
        if self.pending.is_some() {
            tracing::debug!("Submit ignored, a command is still in flight");
            return None;
        }
        if self.buffer.trim().is_empty() {
            return None;
        }

        let command = compose(&self.buffer, &self.resolver);
        let mentions: Vec<ResolvedMention> =
            self.resolver.active_mentions(&self.buffer).cloned().collect();
        let request = CommandRequest::from_command(&command, self.conversation_id.clone());

        self.log.push_user(command.text(), mentions);
        self.pending = Some(PendingSubmission {
            command: command.clone(),
            buffer: std::mem::take(&mut self.buffer),
            caret: self.caret,
            resolver: std::mem::take(&mut self.resolver),
        });
        self.caret = 0;
        self.dismissed = None;
        self.edited_since_submit = false;
        self.last_failed = None;
        self.close_token();

        tracing::info!(
            "Submitted command with {} mention(s)",
            command.referenced_entity_ids().len()
        );
        Some(Submission { command, request })
    }

    /// Record the dispatch outcome in the log.
    ///
    /// On failure the message comes back into the box if nothing was typed
    /// since submitting; otherwise it is parked in
    /// [`last_failed`](Self::last_failed).
    pub fn finish_dispatch(&mut self, outcome: DispatchOutcome) {
        let pending = self.pending.take();
        self.log.push_outcome(&outcome);

        match outcome {
            DispatchOutcome::Reply {
                conversation_id, ..
            } => {
                if conversation_id.is_some() {
                    self.conversation_id = conversation_id;
                }
            }
            DispatchOutcome::Failure { .. } => {
                let Some(pending) = pending else {
                    return;
                };
                if !self.edited_since_submit && self.buffer.is_empty() {
                    self.restore(pending);
                } else {
                    self.last_failed = Some(pending);
                }
            }
        }
    }

    /// Put the last failed message back, if the box is empty
    pub fn restore_last_failed(&mut self) -> bool {
        if !self.buffer.is_empty() {
            return false;
        }
        match self.last_failed.take() {
            Some(pending) => {
                self.restore(pending);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, pending: PendingSubmission) {
        tracing::debug!("Restoring unsent message ({} chars)", pending.buffer.len());
        self.buffer = pending.buffer;
        self.caret = pending.caret.min(self.buffer.len());
        self.resolver = pending.resolver;
        self.refresh_token();
    }

    /// Drop the transcript and start a fresh backend conversation
    pub fn clear_history(&mut self) {
        self.log.clear();
        self.conversation_id = None;
    }

    // === Keyboard surface ===

    pub fn handle_key(&mut self, key: Key) -> KeyOutcome {
        let picking = self.selection.is_open();

        match key {
            Key::Up if picking => self.select_up(),
            Key::Down if picking => self.select_down(),
            // Enter belongs to the picker while it is open, even with nothing to confirm
            Key::Enter if picking => {
                self.confirm_highlighted();
            }
            Key::Escape if picking => self.cancel_mention(),
            Key::Enter => {
                return match self.submit() {
                    Some(submission) => KeyOutcome::Submit(submission),
                    None => KeyOutcome::Handled,
                };
            }
            Key::Up | Key::Down | Key::Escape => return KeyOutcome::Ignored,
            Key::Char(c) => self.insert_char(c),
            Key::Backspace => self.backspace(),
            Key::Delete => self.delete(),
            Key::Left => self.cursor_left(),
            Key::Right => self.cursor_right(),
            Key::Home => self.cursor_home(),
            Key::End => self.cursor_end(),
        }

        KeyOutcome::Handled
    }
}
