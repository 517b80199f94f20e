//! Keyboard-driven selection over a candidate list
//!
//! Shared by the mention picker and the command palette. The machine only
//! tracks phase, candidates and the highlight; the host decides what a
//! confirmed item means.

/// Where the picker is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    Closed,
    /// A search is in flight; previous candidates may still be shown
    Loading,
    /// The latest search resolved (possibly to nothing)
    Ready,
}

#[derive(Debug, Clone)]
pub struct SelectionState<T> {
    phase: SelectionPhase,
    candidates: Vec<T>,
    highlighted: usize,
}

impl<T> Default for SelectionState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SelectionState<T> {
    pub fn new() -> Self {
        Self {
            phase: SelectionPhase::Closed,
            candidates: Vec::new(),
            highlighted: 0,
        }
    }

    pub fn phase(&self) -> SelectionPhase {
        self.phase
    }

    pub fn is_open(&self) -> bool {
        self.phase != SelectionPhase::Closed
    }

    pub fn is_loading(&self) -> bool {
        self.phase == SelectionPhase::Loading
    }

    pub fn candidates(&self) -> &[T] {
        &self.candidates
    }

    pub fn highlighted_index(&self) -> usize {
        self.highlighted
    }

    pub fn highlighted(&self) -> Option<&T> {
        self.candidates.get(self.highlighted)
    }

    /// Resolved with nothing to show; rendered as "no results"
    pub fn is_empty_result(&self) -> bool {
        self.phase == SelectionPhase::Ready && self.candidates.is_empty()
    }

    /// A new query went out. Stale candidates stay visible until it resolves.
    pub fn begin_loading(&mut self) {
        self.phase = SelectionPhase::Loading;
        self.clamp();
    }

    /// The current query resolved: replace candidates and reset the highlight
    pub fn resolve(&mut self, candidates: Vec<T>) {
        self.candidates = candidates;
        self.highlighted = 0;
        self.phase = SelectionPhase::Ready;
    }

    /// Replace candidates without resetting the highlight, only clamping it
    pub fn refresh(&mut self, candidates: Vec<T>) {
        self.candidates = candidates;
        if self.phase == SelectionPhase::Closed {
            self.phase = SelectionPhase::Ready;
        }
        self.clamp();
    }

    /// Search failed: treat as an empty result, not an error state
    pub fn fail(&mut self) {
        self.resolve(Vec::new());
    }

    pub fn move_down(&mut self) {
        if self.highlighted + 1 < self.candidates.len() {
            self.highlighted += 1;
        }
    }

    pub fn move_up(&mut self) {
        self.highlighted = self.highlighted.saturating_sub(1);
    }

    /// Pointer hover; out-of-range indices are clamped
    pub fn highlight(&mut self, index: usize) {
        self.highlighted = index;
        self.clamp();
    }

    /// The candidate Enter would confirm. Nothing is confirmable mid-load.
    pub fn confirmable(&self) -> Option<&T> {
        if self.phase == SelectionPhase::Ready {
            self.highlighted()
        } else {
            None
        }
    }

    pub fn close(&mut self) {
        self.phase = SelectionPhase::Closed;
        self.candidates.clear();
        self.highlighted = 0;
    }

    fn clamp(&mut self) {
        let max = self.candidates.len().saturating_sub(1);
        if self.highlighted > max {
            self.highlighted = max;
        }
    }
}
