use ratatui::layout::Rect;

use super::spinner::Spinner;
use crate::assistant::AssistantBox;
use crate::dispatch::DispatchOutcome;
use crate::overlay::AnchoredOverlay;
use crate::palette::{CommandPalette, PaletteItem};

pub struct App {
    pub assistant: AssistantBox<AnchoredOverlay>,
    pub palette: CommandPalette,
    /// Transcript visible; collapsed shows only the input line
    pub expanded: bool,
    pub status: String,
    pub spinner: Spinner,
    pub scroll_offset: usize,
    pub demo: bool,
    /// Last route picked from the palette
    pub location: String,
    /// Where the candidate popup was drawn last frame, for mouse hits
    pub picker_area: Option<Rect>,
    /// Where the palette list was drawn last frame
    pub palette_area: Option<Rect>,
    /// Item index for each drawn palette row; `None` for group headers
    pub palette_rows: Vec<Option<usize>>,
}

impl App {
    pub fn new(assistant: AssistantBox<AnchoredOverlay>, palette: CommandPalette, demo: bool) -> Self {
        Self {
            assistant,
            palette,
            expanded: true,
            status: "Ready".to_string(),
            spinner: Spinner::new(),
            scroll_offset: 0,
            demo,
            location: "/dashboard".to_string(),
            picker_area: None,
            palette_area: None,
            palette_rows: Vec::new(),
        }
    }

    pub fn tick(&mut self) {
        if self.assistant.is_pending() {
            self.spinner.tick();
        }
    }

    pub fn is_thinking(&self) -> bool {
        self.assistant.is_pending()
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }

    pub fn toggle_expanded(&mut self) {
        self.expanded = !self.expanded;
    }

    /// Called once the submission has been handed to the dispatcher
    pub fn command_sent(&mut self) {
        self.spinner.reset();
        self.scroll_to_bottom();
        self.set_status("Thinking...");
    }

    pub fn command_finished(&mut self, outcome: DispatchOutcome) {
        let failed = outcome.is_failure();
        self.assistant.finish_dispatch(outcome);
        self.scroll_to_bottom();

        if !failed {
            self.set_status("Ready");
        } else if self.assistant.last_failed().is_some() {
            self.set_status("Command failed (Ctrl+R restores it)");
        } else {
            self.set_status("Command failed");
        }
    }

    pub fn clear_history(&mut self) {
        self.assistant.clear_history();
        self.scroll_offset = 0;
        self.set_status("History cleared");
    }

    pub fn restore_last_failed(&mut self) {
        if self.assistant.restore_last_failed() {
            self.set_status("Restored unsent message");
        }
    }

    /// The terminal has no pages to switch to, so the palette's target is
    /// only recorded and shown
    pub fn navigate(&mut self, item: PaletteItem) {
        self.location = item.route;
        self.set_status(&format!("Opened {}", item.title));
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset += 1;
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    pub fn scroll_page_up(&mut self) {
        self.scroll_offset += 10;
    }

    pub fn scroll_page_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(10);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }
}

/// Row index under (`column`, `row`) inside a list drawn at `area`
pub fn row_at(area: Option<Rect>, column: u16, row: u16) -> Option<usize> {
    let area = area?;
    let inside = column >= area.x
        && column < area.x + area.width
        && row >= area.y
        && row < area.y + area.height;
    inside.then(|| (row - area.y) as usize)
}
