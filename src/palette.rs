//! Global command palette
//!
//! Static navigation and quick-action commands merged with live contact
//! results. The static list is filtered synchronously on every keystroke;
//! contacts arrive through a [`SearchCoordinator`] like mention candidates
//! do. Both feed one [`SelectionState`], ordered by category group.

use crate::input::Key;
use crate::mention::SelectionState;
use crate::search::{Candidate, SearchCoordinator, SearchUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PaletteCategory {
    Contacts,
    Navigation,
    Actions,
    Tags,
}

impl PaletteCategory {
    pub fn label(&self) -> &'static str {
        match self {
            PaletteCategory::Contacts => "Contacts",
            PaletteCategory::Navigation => "Navigation",
            PaletteCategory::Actions => "Quick Actions",
            PaletteCategory::Tags => "Tags",
        }
    }

    /// Lowercase name, also matched against the query
    pub fn key(&self) -> &'static str {
        match self {
            PaletteCategory::Contacts => "contacts",
            PaletteCategory::Navigation => "navigation",
            PaletteCategory::Actions => "actions",
            PaletteCategory::Tags => "tags",
        }
    }
}

/// One executable row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteItem {
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub category: PaletteCategory,
    /// Where executing the item navigates to
    pub route: String,
    /// Avatar initials, contacts only
    pub initials: Option<String>,
}

impl PaletteItem {
    fn fixed(
        id: &str,
        title: &str,
        subtitle: Option<&str>,
        category: PaletteCategory,
        route: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            subtitle: subtitle.map(str::to_string),
            category,
            route: route.to_string(),
            initials: None,
        }
    }

    pub fn from_contact(candidate: &Candidate) -> Self {
        Self {
            id: format!("contact-{}", candidate.id),
            title: candidate.label.clone(),
            subtitle: Some(
                candidate
                    .secondary_label
                    .clone()
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| "Contact".to_string()),
            ),
            category: PaletteCategory::Contacts,
            route: format!("/contacts/{}", candidate.id),
            initials: Some(candidate.initials()),
        }
    }

    /// Case-insensitive match on title, subtitle or category name
    fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .subtitle
                .as_deref()
                .is_some_and(|s| s.to_lowercase().contains(needle))
            || self.category.key().contains(needle)
    }
}

/// The built-in navigation, quick-action and tag commands
pub fn static_items() -> Vec<PaletteItem> {
    use PaletteCategory::*;

    vec![
        PaletteItem::fixed("nav-dashboard", "Go to Dashboard", None, Navigation, "/dashboard"),
        PaletteItem::fixed("nav-contacts", "Go to Contacts", None, Navigation, "/contacts"),
        PaletteItem::fixed(
            "nav-interactions",
            "Go to Interactions",
            None,
            Navigation,
            "/interactions",
        ),
        PaletteItem::fixed("nav-reminders", "Go to Reminders", None, Navigation, "/reminders"),
        PaletteItem::fixed(
            "action-add-contact",
            "Add New Contact",
            None,
            Actions,
            "/contacts/new",
        ),
        PaletteItem::fixed(
            "action-log-interaction",
            "Log Interaction",
            None,
            Actions,
            "/interactions/new",
        ),
        PaletteItem::fixed(
            "action-create-reminder",
            "Create Reminder",
            None,
            Actions,
            "/reminders/new",
        ),
        PaletteItem::fixed(
            "tag-friends",
            "View Friends",
            Some("Filter by tag: friends"),
            Tags,
            "/contacts?tag=friends",
        ),
        PaletteItem::fixed(
            "tag-work",
            "View Work Contacts",
            Some("Filter by tag: work"),
            Tags,
            "/contacts?tag=work",
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaletteOutcome {
    Handled,
    /// The item was executed and the palette closed
    Execute(PaletteItem),
    /// Closed without executing
    Closed,
    Ignored,
}

pub struct CommandPalette {
    visible: bool,
    query: String,
    statics: Vec<PaletteItem>,
    /// Latest contact results, kept until the next ones land
    contacts: Vec<PaletteItem>,
    selection: SelectionState<PaletteItem>,
    search: SearchCoordinator,
}

impl CommandPalette {
    pub fn new(search: SearchCoordinator) -> Self {
        Self {
            visible: false,
            query: String::new(),
            statics: static_items(),
            contacts: Vec::new(),
            selection: SelectionState::new(),
            search,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn items(&self) -> &[PaletteItem] {
        self.selection.candidates()
    }

    pub fn selected_index(&self) -> usize {
        self.selection.highlighted_index()
    }

    pub fn selected(&self) -> Option<&PaletteItem> {
        self.selection.highlighted()
    }

    pub fn open(&mut self) {
        tracing::debug!("Command palette opened");
        self.visible = true;
        self.query.clear();
        self.contacts.clear();
        self.rebuild(true);
        self.search.request("");
    }

    /// Hide and forget the query and highlight
    pub fn close(&mut self) {
        self.visible = false;
        self.query.clear();
        self.contacts.clear();
        self.selection.close();
        self.search.cancel();
    }

    pub fn toggle(&mut self) {
        if self.visible {
            self.close();
        } else {
            self.open();
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.query_changed();
    }

    pub fn push_char(&mut self, c: char) {
        self.query.push(c);
        self.query_changed();
    }

    pub fn pop_char(&mut self) {
        if self.query.pop().is_some() {
            self.query_changed();
        }
    }

    fn query_changed(&mut self) {
        self.rebuild(true);
        self.search.request(&self.query);
    }

    /// Contacts first, then the static commands that match the query.
    /// A reset puts the highlight back on the first row; otherwise it is
    /// only clamped.
    fn rebuild(&mut self, reset: bool) {
        let needle = self.query.to_lowercase();
        let mut items = self.contacts.clone();
        items.extend(
            self.statics
                .iter()
                .filter(|item| needle.is_empty() || item.matches(&needle))
                .cloned(),
        );
        items.sort_by_key(|item| item.category);

        if reset {
            self.selection.resolve(items);
        } else {
            self.selection.refresh(items);
        }
    }

    /// Feed contact results. Returns whether they were applied.
    pub fn apply_search_update(&mut self, update: SearchUpdate) -> bool {
        if !self.visible || !self.search.is_current(&update) || update.query != self.query {
            return false;
        }

        self.contacts = update
            .into_candidates()
            .iter()
            .map(PaletteItem::from_contact)
            .collect();
        self.rebuild(false);
        true
    }

    pub fn select_down(&mut self) {
        self.selection.move_down();
    }

    pub fn select_up(&mut self) {
        self.selection.move_up();
    }

    pub fn hover(&mut self, index: usize) {
        self.selection.highlight(index);
    }

    /// Execute the highlighted row and close
    pub fn execute_selected(&mut self) -> Option<PaletteItem> {
        let item = self.selection.confirmable().cloned()?;
        self.execute(item)
    }

    /// Execute a clicked row and close
    pub fn execute_index(&mut self, index: usize) -> Option<PaletteItem> {
        let item = self.selection.candidates().get(index).cloned()?;
        self.execute(item)
    }

    fn execute(&mut self, item: PaletteItem) -> Option<PaletteItem> {
        tracing::info!("Palette: {} -> {}", item.title, item.route);
        self.close();
        Some(item)
    }

    pub fn handle_key(&mut self, key: Key) -> PaletteOutcome {
        if !self.visible {
            return PaletteOutcome::Ignored;
        }

        match key {
            Key::Up => self.select_up(),
            Key::Down => self.select_down(),
            Key::Enter => {
                if let Some(item) = self.execute_selected() {
                    return PaletteOutcome::Execute(item);
                }
            }
            Key::Escape => {
                self.close();
                return PaletteOutcome::Closed;
            }
            Key::Char(c) => self.push_char(c),
            Key::Backspace => self.pop_char(),
            _ => return PaletteOutcome::Ignored,
        }

        PaletteOutcome::Handled
    }
}
