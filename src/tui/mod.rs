use anyhow::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

mod app;
mod spinner;
mod ui;

pub use app::App;

use crate::assistant::{AssistantBox, KeyOutcome};
use crate::config::Config;
use crate::dispatch::{send_command, CommandDispatcher, DispatchOutcome};
use crate::input::Key;
use crate::overlay::AnchoredOverlay;
use crate::palette::{CommandPalette, PaletteOutcome};
use crate::search::{EntitySearchProvider, SearchCoordinator, SearchUpdates};

pub struct TuiRunner {
    app: App,
    dispatcher: Arc<dyn CommandDispatcher>,
    mention_rx: SearchUpdates,
    palette_rx: SearchUpdates,
}

impl TuiRunner {
    /// Wire the assistant box and palette to `provider` and `dispatcher`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        config: &Config,
        provider: Arc<dyn EntitySearchProvider>,
        dispatcher: Arc<dyn CommandDispatcher>,
        demo: bool,
    ) -> Self {
        let (mention_search, mention_rx) = SearchCoordinator::new(
            Arc::clone(&provider),
            config.mentions.debounce(),
            config.mentions.search_limit,
        );
        let (palette_search, palette_rx) = SearchCoordinator::new(
            provider,
            config.palette.debounce(),
            config.palette.contact_limit,
        );

        let assistant = AssistantBox::new(
            config.mentions.marker,
            mention_search,
            AnchoredOverlay::default(),
        );
        let palette = CommandPalette::new(palette_search);

        Self {
            app: App::new(assistant, palette, demo),
            dispatcher,
            mention_rx,
            palette_rx,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let (tx, mut rx) = mpsc::unbounded_channel();

        let result = self.run_app(&mut terminal, &mut rx, &tx).await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    async fn run_app<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        rx: &mut mpsc::UnboundedReceiver<DispatchOutcome>,
        tx: &mpsc::UnboundedSender<DispatchOutcome>,
    ) -> Result<()> {
        loop {
            terminal.draw(|f| ui::draw(f, &mut self.app))?;

            // Handle events with a timeout
            if event::poll(Duration::from_millis(50))? {
                match event::read()? {
                    Event::Key(key) if key.kind != KeyEventKind::Release => {
                        if !self.handle_key_event(key, tx) {
                            break;
                        }
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }

            // Check for async results
            while let Ok(update) = self.mention_rx.try_recv() {
                self.app.assistant.apply_search_update(update);
            }
            while let Ok(update) = self.palette_rx.try_recv() {
                self.app.palette.apply_search_update(update);
            }
            while let Ok(outcome) = rx.try_recv() {
                self.app.command_finished(outcome);
            }

            self.app.tick();
        }

        Ok(())
    }

    /// Returns false when the user asked to quit
    fn handle_key_event(
        &mut self,
        key: KeyEvent,
        tx: &mpsc::UnboundedSender<DispatchOutcome>,
    ) -> bool {
        // Ctrl+Alt is AltGr, which types characters rather than shortcuts
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL)
            && !key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Char('c') if ctrl => return false,
            KeyCode::Char('k') if ctrl => {
                self.app.palette.toggle();
                return true;
            }
            // Terminals report Ctrl+/ as either '/' or '_' (0x1f)
            KeyCode::Char('/') | KeyCode::Char('_') if ctrl => {
                self.app.toggle_expanded();
                return true;
            }
            _ => {}
        }

        if self.app.palette.is_visible() {
            if let Some(PaletteOutcome::Execute(item)) =
                map_key(key).map(|mapped| self.app.palette.handle_key(mapped))
            {
                self.app.navigate(item);
            }
            return true;
        }

        match key.code {
            KeyCode::Char('l') if ctrl => {
                self.app.clear_history();
                return true;
            }
            KeyCode::Char('r') if ctrl => {
                self.app.restore_last_failed();
                return true;
            }
            KeyCode::PageUp => {
                self.app.scroll_page_up();
                return true;
            }
            KeyCode::PageDown => {
                self.app.scroll_page_down();
                return true;
            }
            _ => {}
        }

        let Some(mapped) = map_key(key) else {
            return true;
        };

        match self.app.assistant.handle_key(mapped) {
            KeyOutcome::Submit(submission) => {
                self.app.command_sent();

                let dispatcher = Arc::clone(&self.dispatcher);
                let tx = tx.clone();
                tokio::spawn(async move {
                    let outcome = send_command(dispatcher.as_ref(), &submission.request).await;
                    let _ = tx.send(outcome);
                });
            }
            KeyOutcome::Ignored => match mapped {
                Key::Up => self.app.scroll_up(),
                Key::Down => self.app.scroll_down(),
                Key::Escape if !self.app.expanded => self.app.toggle_expanded(),
                _ => {}
            },
            KeyOutcome::Handled => {}
        }

        true
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.app.palette.is_visible() {
            let row = app::row_at(self.app.palette_area, mouse.column, mouse.row)
                .and_then(|row| self.app.palette_rows.get(row).copied().flatten());
            let Some(index) = row else {
                return;
            };
            match mouse.kind {
                MouseEventKind::Moved => self.app.palette.hover(index),
                MouseEventKind::Down(_) => {
                    if let Some(item) = self.app.palette.execute_index(index) {
                        self.app.navigate(item);
                    }
                }
                _ => {}
            }
            return;
        }

        let Some(index) = app::row_at(self.app.picker_area, mouse.column, mouse.row) else {
            match mouse.kind {
                MouseEventKind::ScrollUp => self.app.scroll_up(),
                MouseEventKind::ScrollDown => self.app.scroll_down(),
                _ => {}
            }
            return;
        };
        match mouse.kind {
            MouseEventKind::Moved => self.app.assistant.hover(index),
            MouseEventKind::Down(_) => {
                self.app.assistant.confirm_index(index);
            }
            _ => {}
        }
    }
}

/// Translate a terminal key press into the engine's key vocabulary
fn map_key(key: KeyEvent) -> Option<Key> {
    // AltGr arrives as Ctrl+Alt on some terminals ('@' on German layouts)
    let altgr = KeyModifiers::CONTROL | KeyModifiers::ALT;
    if key.modifiers.contains(altgr) {
        return match key.code {
            KeyCode::Char(c) => Some(Key::Char(c)),
            _ => None,
        };
    }
    if key.modifiers.intersects(altgr) {
        return None;
    }

    Some(match key.code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        _ => return None,
    })
}
