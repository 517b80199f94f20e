use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};
use textwrap::wrap;

use super::app::App;
use crate::conversation::Role;
use crate::mention::{segments, Segment};
use crate::palette::PaletteCategory;

const PRIMARY_COLOR: Color = Color::Rgb(94, 129, 244);
const MENTION_COLOR: Color = Color::Rgb(130, 170, 255);
const SUCCESS_COLOR: Color = Color::Rgb(120, 200, 120);
const ERROR_COLOR: Color = Color::Rgb(235, 87, 87);
const TEXT_COLOR: Color = Color::Rgb(220, 220, 230);
const DIM_TEXT: Color = Color::Rgb(130, 130, 150);
const BORDER_COLOR: Color = Color::Rgb(70, 70, 100);
const SELECTED_BG: Color = Color::Rgb(50, 60, 110);

/// Rows of candidates shown before the popup stops growing
const MAX_PICKER_ROWS: usize = 6;

pub fn draw(f: &mut Frame, app: &mut App) {
    let size = f.area();

    let transcript = if app.expanded {
        Constraint::Min(0)
    } else {
        Constraint::Length(0)
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            transcript,
            Constraint::Length(3), // Input
            Constraint::Length(1), // Status
            Constraint::Length(1), // Footer
        ])
        .split(size);

    draw_header(f, app, chunks[0]);
    if app.expanded {
        draw_transcript(f, app, chunks[1]);
    }
    draw_input(f, app, chunks[2]);
    draw_status(f, app, chunks[3]);
    draw_footer(f, chunks[4]);

    app.picker_area = None;
    if app.assistant.selection().is_open() && !app.palette.is_visible() {
        draw_picker(f, app, chunks[2]);
    }

    app.palette_area = None;
    app.palette_rows.clear();
    if app.palette.is_visible() {
        draw_palette(f, app, size);
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(
            " Contact Assistant ",
            Style::default().fg(PRIMARY_COLOR).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {} ", app.location), Style::default().fg(DIM_TEXT)),
    ];
    if app.demo {
        spans.push(Span::styled(
            " DEMO ",
            Style::default().fg(Color::Black).bg(SUCCESS_COLOR),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Message text with recorded mentions picked out
fn highlighted<'a>(text: &'a str, literals: &[&str], base: Style) -> Vec<Span<'a>> {
    segments(text, literals)
        .into_iter()
        .map(|segment| match segment {
            Segment::Plain(s) => Span::styled(s, base),
            Segment::Mention(s) => Span::styled(
                s,
                Style::default().fg(MENTION_COLOR).add_modifier(Modifier::BOLD),
            ),
        })
        .collect()
}

fn draw_transcript(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(Span::styled(" Conversation ", Style::default().fg(TEXT_COLOR)));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let entries = app.assistant.log().entries();
    if entries.is_empty() {
        let hint = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Ask me anything about your contacts.",
                Style::default().fg(TEXT_COLOR),
            )),
            Line::from(Span::styled(
                "Type @ to mention someone, e.g. \"Remind me to call @John tomorrow\"",
                Style::default().fg(DIM_TEXT),
            )),
        ])
        .alignment(Alignment::Center);
        f.render_widget(hint, inner);
        return;
    }

    let max_lines = inner.height as usize;
    let width = (inner.width.saturating_sub(4)).max(1) as usize;
    let mut items = Vec::new();
    let mut line_count = 0;

    for entry in entries.iter().rev().skip(app.scroll_offset) {
        if line_count >= max_lines {
            break;
        }

        let (prefix, style) = match entry.role {
            Role::User => ("You", Style::default().fg(PRIMARY_COLOR)),
            Role::Assistant => ("Assistant", Style::default().fg(SUCCESS_COLOR)),
            Role::Error => ("Error", Style::default().fg(ERROR_COLOR)),
        };
        let literals = entry.mention_literals();
        let time = entry.timestamp.with_timezone(&chrono::Local).format("%H:%M");

        let mut lines = vec![Line::from(vec![
            Span::styled(prefix, style.add_modifier(Modifier::BOLD)),
            Span::styled(format!("  {}", time), Style::default().fg(DIM_TEXT)),
        ])];
        for wrapped in wrap(&entry.content, width) {
            let mut spans = vec![Span::raw("  ")];
            let text = wrapped.into_owned();
            spans.extend(
                highlighted(&text, &literals, Style::default().fg(TEXT_COLOR))
                    .into_iter()
                    .map(|span| Span::styled(span.content.into_owned(), span.style)),
            );
            lines.push(Line::from(spans));
        }
        if !entry.tools_used.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("  ✓ {}", entry.tools_used.join(", ")),
                Style::default().fg(DIM_TEXT).add_modifier(Modifier::ITALIC),
            )));
        }
        lines.push(Line::from(""));

        // Newest last: push in reverse so the final reverse restores order
        for line in lines.into_iter().rev() {
            if line_count >= max_lines {
                break;
            }
            items.push(ListItem::new(line));
            line_count += 1;
        }
    }

    items.reverse();
    f.render_widget(List::new(items), inner);
}

fn draw_input(f: &mut Frame, app: &App, area: Rect) {
    let border_color = if app.palette.is_visible() {
        BORDER_COLOR
    } else {
        PRIMARY_COLOR
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(Span::styled(
            " Ask the assistant (@ to mention) ",
            Style::default().fg(DIM_TEXT),
        ));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let assistant = &app.assistant;
    let literals: Vec<&str> = assistant
        .resolver()
        .active_mentions(assistant.buffer())
        .map(|m| m.literal_text.as_str())
        .collect();

    let mut spans = vec![Span::styled(
        "> ",
        Style::default().fg(PRIMARY_COLOR).add_modifier(Modifier::BOLD),
    )];
    spans.extend(highlighted(
        assistant.buffer(),
        &literals,
        Style::default().fg(TEXT_COLOR),
    ));
    f.render_widget(Paragraph::new(Line::from(spans)), inner);

    if !app.palette.is_visible() {
        let column = (2 + assistant.caret_column()).min(inner.width.saturating_sub(1) as usize);
        f.set_cursor_position((inner.x + column as u16, inner.y));
    }
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let line = if app.is_thinking() {
        Line::from(vec![
            Span::styled(
                format!(" {} ", app.spinner.current()),
                Style::default().fg(PRIMARY_COLOR),
            ),
            Span::styled("Thinking...", Style::default().fg(TEXT_COLOR)),
        ])
    } else {
        Line::from(Span::styled(
            format!(" {}", app.status),
            Style::default().fg(DIM_TEXT),
        ))
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let key = Style::default().fg(PRIMARY_COLOR).add_modifier(Modifier::BOLD);
    let text = Style::default().fg(DIM_TEXT);
    let footer = Line::from(vec![
        Span::styled(" ^C", key),
        Span::styled(" Exit ", text),
        Span::styled("│", Style::default().fg(BORDER_COLOR)),
        Span::styled(" ^K", key),
        Span::styled(" Palette ", text),
        Span::styled("│", Style::default().fg(BORDER_COLOR)),
        Span::styled(" ^/", key),
        Span::styled(" Collapse ", text),
        Span::styled("│", Style::default().fg(BORDER_COLOR)),
        Span::styled(" ^L", key),
        Span::styled(" Clear ", text),
        Span::styled("│", Style::default().fg(BORDER_COLOR)),
        Span::styled(" PgUp/PgDn", key),
        Span::styled(" Scroll", text),
    ]);
    f.render_widget(Paragraph::new(footer), area);
}

/// Candidate popup, anchored above the input line at the marker's column
fn draw_picker(f: &mut Frame, app: &mut App, input_area: Rect) {
    let selection = app.assistant.selection();
    let Some(anchor) = app.assistant.overlay().anchor() else {
        return;
    };

    let candidates = selection.candidates();
    let rows = if candidates.is_empty() {
        1
    } else {
        candidates.len().min(MAX_PICKER_ROWS)
    };
    let height = rows as u16 + 2;
    let width = 44.min(f.area().width);

    // Marker column inside the input box: border + "> "
    let x = (input_area.x + 3 + anchor.column as u16).min(f.area().width.saturating_sub(width));
    let y = input_area.y.saturating_sub(height);
    let area = Rect::new(x, y, width, height.min(input_area.y));
    if area.height < 3 {
        return;
    }

    let title = if selection.is_loading() {
        " Searching... "
    } else {
        " Contacts "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(PRIMARY_COLOR))
        .title(Span::styled(title, Style::default().fg(DIM_TEXT)));
    let inner = block.inner(area);

    f.render_widget(Clear, area);
    f.render_widget(block, area);

    if candidates.is_empty() {
        let text = if selection.is_loading() {
            "Searching..."
        } else {
            "No contacts found"
        };
        f.render_widget(
            Paragraph::new(Span::styled(text, Style::default().fg(DIM_TEXT))),
            inner,
        );
        return;
    }

    let highlighted = selection.highlighted_index();
    let start = (highlighted + 1).saturating_sub(rows);
    let items: Vec<ListItem> = candidates
        .iter()
        .enumerate()
        .skip(start)
        .take(rows)
        .map(|(i, candidate)| {
            let mut spans = vec![
                Span::styled(
                    format!("{:>2} ", candidate.initials()),
                    Style::default().fg(PRIMARY_COLOR).add_modifier(Modifier::BOLD),
                ),
                Span::styled(candidate.label.clone(), Style::default().fg(TEXT_COLOR)),
            ];
            if let Some(secondary) = &candidate.secondary_label {
                spans.push(Span::styled(
                    format!("  {}", secondary),
                    Style::default().fg(DIM_TEXT),
                ));
            }
            let style = if i == highlighted {
                Style::default().bg(SELECTED_BG)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    f.render_widget(List::new(items), inner);
    // Mouse rows map onto the visible window, which starts at `start`
    if start == 0 {
        app.picker_area = Some(inner);
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn draw_palette(f: &mut Frame, app: &mut App, size: Rect) {
    let area = centered_rect(60, 70, size);
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(PRIMARY_COLOR))
        .title(Span::styled(
            " Command Palette ",
            Style::default().fg(TEXT_COLOR).add_modifier(Modifier::BOLD),
        ))
        .title_bottom(Span::styled(
            " ↑↓ navigate · Enter select · Esc close ",
            Style::default().fg(DIM_TEXT),
        ));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Query
            Constraint::Length(1), // Rule
            Constraint::Min(0),    // Items
        ])
        .split(inner);

    let query = app.palette.query();
    let query_line = if query.is_empty() {
        Line::from(vec![
            Span::styled(" ⌕ ", Style::default().fg(DIM_TEXT)),
            Span::styled(
                "Search contacts, tags, or navigate...",
                Style::default().fg(DIM_TEXT),
            ),
        ])
    } else {
        Line::from(vec![
            Span::styled(" ⌕ ", Style::default().fg(DIM_TEXT)),
            Span::styled(query.to_string(), Style::default().fg(TEXT_COLOR)),
        ])
    };
    f.render_widget(Paragraph::new(query_line), chunks[0]);
    let cursor_x = chunks[0].x + 3 + unicode_width::UnicodeWidthStr::width(query) as u16;
    f.set_cursor_position((cursor_x.min(chunks[0].right().saturating_sub(1)), chunks[0].y));
    f.render_widget(
        Paragraph::new(Span::styled(
            "─".repeat(chunks[1].width as usize),
            Style::default().fg(BORDER_COLOR),
        )),
        chunks[1],
    );

    let items = app.palette.items();
    let list_area = chunks[2];
    if items.is_empty() {
        let empty = Paragraph::new(Span::styled(
            format!("No results found for \"{}\"", query),
            Style::default().fg(DIM_TEXT),
        ))
        .alignment(Alignment::Center);
        f.render_widget(empty, list_area);
        return;
    }

    // Flatten into rows: a header whenever the category changes
    let selected = app.palette.selected_index();
    let mut rows: Vec<(Option<usize>, ListItem)> = Vec::new();
    let mut current: Option<PaletteCategory> = None;
    for (i, item) in items.iter().enumerate() {
        if current != Some(item.category) {
            current = Some(item.category);
            rows.push((
                None,
                ListItem::new(Line::from(Span::styled(
                    format!(" {}", item.category.label().to_uppercase()),
                    Style::default().fg(DIM_TEXT).add_modifier(Modifier::BOLD),
                ))),
            ));
        }

        let icon = item
            .initials
            .clone()
            .unwrap_or_else(|| match item.category {
                PaletteCategory::Tags => "#".to_string(),
                _ => "→".to_string(),
            });
        let mut spans = vec![
            Span::styled(format!("  {:>2} ", icon), Style::default().fg(PRIMARY_COLOR)),
            Span::styled(item.title.clone(), Style::default().fg(TEXT_COLOR)),
        ];
        if let Some(subtitle) = &item.subtitle {
            spans.push(Span::styled(
                format!("  {}", subtitle),
                Style::default().fg(DIM_TEXT),
            ));
        }
        let style = if i == selected {
            Style::default().bg(SELECTED_BG).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        rows.push((Some(i), ListItem::new(Line::from(spans)).style(style)));
    }

    // Keep the selected row in view
    let height = list_area.height as usize;
    let selected_row = rows
        .iter()
        .position(|(index, _)| *index == Some(selected))
        .unwrap_or(0);
    let start = (selected_row + 1).saturating_sub(height);

    let (indices, list_items): (Vec<_>, Vec<_>) =
        rows.into_iter().skip(start).take(height).unzip();
    f.render_widget(List::new(list_items), list_area);

    app.palette_area = Some(list_area);
    app.palette_rows = indices;
}
