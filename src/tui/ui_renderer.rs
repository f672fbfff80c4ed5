use super::app_logic::TuiApp;
use super::app_state::{AppMode, ListGeometry};
use crate::panel::StatusLevel;
use crate::projection::{FolderState, Row, RowKind};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, HighlightSpacing, List, ListItem, ListState, Paragraph, Wrap},
};

fn draw_help_block(f: &mut Frame, _app: &TuiApp, area: Rect) {
    let help_text_lines_content = vec![
        Line::from("Arrows/jk: Nav (Shift: range) | Space/Enter: Check | Tab/o: Fold | Esc: Clear"),
        Line::from("Click: select | Ctrl/Cmd+Click: add | Shift+Click: range | /: Filter | s: Selected only | y: Copy | r: Refresh | q: Quit"),
    ];
    let help_paragraph = Paragraph::new(help_text_lines_content).block(
        Block::default()
            .borders(Borders::ALL)
            .title("yankboard"),
    );
    f.render_widget(help_paragraph, area);
}

fn draw_filter_input_block(f: &mut Frame, app: &TuiApp, area: Rect) {
    let input_text = format!("/{}", app.filter_input);
    let filter_paragraph = Paragraph::new(input_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Filter (Esc to clear, Enter to apply)"),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(filter_paragraph, area);
    f.set_cursor_position((area.x + 1 + app.filter_cursor_pos as u16 + 1, area.y + 1));
}

fn row_line(row: &Row) -> Line<'static> {
    let expansion_prefix = match row.kind {
        RowKind::Folder { expanded: true } => "[-] ",
        RowKind::Folder { expanded: false } => "[+] ",
        RowKind::File | RowKind::Snippet => "    ",
    };
    let (selection_prefix, check_style) = match row.check {
        FolderState::All => ("[x] ", Style::default().fg(Color::Green)),
        FolderState::Partial => ("[-] ", Style::default().fg(Color::Yellow)),
        FolderState::None => ("[ ] ", Style::default()),
    };
    let label_style = match row.kind {
        RowKind::Folder { .. } => Style::default().add_modifier(Modifier::BOLD),
        RowKind::Snippet => Style::default().fg(Color::Cyan),
        RowKind::File => Style::default(),
    };
    Line::from(vec![
        Span::raw(expansion_prefix),
        Span::styled(selection_prefix, check_style),
        Span::raw("  ".repeat(row.depth)),
        Span::styled(row.label.clone(), label_style),
        Span::styled(
            format!("  ({} tok)", row.tokens),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

fn draw_main_list_block(f: &mut Frame, app: &mut TuiApp, area: Rect) {
    let store = app.panel.store();
    let list_title = if !store.filter().is_empty() && app.mode == AppMode::Normal {
        format!("Files (Filter: '{}')", store.filter())
    } else if store.show_selected_only() {
        "Files (selected only)".to_string()
    } else {
        "Files and snippets".to_string()
    };
    let block = Block::default().borders(Borders::ALL).title(list_title);
    let inner = block.inner(area);
    app.list_viewport_height = inner.height as usize;

    let projection = app.panel.projection();
    let rows = projection.rows();
    if rows.is_empty() {
        let message = if !app.panel.is_initialized() {
            "Loading…".to_string()
        } else {
            projection
                .empty_state(&rows)
                .map(|state| state.message())
                .unwrap_or_default()
        };
        let paragraph = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(paragraph, area);
        app.geometry = ListGeometry {
            area: inner,
            scroll_offset: 0,
            row_count: 0,
        };
        return;
    }

    let list_items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            let item = ListItem::new(row_line(row));
            if row.highlighted {
                item.style(Style::default().bg(Color::DarkGray))
            } else {
                item
            }
        })
        .collect();

    let list_widget = List::new(list_items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD))
        .highlight_symbol("❯ ")
        .highlight_spacing(HighlightSpacing::Always);

    app.clamp_scroll(rows.len());
    let focused = app
        .focused_position(&rows)
        .filter(|&pos| pos >= app.scroll_offset && pos < app.scroll_offset + app.list_viewport_height);
    let mut list_state_for_view = ListState::default()
        .with_offset(app.scroll_offset)
        .with_selected(focused);
    f.render_stateful_widget(list_widget, area, &mut list_state_for_view);

    app.scroll_offset = list_state_for_view.offset();
    app.geometry = ListGeometry {
        area: inner,
        scroll_offset: app.scroll_offset,
        row_count: rows.len(),
    };
}

fn draw_footer_block(f: &mut Frame, app: &TuiApp, area: Rect) {
    let summary = app.panel.projection().summary();
    let mut spans = vec![Span::raw(format!(
        "Selected: {} files, {} snippets | ≈ {} tokens",
        summary.file_count, summary.snippet_count, summary.total_tokens
    ))];
    if summary.token_limit > 0 {
        spans.push(Span::raw(format!(" / {}", summary.token_limit)));
    }
    if summary.over_limit() {
        spans.push(Span::styled(
            "  ⚠ over token limit",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let status_line = match app.panel.status() {
        Some(status) => {
            let style = match status.level {
                StatusLevel::Info => Style::default().fg(Color::Green),
                StatusLevel::Error => Style::default().fg(Color::Red),
            };
            Line::from(Span::styled(status.text.clone(), style))
        }
        None if app.panel.store().copy_in_progress() => Line::from("Copying…"),
        None => Line::from(""),
    };

    let footer = Paragraph::new(vec![Line::from(spans), status_line])
        .block(Block::default().borders(Borders::ALL).title("Selection"));
    f.render_widget(footer, area);
}

pub(super) fn ui_frame(frame: &mut Frame, app: &mut TuiApp) {
    let help_lines = 2;
    let filter_input_height = if app.mode == AppMode::Filtering { 3 } else { 0 };
    let top_block_container_height = (help_lines + 2) + filter_input_height;
    let footer_height = 4;

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(top_block_container_height),
            Constraint::Min(0),
            Constraint::Length(footer_height),
        ])
        .split(frame.area());

    let top_container_area = main_chunks[0];
    let list_area = main_chunks[1];
    let footer_area = main_chunks[2];

    let top_content_constraints = if app.mode == AppMode::Filtering {
        vec![
            Constraint::Length(help_lines + 2),
            Constraint::Length(filter_input_height),
        ]
    } else {
        vec![Constraint::Length(help_lines + 2)]
    };
    let top_content_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(top_content_constraints)
        .split(top_container_area);

    draw_help_block(frame, app, top_content_chunks[0]);
    if app.mode == AppMode::Filtering {
        draw_filter_input_block(frame, app, top_content_chunks[1]);
    }

    draw_main_list_block(frame, app, list_area);
    draw_footer_block(frame, app, footer_area);
}
