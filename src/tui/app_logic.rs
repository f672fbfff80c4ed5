use super::app_state::{AppMode, Hit, HitRegion, ListGeometry, hit_test};
use crate::controller::Gesture;
use crate::model::ItemRef;
use crate::panel::Panel;
use crate::projection::{Row, RowKind};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use std::time::Instant;

const SCROLL_STEP: usize = 3;

pub struct TuiApp {
    pub(super) panel: Panel,
    /// Keyboard cursor. Independent of the visual selection, which only
    /// gestures change.
    pub(super) focus: Option<ItemRef>,
    pub(super) scroll_offset: usize,
    pub(super) quit: bool,
    pub(super) mode: AppMode,
    pub(super) filter_input: String,
    /// Cursor position in chars, not bytes.
    pub(super) filter_cursor_pos: usize,
    pub(super) list_viewport_height: usize,
    pub(super) geometry: ListGeometry,
}

impl TuiApp {
    pub fn new(panel: Panel) -> Self {
        TuiApp {
            panel,
            focus: None,
            scroll_offset: 0,
            quit: false,
            mode: AppMode::Normal,
            filter_input: String::new(),
            filter_cursor_pos: 0,
            list_viewport_height: 0, // Will be updated by ui_renderer
            geometry: ListGeometry::default(),
        }
    }

    pub(super) fn rows(&self) -> Vec<Row> {
        self.panel.projection().rows()
    }

    pub(super) fn focused_position(&self, rows: &[Row]) -> Option<usize> {
        let focus = self.focus.as_ref()?;
        rows.iter().position(|row| &row.item == focus)
    }

    fn focused_row(&self) -> Option<Row> {
        let rows = self.rows();
        let pos = self.focused_position(&rows)?;
        rows.into_iter().nth(pos)
    }

    /// Arrow navigation is a click on the neighbouring row; with `extend` it is
    /// a shift-click.
    pub(super) fn move_focus(&mut self, delta: i32, extend: bool) {
        let rows = self.rows();
        if rows.is_empty() {
            return;
        }
        let new_pos = match self.focused_position(&rows) {
            Some(pos) => (pos as i32 + delta).rem_euclid(rows.len() as i32) as usize,
            None if delta > 0 => 0,
            None => rows.len() - 1,
        };
        let target = rows[new_pos].item.clone();
        self.focus = Some(target.clone());
        self.panel.gesture(Gesture::RowClick {
            target,
            ctrl: false,
            shift: extend,
        });
        self.ensure_focus_visible();
    }

    pub(super) fn toggle_focused_checkbox(&mut self) {
        if let Some(row) = self.focused_row() {
            self.panel.gesture(Gesture::CheckboxClick {
                checked: row.toggled_value(),
                target: row.item,
            });
        }
    }

    pub(super) fn toggle_focused_expansion(&mut self) {
        if let Some(Row {
            item: ItemRef::Path(path),
            kind: RowKind::Folder { .. },
            ..
        }) = self.focused_row()
        {
            self.panel.gesture(Gesture::ExpandClick { path });
            self.ensure_focus_visible();
        }
    }

    /// Keeps the focused row inside the viewport; a focus that disappeared
    /// from the rows moves to the first row.
    pub(super) fn ensure_focus_visible(&mut self) {
        let rows = self.rows();
        if rows.is_empty() {
            self.focus = None;
            self.scroll_offset = 0;
            return;
        }
        let pos = match self.focused_position(&rows) {
            Some(pos) => pos,
            None => {
                self.focus = Some(rows[0].item.clone());
                0
            }
        };
        let list_height = self.list_viewport_height;
        if list_height == 0 {
            return;
        }
        if pos < self.scroll_offset {
            self.scroll_offset = pos;
        } else if pos >= self.scroll_offset + list_height {
            self.scroll_offset = pos.saturating_sub(list_height - 1);
        }
        self.clamp_scroll(rows.len());
    }

    pub(super) fn clamp_scroll(&mut self, row_count: usize) {
        let list_height = self.list_viewport_height;
        if row_count <= list_height {
            self.scroll_offset = 0;
        } else {
            self.scroll_offset = self.scroll_offset.min(row_count - list_height);
        }
    }

    fn scroll_by(&mut self, delta: isize) {
        let row_count = self.rows().len();
        self.scroll_offset = self.scroll_offset.saturating_add_signed(delta);
        self.clamp_scroll(row_count);
    }

    // --- Event handling sub-methods ---
    pub(super) fn handle_normal_mode_input(&mut self, key_event: KeyEvent, now: Instant) {
        let shift = key_event.modifiers.contains(KeyModifiers::SHIFT);
        match key_event.code {
            KeyCode::Char('/') => {
                self.filter_input = self.panel.store().filter().to_string();
                self.filter_cursor_pos = self.filter_input.chars().count();
                self.mode = AppMode::Filtering;
            }
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Esc => {
                self.panel.gesture(Gesture::BackgroundClick);
            }
            KeyCode::Down | KeyCode::Char('j') => self.move_focus(1, shift),
            KeyCode::Up | KeyCode::Char('k') => self.move_focus(-1, shift),
            KeyCode::Char('J') => self.move_focus(1, true),
            KeyCode::Char('K') => self.move_focus(-1, true),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_focused_checkbox(),
            KeyCode::Char('o') | KeyCode::Tab => self.toggle_focused_expansion(),
            KeyCode::Char('s') => {
                self.panel.toggle_show_selected_only();
                self.ensure_focus_visible();
            }
            KeyCode::Char('y') => {
                if let Err(e) = self.panel.request_copy(now) {
                    tracing::debug!(reason = %e, "copy not sent");
                }
            }
            KeyCode::Char('r') => self.panel.refresh(),
            _ => {}
        }
    }

    pub(super) fn handle_filtering_mode_input(&mut self, key_event: KeyEvent, now: Instant) {
        match key_event.code {
            KeyCode::Enter => {
                self.mode = AppMode::Normal;
                let text = self.filter_input.clone();
                self.panel.apply_filter_now(&text);
                self.ensure_focus_visible();
            }
            KeyCode::Esc => {
                self.mode = AppMode::Normal;
                self.filter_input.clear();
                self.filter_cursor_pos = 0;
                self.panel.apply_filter_now("");
                self.ensure_focus_visible();
            }
            KeyCode::Char(c) => {
                let at = self.byte_offset(self.filter_cursor_pos);
                self.filter_input.insert(at, c);
                self.filter_cursor_pos += 1;
                self.panel.schedule_filter(self.filter_input.clone(), now);
            }
            KeyCode::Backspace => {
                if self.filter_cursor_pos > 0 {
                    self.filter_cursor_pos -= 1;
                    let at = self.byte_offset(self.filter_cursor_pos);
                    self.filter_input.remove(at);
                    self.panel.schedule_filter(self.filter_input.clone(), now);
                }
            }
            KeyCode::Left => {
                self.filter_cursor_pos = self.filter_cursor_pos.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.filter_cursor_pos < self.filter_input.chars().count() {
                    self.filter_cursor_pos += 1;
                }
            }
            _ => {}
        }
    }

    fn byte_offset(&self, char_pos: usize) -> usize {
        self.filter_input
            .char_indices()
            .nth(char_pos)
            .map_or(self.filter_input.len(), |(i, _)| i)
    }

    /// Mouse input is ignored while the filter prompt is open.
    pub(super) fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.mode == AppMode::Filtering {
            return;
        }
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {}
            MouseEventKind::ScrollDown => return self.scroll_by(SCROLL_STEP as isize),
            MouseEventKind::ScrollUp => return self.scroll_by(-(SCROLL_STEP as isize)),
            _ => return,
        }
        let rows = self.rows();
        let (index, region) = match hit_test(&self.geometry, mouse.column, mouse.row) {
            Hit::Row { index, region } => (index, region),
            Hit::Background => {
                self.panel.gesture(Gesture::BackgroundClick);
                return;
            }
            Hit::Outside => return,
        };
        let Some(row) = rows.get(index) else {
            return;
        };
        self.focus = Some(row.item.clone());
        let gesture = match (region, row.kind, &row.item) {
            (HitRegion::Checkbox, _, _) => Gesture::CheckboxClick {
                target: row.item.clone(),
                checked: row.toggled_value(),
            },
            (HitRegion::Expand, RowKind::Folder { .. }, ItemRef::Path(path)) => {
                Gesture::ExpandClick { path: path.clone() }
            }
            _ => Gesture::RowClick {
                target: row.item.clone(),
                ctrl: mouse
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER),
                shift: mouse.modifiers.contains(KeyModifiers::SHIFT),
            },
        };
        self.panel.gesture(gesture);
    }
}
