use super::app_logic::TuiApp;
use super::app_state::AppMode;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use std::time::{Duration, Instant};

pub(super) fn handle_events(app: &mut TuiApp) -> Result<()> {
    if event::poll(Duration::from_millis(50))? {
        let now = Instant::now();
        match event::read()? {
            Event::Key(key_event) if key_event.kind == KeyEventKind::Press => match app.mode {
                AppMode::Normal => app.handle_normal_mode_input(key_event, now),
                AppMode::Filtering => app.handle_filtering_mode_input(key_event, now),
            },
            Event::Mouse(mouse_event) => app.handle_mouse(mouse_event),
            _ => {}
        }
    }
    Ok(())
}
