//! Keyboard input dispatch: overlays first, then dashboard keys.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{AppState, Overlay};

/// Handle a key event. Sets `app.running = false` to quit.
pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.running = false;
        return;
    }

    match app.overlay {
        Overlay::ErrorHistory => {
            handle_error_overlay(app, key);
            return;
        }
        Overlay::Search => {
            handle_search_overlay(app, key);
            return;
        }
        Overlay::None => {}
    }

    match key.code {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char('/') => app.overlay = Overlay::Search,
        KeyCode::Char('f') => app.cycle_category(),
        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('r') => app.toggle_sort_direction(),
        KeyCode::Char('R') => app.request_refresh(),
        KeyCode::Char('c') => app.clear_filters(),
        KeyCode::Char('x') => app.export_view(),
        KeyCode::Char('e') => {
            app.error_scroll = 0;
            app.overlay = Overlay::ErrorHistory;
        }
        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('g') | KeyCode::Home => app.scroll = 0,
        KeyCode::Char('G') | KeyCode::End => app.scroll_to_bottom(),
        _ => {}
    }
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            let max = app.error_history.len().saturating_sub(1);
            app.error_scroll = (app.error_scroll + 1).min(max);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

/// The search box edits the live filter; Esc discards the text.
fn handle_search_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.criteria.search.clear();
            app.scroll = 0;
            app.overlay = Overlay::None;
        }
        KeyCode::Enter => app.overlay = Overlay::None,
        KeyCode::Backspace => app.pop_search_char(),
        KeyCode::Char(c) => app.push_search_char(c),
        _ => {}
    }
}
