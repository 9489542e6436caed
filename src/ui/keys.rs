//! Keyboard dispatch for the shell.
//!
//! Modal layers are checked in order: info modal, menu customizer, search,
//! then the focused pane. Keys that change persisted settings report it in
//! the returned [`KeyOutcome`] so the caller can write the config.

use crate::menu::MenuSelection;
use crate::ui::app::{App, FocusPane, SidebarItem};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    Ignored,
    Handled,
    ThemeChanged,
    SpeedChanged,
    MenuSaved(MenuSelection),
}

pub fn handle_key(app: &mut App, key: KeyEvent) -> KeyOutcome {
    if key.kind == KeyEventKind::Release {
        return KeyOutcome::Ignored;
    }

    // Handle info modal close first
    if app.show_info {
        return match key.code {
            KeyCode::Char('i') | KeyCode::Esc => {
                app.toggle_info();
                KeyOutcome::Handled
            }
            _ => KeyOutcome::Ignored,
        };
    }

    if app.customizer.is_some() {
        return handle_customizer_key(app, key.code);
    }

    if app.search_mode {
        return handle_search_key(app, key.code);
    }

    // Keys shared by both panes
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => {
            app.should_quit = true;
            return KeyOutcome::Handled;
        }
        KeyCode::Char('i') => {
            app.toggle_info();
            return KeyOutcome::Handled;
        }
        KeyCode::Char('t') => {
            app.cycle_theme();
            return KeyOutcome::ThemeChanged;
        }
        KeyCode::Char('c') => {
            app.open_customizer();
            return KeyOutcome::Handled;
        }
        KeyCode::Tab => {
            app.toggle_focus();
            return KeyOutcome::Handled;
        }
        KeyCode::Char(' ') | KeyCode::Char('p') => {
            if app.active.is_none() {
                return KeyOutcome::Ignored;
            }
            app.toggle_playback();
            return KeyOutcome::Handled;
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let before = app.speed();
            app.speed_up();
            return speed_outcome(before, app.speed());
        }
        KeyCode::Char('-') => {
            let before = app.speed();
            app.slow_down();
            return speed_outcome(before, app.speed());
        }
        _ => {}
    }

    match app.focus {
        FocusPane::Sidebar => handle_sidebar_key(app, key.code),
        FocusPane::Panel => handle_panel_key(app, key.code),
    }
}

fn speed_outcome(before: f64, after: f64) -> KeyOutcome {
    if (before - after).abs() < f64::EPSILON {
        KeyOutcome::Handled
    } else {
        KeyOutcome::SpeedChanged
    }
}

fn handle_sidebar_key(app: &mut App, code: KeyCode) -> KeyOutcome {
    match code {
        KeyCode::Down | KeyCode::Char('j') => app.next(),
        KeyCode::Up | KeyCode::Char('k') => app.previous(),
        KeyCode::Char('/') => app.enter_search_mode(),
        KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
            if !app.open_selected() {
                return KeyOutcome::Ignored;
            }
        }
        _ => return KeyOutcome::Ignored,
    }
    KeyOutcome::Handled
}

fn handle_panel_key(app: &mut App, code: KeyCode) -> KeyOutcome {
    match code {
        KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => app.close_panel(),
        KeyCode::Char('r') => app.reset_playback(),
        KeyCode::Char('n') => app.step_playback(),
        KeyCode::Down | KeyCode::Char('j') => app.scroll_log_down(),
        KeyCode::Up | KeyCode::Char('k') => app.scroll_log_up(),
        _ => return KeyOutcome::Ignored,
    }
    KeyOutcome::Handled
}

fn handle_search_key(app: &mut App, code: KeyCode) -> KeyOutcome {
    match code {
        KeyCode::Esc => app.exit_search_mode(),
        KeyCode::Down => app.next(),
        KeyCode::Up => app.previous(),
        KeyCode::Backspace => app.search_pop_char(),
        KeyCode::Enter => {
            let Some(SidebarItem::Module(id)) = app.selected_item() else {
                return KeyOutcome::Ignored;
            };
            app.exit_search_mode();
            app.open_module(&id);
        }
        KeyCode::Char(c) => app.search_push_char(c),
        _ => return KeyOutcome::Ignored,
    }
    KeyOutcome::Handled
}

fn handle_customizer_key(app: &mut App, code: KeyCode) -> KeyOutcome {
    match code {
        KeyCode::Enter => {
            return app
                .save_customizer()
                .map_or(KeyOutcome::Ignored, KeyOutcome::MenuSaved);
        }
        KeyCode::Esc | KeyCode::Char('q') => {
            app.cancel_customizer();
            return KeyOutcome::Handled;
        }
        _ => {}
    }

    let Some(customizer) = app.customizer.as_mut() else {
        return KeyOutcome::Ignored;
    };
    match code {
        KeyCode::Down | KeyCode::Char('j') => customizer.next(),
        KeyCode::Up | KeyCode::Char('k') => customizer.previous(),
        KeyCode::Char(' ') => customizer.toggle_current(),
        KeyCode::Char('m') => customizer.toggle_grab(),
        KeyCode::Char('a') => customizer.select_all(),
        KeyCode::Char('n') => customizer.select_none(),
        KeyCode::Char('r') => customizer.reset_to_default(),
        KeyCode::Char('g') => customizer.toggle_grouping(),
        _ => return KeyOutcome::Ignored,
    }
    KeyOutcome::Handled
}
