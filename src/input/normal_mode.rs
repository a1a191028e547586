use crossterm::event::KeyCode;

use crate::app::{AppState, Mode};
use crate::engine::PointerEvent;
use crate::input::Action;

/// `days` x `hours` is the size of the loaded grid; `dragging` is whether a
/// keyboard or mouse drag is in progress.
pub fn handle_key(key: KeyCode, state: &mut AppState, days: usize, hours: usize, dragging: bool) -> Action {
    match key {
        KeyCode::Char('h') | KeyCode::Left => move_cursor(state, -1, 0, days, hours, dragging),
        KeyCode::Char('l') | KeyCode::Right => move_cursor(state, 1, 0, days, hours, dragging),
        KeyCode::Char('j') | KeyCode::Down => move_cursor(state, 0, 1, days, hours, dragging),
        KeyCode::Char('k') | KeyCode::Up => move_cursor(state, 0, -1, days, hours, dragging),
        KeyCode::Char('g') => jump(state, None, Some(0), days, hours, dragging),
        KeyCode::Char('G') => jump(state, None, Some(hours.saturating_sub(1)), days, hours, dragging),
        KeyCode::Char('0') => jump(state, Some(0), None, days, hours, dragging),
        KeyCode::Char('$') => jump(state, Some(days.saturating_sub(1)), None, days, hours, dragging),
        KeyCode::Char(' ') => {
            if dragging {
                Action::Pointer(PointerEvent::Release)
            } else {
                Action::Pointer(PointerEvent::Press(state.cursor))
            }
        }
        KeyCode::Enter | KeyCode::Esc if dragging => Action::Pointer(PointerEvent::Release),
        KeyCode::Char('D') => Action::ToggleDay(state.cursor.day),
        KeyCode::Char('H') => Action::ToggleHour(state.cursor.hour),
        KeyCode::Char('w') => Action::Save,
        KeyCode::Char('r') => Action::Refresh,
        KeyCode::Char(':') => enter_command_mode(state),
        KeyCode::Char('?') => show_help(state),
        KeyCode::Char('q') => Action::Quit,
        _ => Action::None,
    }
}

fn move_cursor(
    state: &mut AppState,
    day_delta: isize,
    hour_delta: isize,
    days: usize,
    hours: usize,
    dragging: bool,
) -> Action {
    state.move_cursor(day_delta, hour_delta, days, hours);
    extend_drag(state, dragging)
}

fn jump(
    state: &mut AppState,
    day: Option<usize>,
    hour: Option<usize>,
    days: usize,
    hours: usize,
    dragging: bool,
) -> Action {
    let mut target = state.cursor;
    if let Some(day) = day {
        target.day = day;
    }
    if let Some(hour) = hour {
        target.hour = hour;
    }
    state.set_cursor(target, days, hours);
    extend_drag(state, dragging)
}

fn extend_drag(state: &AppState, dragging: bool) -> Action {
    if dragging {
        Action::Pointer(PointerEvent::Move(state.cursor))
    } else {
        Action::None
    }
}

fn enter_command_mode(state: &mut AppState) -> Action {
    state.mode = Mode::Command;
    state.command_buffer = ":".to_string();
    Action::None
}

fn show_help(state: &mut AppState) -> Action {
    state.show_help = true;
    state.help_scroll = 0;
    Action::None
}
