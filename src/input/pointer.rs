use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::engine::PointerEvent;
use crate::input::Action;
use crate::ui::grid_view::{GridGeometry, GridHit};

/// Maps a terminal mouse event onto the grid. Releases count wherever they
/// happen so a drag never stays stuck.
pub fn handle_mouse(event: MouseEvent, geometry: &GridGeometry) -> Action {
    let hit = geometry.hit_test(event.column, event.row);

    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => match hit {
            Some(GridHit::Cell(cell)) => Action::Pointer(PointerEvent::Press(cell)),
            Some(GridHit::DayHeader(day)) => Action::ToggleDay(day),
            Some(GridHit::HourLabel(hour)) => Action::ToggleHour(hour),
            None => Action::None,
        },
        MouseEventKind::Drag(MouseButton::Left) => match hit {
            Some(GridHit::Cell(cell)) => Action::Pointer(PointerEvent::Move(cell)),
            _ => Action::None,
        },
        MouseEventKind::Up(MouseButton::Left) => Action::Pointer(PointerEvent::Release),
        _ => Action::None,
    }
}

pub fn handle_focus_lost() -> Action {
    Action::Pointer(PointerEvent::Blur)
}
