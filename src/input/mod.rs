pub mod command_mode;
pub mod normal_mode;
pub mod pointer;

use crate::engine::PointerEvent;

/// What the event loop should do after an input was interpreted.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    Quit,
    ForceQuit,
    Pointer(PointerEvent),
    ToggleDay(usize),
    ToggleHour(usize),
    Save,
    SaveAndQuit,
    Refresh,
    Join,
    Leave,
}
