use crate::engine::GridCell;
use crate::ui::theme::Theme;

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Normal,
    Command,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveStatus {
    Saved,
    Unsaved,
    Saving,
    Error(String),
}

impl SaveStatus {
    pub fn label(&self) -> String {
        match self {
            SaveStatus::Saved => "Saved".to_string(),
            SaveStatus::Unsaved => "Unsaved changes".to_string(),
            SaveStatus::Saving => "Saving...".to_string(),
            SaveStatus::Error(message) => format!("Error: {}", message),
        }
    }
}

pub struct AppState {
    pub mode: Mode,
    pub cursor: GridCell,
    /// First hour row currently scrolled into view.
    pub hour_offset: usize,
    pub save_status: SaveStatus,
    pub command_buffer: String,
    pub message: Option<String>,
    pub show_help: bool,
    pub help_scroll: usize,
    pub theme: Theme,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            mode: Mode::Normal,
            cursor: GridCell::new(0, 0),
            hour_offset: 0,
            save_status: SaveStatus::Saved,
            command_buffer: String::new(),
            message: None,
            show_help: false,
            help_scroll: 0,
            theme: Theme::default(),
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Moves the cursor, clamped to a `days` x `hours` grid.
    pub fn move_cursor(&mut self, day_delta: isize, hour_delta: isize, days: usize, hours: usize) {
        if days == 0 || hours == 0 {
            return;
        }
        self.cursor.day = self.cursor.day.saturating_add_signed(day_delta).min(days - 1);
        self.cursor.hour = self.cursor.hour.saturating_add_signed(hour_delta).min(hours - 1);
    }

    pub fn set_cursor(&mut self, cell: GridCell, days: usize, hours: usize) {
        if cell.day < days && cell.hour < hours {
            self.cursor = cell;
        }
    }

    /// Keeps the cursor row inside a window of `visible` hour rows.
    pub fn scroll_to_cursor(&mut self, visible: usize) {
        if visible == 0 {
            return;
        }
        if self.cursor.hour < self.hour_offset {
            self.hour_offset = self.cursor.hour;
        } else if self.cursor.hour >= self.hour_offset + visible {
            self.hour_offset = self.cursor.hour + 1 - visible;
        }
    }

    pub fn clamp_to(&mut self, days: usize, hours: usize) {
        if days == 0 || hours == 0 {
            self.cursor = GridCell::new(0, 0);
            self.hour_offset = 0;
            return;
        }
        self.cursor.day = self.cursor.day.min(days - 1);
        self.cursor.hour = self.cursor.hour.min(hours - 1);
        self.hour_offset = self.hour_offset.min(hours - 1);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
