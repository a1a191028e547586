use ratatui::style::Color;

use crate::engine::HeatLevel;

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: String,
    pub title: Color,
    pub cursor_bg: Color,
    pub cursor_fg: Color,
    pub selected: Color,
    pub preview_add: Color,
    pub preview_remove: Color,
    /// Cell tint at full occupancy; lower counts fade towards `background`.
    pub heat: (u8, u8, u8),
    pub background: (u8, u8, u8),
    pub day_header: Color,
    pub hour_label: Color,
    pub proposal_marker: Color,
    pub status_bar: Color,
    pub help_title: Color,
    pub help_section: Color,
    pub command_mode: Color,
    pub error: Color,
    pub success: Color,
}

impl Theme {
    pub fn default_theme() -> Self {
        Self {
            name: "default".to_string(),
            title: Color::Cyan,
            cursor_bg: Color::Blue,
            cursor_fg: Color::White,
            selected: Color::Green,
            preview_add: Color::LightGreen,
            preview_remove: Color::LightRed,
            heat: (0, 175, 95),
            background: (0, 0, 0),
            day_header: Color::Yellow,
            hour_label: Color::Gray,
            proposal_marker: Color::Magenta,
            status_bar: Color::White,
            help_title: Color::Cyan,
            help_section: Color::Yellow,
            command_mode: Color::White,
            error: Color::Red,
            success: Color::Green,
        }
    }

    pub fn gruvbox() -> Self {
        Self {
            name: "gruvbox".to_string(),
            title: Color::Rgb(251, 184, 108),
            cursor_bg: Color::Rgb(69, 133, 136),
            cursor_fg: Color::Rgb(235, 219, 178),
            selected: Color::Rgb(184, 187, 38),
            preview_add: Color::Rgb(142, 192, 124),
            preview_remove: Color::Rgb(251, 73, 52),
            heat: (152, 151, 26),
            background: (40, 40, 40),
            day_header: Color::Rgb(254, 128, 25),
            hour_label: Color::Rgb(146, 131, 116),
            proposal_marker: Color::Rgb(211, 134, 155),
            status_bar: Color::Rgb(235, 219, 178),
            help_title: Color::Rgb(251, 184, 108),
            help_section: Color::Rgb(254, 128, 25),
            command_mode: Color::Rgb(235, 219, 178),
            error: Color::Rgb(251, 73, 52),
            success: Color::Rgb(184, 187, 38),
        }
    }

    pub fn nord() -> Self {
        Self {
            name: "nord".to_string(),
            title: Color::Rgb(136, 192, 208),
            cursor_bg: Color::Rgb(94, 129, 172),
            cursor_fg: Color::Rgb(236, 239, 244),
            selected: Color::Rgb(163, 190, 140),
            preview_add: Color::Rgb(143, 188, 187),
            preview_remove: Color::Rgb(191, 97, 106),
            heat: (163, 190, 140),
            background: (46, 52, 64),
            day_header: Color::Rgb(235, 203, 139),
            hour_label: Color::Rgb(76, 86, 106),
            proposal_marker: Color::Rgb(180, 142, 173),
            status_bar: Color::Rgb(216, 222, 233),
            help_title: Color::Rgb(136, 192, 208),
            help_section: Color::Rgb(235, 203, 139),
            command_mode: Color::Rgb(216, 222, 233),
            error: Color::Rgb(191, 97, 106),
            success: Color::Rgb(163, 190, 140),
        }
    }

    pub fn dracula() -> Self {
        Self {
            name: "dracula".to_string(),
            title: Color::Rgb(139, 233, 253),
            cursor_bg: Color::Rgb(98, 114, 164),
            cursor_fg: Color::Rgb(248, 248, 242),
            selected: Color::Rgb(80, 250, 123),
            preview_add: Color::Rgb(139, 233, 253),
            preview_remove: Color::Rgb(255, 85, 85),
            heat: (80, 250, 123),
            background: (40, 42, 54),
            day_header: Color::Rgb(241, 250, 140),
            hour_label: Color::Rgb(98, 114, 164),
            proposal_marker: Color::Rgb(255, 121, 198),
            status_bar: Color::Rgb(248, 248, 242),
            help_title: Color::Rgb(139, 233, 253),
            help_section: Color::Rgb(241, 250, 140),
            command_mode: Color::Rgb(248, 248, 242),
            error: Color::Rgb(255, 85, 85),
            success: Color::Rgb(80, 250, 123),
        }
    }

    pub fn get_by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "gruvbox" => Self::gruvbox(),
            "nord" => Self::nord(),
            "dracula" => Self::dracula(),
            _ => Self::default_theme(),
        }
    }

    pub fn available_themes() -> Vec<&'static str> {
        vec!["default", "gruvbox", "nord", "dracula"]
    }

    /// Background for a cell with the given shading strength in `[0, 1]`.
    pub fn heat_color(&self, intensity: f32) -> Option<Color> {
        if intensity <= 0.0 {
            return None;
        }
        let t = intensity.min(1.0);
        let mix = |from: u8, to: u8| (f32::from(from) + (f32::from(to) - f32::from(from)) * t).round() as u8;
        Some(Color::Rgb(
            mix(self.background.0, self.heat.0),
            mix(self.background.1, self.heat.1),
            mix(self.background.2, self.heat.2),
        ))
    }

    /// Single glyph used where colour is unavailable, e.g. in `--summary`.
    pub fn heat_glyph(level: HeatLevel) -> char {
        match level {
            HeatLevel::None => '·',
            HeatLevel::Few => '░',
            HeatLevel::Half => '▒',
            HeatLevel::Majority => '▓',
            HeatLevel::All => '█',
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}
