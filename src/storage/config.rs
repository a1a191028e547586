use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::engine::HourAxis;
use crate::plan::{Participant, ParticipantId, Role, SlotCodec, SlotError, resolve_display_name};

const APP_DIR: &str = "meetgrid";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config: {0}")]
    WriteError(#[from] toml::ser::Error),
    #[error("Invalid grid settings: {0}")]
    InvalidGrid(#[from] SlotError),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    pub storage: StorageConfig,
    #[serde(default)]
    pub grid: GridConfig,
    pub session: SessionConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    pub database: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridConfig {
    pub utc_offset_hours: i32,
    pub narrow_single_day: bool,
    pub default_proposal_hours: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: 0,
            narrow_single_day: false,
            default_proposal_hours: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    pub participant_id: String,
    pub display_name: String,
    /// Group nickname; wins over `display_name` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiConfig {
    pub theme: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { theme: "default".to_string() }
    }
}

impl Config {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.codec()?;
        Ok(config)
    }

    pub fn load_or_create() -> Result<Self, ConfigError> {
        Self::load_or_create_at(&Self::config_path())
    }

    pub fn load_or_create_at(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            tracing::info!("No config at {}, writing defaults", path.display());
            let config = Self::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn config_dir() -> PathBuf {
        dirs::config_dir().unwrap_or_else(|| PathBuf::from(".")).join(APP_DIR)
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    pub fn codec(&self) -> Result<SlotCodec, SlotError> {
        SlotCodec::new(self.grid.utc_offset_hours)
    }

    pub fn hour_axis(&self) -> HourAxis {
        if self.grid.narrow_single_day {
            HourAxis::NarrowSingleDay
        } else {
            HourAxis::Full
        }
    }

    pub fn participant_id(&self) -> ParticipantId {
        ParticipantId::new(self.session.participant_id.clone())
    }

    pub fn participant(&self) -> Participant {
        Participant {
            participant_id: self.participant_id(),
            display_name: resolve_display_name(
                self.session.nickname.as_deref(),
                Some(self.session.display_name.as_str()),
                self.session.email.as_deref(),
            ),
            role: Role::Attendee,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig { database: Self::config_dir().join("meetgrid.db") },
            grid: GridConfig::default(),
            session: SessionConfig {
                participant_id: "me".to_string(),
                display_name: "Me".to_string(),
                nickname: None,
                email: None,
            },
            ui: UiConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_uses_utc_and_full_axis() {
        let config = Config::default();

        assert_eq!(config.grid.utc_offset_hours, 0);
        assert_eq!(config.hour_axis(), HourAxis::Full);
        assert_eq!(config.codec().unwrap(), SlotCodec::utc());
    }

    #[test]
    fn default_proposal_length_is_four_hours() {
        assert_eq!(Config::default().grid.default_proposal_hours, 4);
    }

    #[test]
    fn parse_valid_toml_config() {
        let toml_content = r#"
            [storage]
            database = "/tmp/plans.db"

            [grid]
            utc_offset_hours = -5
            narrow_single_day = true
            default_proposal_hours = 2

            [session]
            participant_id = "u-42"
            display_name = "Lucía"

            [ui]
            theme = "dark"
        "#;

        let config = Config::from_toml(toml_content).unwrap();

        assert_eq!(config.storage.database, PathBuf::from("/tmp/plans.db"));
        assert_eq!(config.hour_axis(), HourAxis::NarrowSingleDay);
        assert_eq!(config.participant_id(), ParticipantId::new("u-42"));
        assert_eq!(config.codec().unwrap().offset().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn missing_optional_sections_fall_back_to_defaults() {
        let toml_content = r#"
            [storage]
            database = "plans.db"

            [session]
            participant_id = "u-1"
            display_name = "Ana"
        "#;

        let config = Config::from_toml(toml_content).unwrap();

        assert_eq!(config.grid, GridConfig::default());
        assert_eq!(config.ui.theme, "default");
    }

    #[test]
    fn nickname_takes_precedence_for_display_name() {
        let toml_content = r#"
            [storage]
            database = "plans.db"

            [session]
            participant_id = "u-1"
            display_name = "  "
            nickname = "Anita"
            email = "ana@example.com"
        "#;

        let config = Config::from_toml(toml_content).unwrap();

        assert_eq!(config.participant().display_name, "Anita");
    }

    #[test]
    fn blank_names_fall_back_to_email() {
        let mut config = Config::default();
        config.session.display_name = String::new();
        config.session.email = Some("ana@example.com".to_string());

        assert_eq!(config.participant().display_name, "ana@example.com");
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        let toml_content = r#"
            [storage]
            database = "plans.db"

            [grid]
            utc_offset_hours = 15
            narrow_single_day = false
            default_proposal_hours = 4

            [session]
            participant_id = "u-1"
            display_name = "Ana"
        "#;

        let result = Config::from_toml(toml_content);

        assert!(matches!(result, Err(ConfigError::InvalidGrid(SlotError::InvalidOffset(15)))));
    }

    #[test]
    fn parse_invalid_toml_returns_error() {
        let result = Config::from_toml("this is not valid toml");

        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn load_or_create_writes_defaults_then_reads_them_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let created = Config::load_or_create_at(&path).unwrap();
        let loaded = Config::load_or_create_at(&path).unwrap();

        assert!(path.exists());
        assert_eq!(created, loaded);
    }
}
