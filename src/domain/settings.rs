use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            console_logging_enabled: default_true(),
            file_logging_enabled: default_false(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "controller_bridge".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Raw packets retained for diagnostics; 0 keeps only the most recent.
    #[serde(default = "default_history_depth")]
    pub packet_history_depth: usize,
    /// Hold-to-calibrate delay in milliseconds.
    #[serde(default = "default_calibration_hold_ms")]
    pub calibration_hold_ms: u64,
    /// Window for the measured device packet rate, seconds.
    #[serde(default = "default_rate_window_secs")]
    pub rate_window_secs: u64,
    /// Byte separator used when formatting packet history dumps.
    #[serde(default = "default_history_separator")]
    pub history_separator: String,

    // Advanced BLE settings
    #[serde(default = "default_service_uuid")]
    pub ble_service_uuid: String,
    #[serde(default = "default_data_uuid")]
    pub ble_data_char_uuid: String,

    #[serde(default)]
    pub log_settings: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            packet_history_depth: default_history_depth(),
            calibration_hold_ms: default_calibration_hold_ms(),
            rate_window_secs: default_rate_window_secs(),
            history_separator: default_history_separator(),
            ble_service_uuid: default_service_uuid(),
            ble_data_char_uuid: default_data_uuid(),
            log_settings: LogSettings::default(),
        }
    }
}

fn default_history_depth() -> usize {
    16
}
fn default_calibration_hold_ms() -> u64 {
    2000
}
fn default_rate_window_secs() -> u64 {
    10
}
fn default_history_separator() -> String {
    " ".to_string()
}
fn default_service_uuid() -> String {
    "4f63756c-7573-2054-6872-65656d6f7465".to_string()
}
fn default_data_uuid() -> String {
    "c8c51726-81bc-483b-a052-f7a14ea3d281".to_string()
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        let settings = Self::load_from_file(&settings_path).unwrap_or_default();

        Ok(Self {
            settings,
            settings_path,
        })
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("ControllerBridge");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &PathBuf) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
}
