//! Applet settings persistence in TOML format
//!
//! The shell owns these: window placement, whether the media subsystem runs
//! at all, and the reconciliation cadences that drive the core.

use crate::error::{MinivolError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default reconciliation cadence for volume and playback state
pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 1000;

/// Default suppression window after a local media command
pub const DEFAULT_SUPPRESSION_WINDOW_MS: u64 = 10_000;

/// Persisted applet settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Saved window position; zero means "use the default placement"
    pub window_left: i32,
    pub window_top: i32,

    /// Whether the media control subsystem initializes at all
    pub show_media_controls: bool,

    /// Volume/playback reconciliation interval in milliseconds
    pub sync_interval_ms: u64,

    /// How long reconciliation stays suppressed after a local media command
    pub suppression_window_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log file path (empty = no file logging)
    #[serde(default)]
    pub log_file: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            window_left: 0,
            window_top: 0,
            show_media_controls: true,
            sync_interval_ms: DEFAULT_SYNC_INTERVAL_MS,
            suppression_window_ms: DEFAULT_SUPPRESSION_WINDOW_MS,
            log_level: "info".to_string(),
            log_file: String::new(),
        }
    }
}

impl AppSettings {
    /// Load settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            MinivolError::InvalidConfig(format!(
                "failed to read '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let settings: Self = toml::from_str(&content).map_err(|e| {
            MinivolError::InvalidConfig(format!(
                "failed to parse '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default locations
    ///
    /// Searches, in order: minivol.toml next to the executable, then
    /// the per-user data directory. Falls back to defaults when no file
    /// exists or a file is unreadable.
    pub fn load_default() -> Self {
        for path in Self::search_paths() {
            if !path.exists() {
                continue;
            }
            match Self::load(&path) {
                Ok(settings) => {
                    info!("loaded settings from {:?}", path);
                    return settings;
                }
                Err(e) => warn!("{}", e),
            }
        }
        debug!("no settings file found, using defaults");
        Self::default()
    }

    /// Save settings to the per-user settings path
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::user_settings_path();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&path, content)?;
        info!("saved settings to {:?}", path);
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.sync_interval_ms == 0 {
            return Err(MinivolError::InvalidConfig(
                "sync_interval_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                paths.push(dir.join("minivol.toml"));
            }
        }
        paths.push(Self::user_settings_path());
        paths
    }

    fn user_settings_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("minivol")
            .join("minivol.toml")
    }

    /// Generate a sample configuration file content
    pub fn sample_config() -> String {
        r#"# minivol configuration

# Saved window position (0 = default placement)
window_left = 0
window_top = 0

# Whether the media control subsystem initializes at all
show_media_controls = true

# Volume/playback reconciliation interval in milliseconds (default: 1000)
sync_interval_ms = 1000

# Suppression window after a local media command, in milliseconds
# (default: 10000; session-state propagation can lag this long)
suppression_window_ms = 10000

# Log level: trace, debug, info, warn, error (default: info)
log_level = "info"

# Log file path (empty = no file logging)
log_file = ""
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shell_cadence() {
        let settings = AppSettings::default();
        assert_eq!(settings.sync_interval_ms, 1000);
        assert_eq!(settings.suppression_window_ms, 10_000);
        assert!(settings.show_media_controls);
    }

    #[test]
    fn sample_config_parses_to_defaults() {
        let parsed: AppSettings = toml::from_str(&AppSettings::sample_config()).unwrap();
        assert_eq!(parsed.sync_interval_ms, AppSettings::default().sync_interval_ms);
        assert_eq!(parsed.log_level, "info");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let parsed: AppSettings = toml::from_str("show_media_controls = false").unwrap();
        assert!(!parsed.show_media_controls);
        assert_eq!(parsed.sync_interval_ms, DEFAULT_SYNC_INTERVAL_MS);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let dir = std::env::temp_dir().join("minivol-settings-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.toml");
        std::fs::write(&path, "sync_interval_ms = 0").unwrap();

        assert!(AppSettings::load(&path).is_err());
        let _ = std::fs::remove_file(&path);
    }
}
