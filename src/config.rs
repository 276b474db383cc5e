use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

pub const SOCKET_NAME: &str = "panelfade.sock";
pub const SETTINGS_FILE: &str = "panelfade/settings.json";
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);
pub const REPLY_TIMEOUT: Duration = Duration::from_secs(2);
pub const MAX_REQUEST_BYTES: u64 = 4096;

pub const DEFAULT_TRANSITION_SPEED_MS: u64 = 1000;
pub const DEFAULT_TRANSITION_TYPE: i32 = 1;
pub const DEFAULT_MAXIMIZED_OPACITY: u8 = 255;
pub const DEFAULT_UNMAXIMIZED_OPACITY: u8 = 0;

/// Read-only view of the user's transition preferences.
pub trait SettingsProvider {
    /// Transition length in milliseconds.
    fn transition_speed(&self) -> u64;
    /// Persisted curve index, see [`crate::curve::TransitionCurve::index`].
    fn transition_type(&self) -> i32;
    fn force_animation(&self) -> bool;
    fn hide_corners(&self) -> bool;
    fn remove_panel_styling(&self) -> bool;
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    pub transition_speed: u64,
    pub transition_type: i32,
    pub force_animation: bool,
    pub hide_corners: bool,
    pub remove_panel_styling: bool,
    pub maximized_opacity: u8,
    pub unmaximized_opacity: u8,
    /// Desktop-wide animation switch; ignored when `force_animation` is set.
    pub enable_animations: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            transition_speed: DEFAULT_TRANSITION_SPEED_MS,
            transition_type: DEFAULT_TRANSITION_TYPE,
            force_animation: false,
            hide_corners: false,
            remove_panel_styling: false,
            maximized_opacity: DEFAULT_MAXIMIZED_OPACITY,
            unmaximized_opacity: DEFAULT_UNMAXIMIZED_OPACITY,
            enable_animations: true,
        }
    }
}

impl SettingsProvider for Settings {
    fn transition_speed(&self) -> u64 {
        self.transition_speed
    }

    fn transition_type(&self) -> i32 {
        self.transition_type
    }

    fn force_animation(&self) -> bool {
        self.force_animation
    }

    fn hide_corners(&self) -> bool {
        self.hide_corners
    }

    fn remove_panel_styling(&self) -> bool {
        self.remove_panel_styling
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("read settings {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse settings {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Settings {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Missing file means defaults; a file that exists but is broken is an error.
    pub fn load_or_default(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }
}

pub fn default_settings_path() -> PathBuf {
    let config_dir = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .unwrap_or_else(|| PathBuf::from("/tmp"));
    config_dir.join(SETTINGS_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        assert_eq!(Settings::from_json("{}").unwrap(), Settings::default());
    }

    #[test]
    fn kebab_case_keys_override_defaults() {
        let settings = Settings::from_json(
            r#"{"transition-speed": 250, "transition-type": 15, "hide-corners": true,
                "unmaximized-opacity": 128, "force-animation": true}"#,
        )
        .unwrap();
        assert_eq!(settings.transition_speed(), 250);
        assert_eq!(settings.transition_type(), 15);
        assert!(settings.hide_corners());
        assert!(settings.force_animation());
        assert!(!settings.remove_panel_styling());
        assert_eq!(settings.unmaximized_opacity, 128);
        assert_eq!(settings.maximized_opacity, DEFAULT_MAXIMIZED_OPACITY);
    }

    #[test]
    fn out_of_range_opacity_is_rejected() {
        assert!(Settings::from_json(r#"{"maximized-opacity": 300}"#).is_err());
    }

    #[test]
    fn missing_file_loads_defaults() {
        let path = std::env::temp_dir().join("panelfade-test-missing/settings.json");
        assert_eq!(Settings::load_or_default(&path).unwrap(), Settings::default());
    }

    #[test]
    fn broken_file_reports_parse_error() {
        let path = std::env::temp_dir().join(format!("panelfade-broken-{}.json", std::process::id()));
        fs::write(&path, "{ not json").unwrap();
        let err = Settings::load_or_default(&path).unwrap_err();
        let _ = fs::remove_file(&path);
        assert!(matches!(err, SettingsError::Parse { .. }));
    }
}
