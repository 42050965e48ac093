use std::path::{Path, PathBuf};

use libportcopy::DialogSettings;
use libportcopy::portal::DEFAULT_TITLE;
use serde::Deserialize;
use tracing::warn;

/// Main configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    /// Dialog title
    #[serde(default = "default_title")]
    pub title: String,

    /// Folder the dialog starts in when none is given on the command line
    #[serde(default)]
    pub default_folder: Option<String>,

    /// Label of the dialog's accept button
    #[serde(default)]
    pub accept_label: Option<String>,

    /// Ask the portal for a modal dialog
    #[serde(default)]
    pub modal: Option<bool>,
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: default_title(),
            default_folder: None,
            accept_label: None,
            modal: None,
        }
    }
}

impl Config {
    /// Load config from default location (~/.config/portcopy/config.toml)
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load config from `path`, falling back to defaults if it is missing or invalid
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        toml::from_str(&content).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "Ignoring invalid config");
            Self::default()
        })
    }

    /// Get config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("portcopy/config.toml"))
    }

    /// Dialog settings for the portal request
    pub fn dialog(&self) -> DialogSettings {
        DialogSettings {
            title: self.title.clone(),
            accept_label: self.accept_label.clone(),
            modal: self.modal,
        }
    }
}
