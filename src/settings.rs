// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.

use dirs_next::config_dir;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::handles::TextureUnit;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RendererSettings {
    /// Appended to `#version` in every compiled shader, e.g. `"330 core"` or `"300 es"`.
    pub glsl_version: String,
    pub primary_unit: u32,
    pub mask_unit: u32,
    pub backdrop_unit: u32,
    pub linear_filtering: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            glsl_version: String::from("330 core"),
            primary_unit: 0,
            mask_unit: 1,
            backdrop_unit: 2,
            linear_filtering: true,
        }
    }
}

impl RendererSettings {
    pub fn primary_unit(&self) -> TextureUnit {
        TextureUnit(self.primary_unit)
    }

    pub fn mask_unit(&self) -> TextureUnit {
        TextureUnit(self.mask_unit)
    }

    pub fn backdrop_unit(&self) -> TextureUnit {
        TextureUnit(self.backdrop_unit)
    }

    /// Units the renderer keeps for its own mask and backdrop textures.
    pub fn reserved_units(&self) -> [TextureUnit; 2] {
        [self.mask_unit(), self.backdrop_unit()]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub renderer: RendererSettings,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization/Deserialization Error: {0}")]
    Serde(#[from] toml::de::Error),

    #[error("Serialization Error: {0}")]
    SerdeSer(#[from] toml::ser::Error),

    #[error("Configuration Directory Not Found")]
    ConfigDirNotFound,
}

impl Settings {
    /// Retrieves the path to the user settings file.
    pub fn user_settings_path() -> Result<PathBuf, SettingsError> {
        let config_dir = config_dir().ok_or(SettingsError::ConfigDirNotFound)?;
        Ok(config_dir.join("layerglow").join("settings.toml"))
    }

    /// Loads settings from a specified file path.
    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Saves settings to a specified file path, ensuring the directory exists.
    pub fn save_to_file(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Loads `path`, falling back to hardcoded defaults when it is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::debug!("Settings file {:?} not found. Using defaults.", path);
            return Settings::default();
        }
        match Settings::load_from_file(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Failed to load settings from {:?}: {}. Using defaults.", path, e);
                Settings::default()
            }
        }
    }

    /// Loads the user settings file, or defaults if there is none.
    pub fn load_user_settings() -> Self {
        match Settings::user_settings_path() {
            Ok(path) => Settings::load_or_default(&path),
            Err(e) => {
                log::warn!("Error locating user settings: {}. Using defaults.", e);
                Settings::default()
            }
        }
    }
}
