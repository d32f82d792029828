use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::AuraError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";

/// Environment variables checked for the API credential, in order
pub const API_KEY_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

/// Optional on-disk overrides (`<config_dir>/aura/config.json`)
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub chat_model: Option<String>,
    pub image_model: Option<String>,
}

impl FileConfig {
    pub fn load() -> Result<Self, AuraError> {
        match Self::get_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, AuraError> {
        if !path.exists() {
            debug!(?path, "FileConfig::load_from: no config file");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| AuraError::Configuration(format!("Could not read {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| AuraError::Configuration(format!("Invalid config file {}: {}", path.display(), e)))
    }

    fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("aura").join("config.json"))
    }
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub image_model: String,
}

impl Config {
    /// Load the config file and the credential from the process environment.
    ///
    /// A missing credential is fatal: the caller should refuse to start.
    pub fn load() -> Result<Self, AuraError> {
        let file = FileConfig::load()?;
        let api_key = first_api_key(|var| std::env::var(var).ok());
        Self::resolve(file, api_key)
    }

    pub fn resolve(file: FileConfig, api_key: Option<String>) -> Result<Self, AuraError> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AuraError::Configuration("API_KEY environment variable not set".to_string()))?;

        Ok(Self {
            api_key,
            base_url: file.base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            chat_model: file.chat_model.unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            image_model: file.image_model.unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
        })
    }
}

/// First credential variable holding a non-blank value
fn first_api_key(lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    API_KEY_VARS
        .iter()
        .find_map(|var| lookup(var).filter(|key| !key.trim().is_empty()))
}
