//! Build configuration.
//!
//! ```json
//! {
//!   "source": ["tokens/**/*.json"],
//!   "platforms": {
//!     "css": {
//!       "transformGroup": "custom/group",
//!       "buildPath": "build/{platform}/",
//!       "files": [{ "destination": "variables.css", "format": "custom/css" }]
//!     }
//!   }
//! }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, TokenError};
use crate::format::Format;
use crate::transform::DEFAULT_GROUP;

const PLATFORM_PLACEHOLDER: &str = "{platform}";

fn default_transform_group() -> String {
    DEFAULT_GROUP.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConfig {
    pub destination: String,
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformConfig {
    #[serde(default = "default_transform_group")]
    pub transform_group: String,
    #[serde(default)]
    pub build_path: String,
    pub files: Vec<FileConfig>,
}

impl PlatformConfig {
    /// Destination of `file` for `platform`, relative to the build's base dir.
    pub fn destination(&self, platform: &str, file: &FileConfig) -> PathBuf {
        let build_path = self.build_path.replace(PLATFORM_PLACEHOLDER, platform);
        let destination = file.destination.replace(PLATFORM_PLACEHOLDER, platform);
        Path::new(&build_path).join(destination)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    pub source: Vec<String>,
    /// Where flattened documents are cached. No caching when unset.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    pub platforms: IndexMap<String, PlatformConfig>,
}

impl BuildConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| TokenError::io(path, e))?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let config: BuildConfig =
            serde_json::from_str(contents).map_err(|e| TokenError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.source.is_empty() {
            return Err(TokenError::Config("`source` lists no files".to_string()));
        }
        if self.platforms.is_empty() {
            return Err(TokenError::Config("no platforms configured".to_string()));
        }
        for (name, platform) in &self.platforms {
            if platform.files.is_empty() {
                return Err(TokenError::Config(format!(
                    "platform '{}' has no files",
                    name
                )));
            }
            for file in &platform.files {
                Format::from_name(&file.format)?;
                if file.destination.trim().is_empty() {
                    return Err(TokenError::Config(format!(
                        "platform '{}' has a file without destination",
                        name
                    )));
                }
            }
        }
        Ok(())
    }
}
