use crate::FDeltaError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "fdelta.toml";

pub const DEFAULT_CHUNK_SIZE: usize = 8192;

/// Line diff algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffAlgorithm {
    #[default]
    Myers,
    Patience,
    Lcs,
}

/// Whether line terminators take part in line equality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEndingPolicy {
    /// `"a\n"`, `"a\r\n"` and a final `"a"` all compare equal
    #[default]
    Lenient,
    /// The terminator is part of the comparison key
    Strict,
}

/// Comparison settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Read buffer size for byte comparison
    pub chunk_size: usize,
    pub algorithm: DiffAlgorithm,
    pub line_endings: LineEndingPolicy,
    /// Charset label used when none is given on the command line
    pub default_encoding: String,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            algorithm: DiffAlgorithm::Myers,
            line_endings: LineEndingPolicy::Lenient,
            default_encoding: "utf-8".to_string(),
        }
    }
}

impl CompareConfig {
    pub fn validate(&self) -> Result<(), FDeltaError> {
        if self.chunk_size == 0 {
            return Err(FDeltaError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.default_encoding.trim().is_empty() {
            return Err(FDeltaError::Config(
                "default_encoding must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub compare: CompareConfig,

    /// Tracing filter directive used when `RUST_LOG` is unset
    #[serde(default)]
    pub log_filter: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub path: PathBuf,
    pub exists: bool,
}

/// Load configuration from `path`, or from the per-user config directory.
///
/// An explicit path must exist; a missing default file yields defaults.
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig, FDeltaError> {
    let (path, explicit) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (default_config_path()?, false),
    };
    let exists = path.is_file();

    if explicit && !exists {
        return Err(FDeltaError::Config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    let config = if exists {
        let data = fs::read_to_string(&path)
            .map_err(|e| FDeltaError::unreadable(format!("read {}", path.display()), e))?;
        let config: AppConfig =
            toml::from_str(&data).map_err(|e| FDeltaError::Serialization(e.to_string()))?;
        config.compare.validate()?;
        config
    } else {
        AppConfig::default()
    };

    Ok(LoadedConfig {
        config,
        path,
        exists,
    })
}

pub fn save_config(path: &Path, config: &AppConfig) -> Result<(), FDeltaError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let data = toml::to_string_pretty(config)
        .map_err(|e| FDeltaError::Serialization(e.to_string()))?;
    fs::write(path, data)?;
    Ok(())
}

pub fn default_config_path() -> Result<PathBuf, FDeltaError> {
    let dirs = ProjectDirs::from("", "aecs4u", "fdelta")
        .ok_or_else(|| FDeltaError::Config("Unable to determine config directory".to_string()))?;
    Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
}
