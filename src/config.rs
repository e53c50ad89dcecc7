use crate::error::{Result, WorkerError};
use crate::extractor::DEFAULT_TOOL;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub tool: ToolConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Executable name looked up on PATH, or a path to it.
    pub binary: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Used when a request names no output path.
    pub base_directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter applied when RUST_LOG is unset.
    pub level: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_TOOL.to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            base_directory: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(WorkerError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| WorkerError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| WorkerError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["exif-worker.toml", ".exif-worker.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref binary) = cli_args.tool_binary {
            self.tool.binary = binary.clone();
        }

        if let Some(ref level) = cli_args.log_level {
            self.logging.level = level.clone();
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| WorkerError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| WorkerError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.tool.binary.trim().is_empty() {
            return Err(WorkerError::Config {
                message: "The ExifTool binary must not be empty".to_string(),
            });
        }

        if self.logging.level.trim().is_empty() {
            return Err(WorkerError::Config {
                message: "Logging level must not be empty".to_string(),
            });
        }

        if self.output.base_directory.is_file() {
            return Err(WorkerError::Config {
                message: format!(
                    "Output base directory is a file: {}",
                    self.output.base_directory.display()
                ),
            });
        }

        Ok(())
    }

    pub fn create_sample_config() -> String {
        let mut sample_config = Self::default();
        sample_config.output.base_directory = PathBuf::from("./outputs");
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub tool_binary: Option<String>,
    pub log_level: Option<String>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool_binary(mut self, binary: Option<String>) -> Self {
        self.tool_binary = binary;
        self
    }

    pub fn with_log_level(mut self, level: Option<String>) -> Self {
        self.log_level = level;
        self
    }
}
