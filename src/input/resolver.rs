use crate::error::{Result, WorkerError};
use crate::task::TaskResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A file handed to a task, either directly by the caller or as an output
/// of the previous task in the workflow.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InputFile {
    pub path: PathBuf,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_path: Option<String>,
}

impl InputFile {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(path: P, display_name: S) -> Self {
        Self {
            path: path.into(),
            display_name: display_name.into(),
            uuid: None,
            data_type: None,
            original_path: None,
        }
    }

    /// Builds an input whose display name is the file name of `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let display_name = file_name_of(path);
        Self::new(path, display_name)
    }

    fn with_display_name_fallback(mut self) -> Self {
        if self.display_name.is_empty() {
            self.display_name = file_name_of(&self.path);
        }
        self
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Decides which files a task operates on.
pub trait InputResolver: Send + Sync {
    fn resolve(&self, pipe_result: Option<&str>, fallback: Vec<InputFile>) -> Result<Vec<InputFile>>;
}

/// Reads the `output_files` of a piped result when one is present and falls
/// back to the explicit list otherwise.
#[derive(Debug, Default, Clone, Copy)]
pub struct PipedInputResolver;

impl PipedInputResolver {
    pub fn new() -> Self {
        Self
    }
}

impl InputResolver for PipedInputResolver {
    fn resolve(&self, pipe_result: Option<&str>, fallback: Vec<InputFile>) -> Result<Vec<InputFile>> {
        let encoded = match pipe_result.map(str::trim) {
            Some(encoded) if !encoded.is_empty() => encoded,
            _ => {
                return Ok(fallback
                    .into_iter()
                    .map(InputFile::with_display_name_fallback)
                    .collect())
            }
        };

        let previous = TaskResult::decode(encoded)?;
        let files = previous
            .output_files
            .into_iter()
            .map(|value| {
                serde_json::from_value::<InputFile>(value)
                    .map(InputFile::with_display_name_fallback)
                    .map_err(|e| WorkerError::InvalidPipeResult {
                        message: format!("output file entry is malformed: {}", e),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(count = files.len(), "resolved input files from piped result");
        Ok(files)
    }
}
