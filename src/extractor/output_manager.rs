use crate::error::{Result, WorkerError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// An artifact produced by a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFile {
    pub uuid: String,
    pub filename: String,
    pub display_name: String,
    pub extension: String,
    pub data_type: String,
    pub path: PathBuf,
    pub original_path: Option<String>,
    /// Identifier of the input this artifact was derived from.
    pub source_file_id: Option<String>,
}

impl OutputFile {
    /// Opens the artifact for writing, truncating anything already there.
    pub fn create(&self) -> Result<File> {
        File::create(&self.path).map_err(WorkerError::Io)
    }

    /// Links the artifact to the input it was produced from.
    pub fn with_source(
        mut self,
        source_file_id: Option<String>,
        original_path: Option<String>,
    ) -> Self {
        self.source_file_id = source_file_id;
        self.original_path = original_path;
        self
    }

    /// The form recorded in a task result.
    pub fn to_serializable(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Hands out fresh artifact locations.
pub trait OutputAllocator: Send + Sync {
    fn allocate(
        &self,
        output_dir: &Path,
        display_name: &str,
        extension: &str,
        data_type: &str,
    ) -> Result<OutputFile>;
}

/// Names each artifact `<uuid><extension>` inside the output directory and
/// labels it `<display name><extension>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsOutputAllocator;

impl FsOutputAllocator {
    pub fn new() -> Self {
        Self
    }

    fn ensure_directory(&self, output_dir: &Path) -> Result<()> {
        if output_dir.is_dir() {
            return Ok(());
        }

        if output_dir.exists() {
            return Err(WorkerError::Config {
                message: format!("Output path is not a directory: {}", output_dir.display()),
            });
        }

        fs::create_dir_all(output_dir).map_err(|e| WorkerError::Config {
            message: format!(
                "Cannot create output directory {}: {}",
                output_dir.display(),
                e
            ),
        })
    }
}

impl OutputAllocator for FsOutputAllocator {
    fn allocate(
        &self,
        output_dir: &Path,
        display_name: &str,
        extension: &str,
        data_type: &str,
    ) -> Result<OutputFile> {
        self.ensure_directory(output_dir)?;

        let uuid = uuid::Uuid::new_v4().simple().to_string();
        let extension = normalize_extension(extension);
        let filename = format!("{}{}", uuid, extension);
        let display_name = if display_name.trim().is_empty() {
            filename.clone()
        } else {
            format!("{}{}", display_name, extension)
        };

        Ok(OutputFile {
            path: output_dir.join(&filename),
            uuid,
            filename,
            display_name,
            extension,
            data_type: data_type.to_string(),
            original_path: None,
            source_file_id: None,
        })
    }
}

fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(".{}", trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_allocate_names_file_by_uuid() {
        let temp_dir = TempDir::new().unwrap();
        let output = FsOutputAllocator::new()
            .allocate(temp_dir.path(), "photo.jpg", ".json", "application/json")
            .unwrap();

        assert_eq!(output.uuid.len(), 32);
        assert_eq!(output.filename, format!("{}.json", output.uuid));
        assert_eq!(output.path, temp_dir.path().join(&output.filename));
        assert_eq!(output.display_name, "photo.jpg.json");
        assert_eq!(output.extension, ".json");
        assert_eq!(output.data_type, "application/json");
        assert_eq!(output.original_path, None);
        assert_eq!(output.source_file_id, None);
        assert!(!output.path.exists());
    }

    #[test]
    fn test_allocations_are_distinct() {
        let temp_dir = TempDir::new().unwrap();
        let allocator = FsOutputAllocator::new();
        let first = allocator.allocate(temp_dir.path(), "a", ".txt", "text/plain").unwrap();
        let second = allocator.allocate(temp_dir.path(), "a", ".txt", "text/plain").unwrap();
        assert_ne!(first.path, second.path);
    }

    #[test]
    fn test_missing_directory_is_created() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("outputs").join("wf-1");

        let output = FsOutputAllocator::new()
            .allocate(&nested, "a.jpg", "txt", "text/plain")
            .unwrap();

        assert!(nested.is_dir());
        assert_eq!(output.extension, ".txt");
        assert_eq!(output.display_name, "a.jpg.txt");
    }

    #[test]
    fn test_file_as_output_directory_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("not_a_dir");
        fs::write(&file_path, "x").unwrap();

        let result = FsOutputAllocator::new().allocate(&file_path, "a", ".txt", "text/plain");
        assert!(matches!(result, Err(WorkerError::Config { .. })));
    }

    #[test]
    fn test_create_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let output = FsOutputAllocator::new()
            .allocate(temp_dir.path(), "a", ".txt", "text/plain")
            .unwrap();

        fs::write(&output.path, "old content that is longer").unwrap();
        let mut file = output.create().unwrap();
        file.write_all(b"new").unwrap();
        drop(file);

        assert_eq!(fs::read_to_string(&output.path).unwrap(), "new");
    }

    #[test]
    fn test_serializable_form() {
        let temp_dir = TempDir::new().unwrap();
        let output = FsOutputAllocator::new()
            .allocate(temp_dir.path(), "", ".txt", "text/plain")
            .unwrap();

        let value = output.to_serializable().unwrap();
        assert_eq!(value["display_name"], output.filename.as_str());
        assert_eq!(value["data_type"], "text/plain");
        assert_eq!(value["path"], output.path.to_string_lossy().as_ref());
        assert!(value["original_path"].is_null());
        assert!(value["source_file_id"].is_null());
    }

    #[test]
    fn test_serialized_record_carries_source_link() {
        let temp_dir = TempDir::new().unwrap();
        let output = FsOutputAllocator::new()
            .allocate(temp_dir.path(), "photo.jpg", ".json", "application/json")
            .unwrap()
            .with_source(Some("src-uuid".to_string()), Some("/evidence/photo.jpg".to_string()));

        let value = output.to_serializable().unwrap();
        assert_eq!(value["display_name"], "photo.jpg.json");
        assert_eq!(value["extension"], ".json");
        assert_eq!(value["source_file_id"], "src-uuid");
        assert_eq!(value["original_path"], "/evidence/photo.jpg");
    }

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension(".json"), ".json");
        assert_eq!(normalize_extension("json"), ".json");
        assert_eq!(normalize_extension(""), "");
    }
}
