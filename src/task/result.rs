use crate::error::{Result, WorkerError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The outcome of a task as handed back to the orchestrator and to the next
/// task in the workflow.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskResult {
    #[serde(default)]
    pub output_files: Vec<Value>,
    #[serde(default)]
    pub workflow_id: Option<String>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub meta: Map<String, Value>,
    #[serde(default)]
    pub file_reports: Vec<Value>,
    #[serde(default)]
    pub task_files: Vec<Value>,
}

impl TaskResult {
    /// base64(JSON) form exchanged between workflow stages.
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        Ok(STANDARD.encode(json))
    }

    pub fn decode(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| WorkerError::InvalidPipeResult {
                message: format!("not valid base64: {}", e),
            })?;

        serde_json::from_slice(&bytes).map_err(|e| WorkerError::InvalidPipeResult {
            message: format!("not a task result: {}", e),
        })
    }
}

/// Packages the artifacts of a finished task.
pub trait ResultBuilder: Send + Sync {
    fn build(
        &self,
        output_files: Vec<Value>,
        workflow_id: Option<&str>,
        command: &str,
        meta: Map<String, Value>,
    ) -> Result<String>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EncodedResultBuilder;

impl EncodedResultBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl ResultBuilder for EncodedResultBuilder {
    fn build(
        &self,
        output_files: Vec<Value>,
        workflow_id: Option<&str>,
        command: &str,
        meta: Map<String, Value>,
    ) -> Result<String> {
        TaskResult {
            output_files,
            workflow_id: workflow_id.map(str::to_string),
            command: Some(command.to_string()),
            meta,
            file_reports: Vec::new(),
            task_files: Vec::new(),
        }
        .encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_output_decodes() {
        let encoded = EncodedResultBuilder::new()
            .build(
                vec![json!({"path": "/out/x.json"})],
                Some("wf-42"),
                "exiftool -json",
                Map::new(),
            )
            .unwrap();

        let result = TaskResult::decode(&encoded).unwrap();
        assert_eq!(result.workflow_id.as_deref(), Some("wf-42"));
        assert_eq!(result.command.as_deref(), Some("exiftool -json"));
        assert_eq!(result.output_files.len(), 1);
        assert!(result.meta.is_empty());
        assert!(result.file_reports.is_empty());
        assert!(result.task_files.is_empty());
    }

    #[test]
    fn test_decode_tolerates_missing_fields() {
        let encoded = STANDARD.encode(r#"{"output_files": []}"#);
        let result = TaskResult::decode(&encoded).unwrap();
        assert!(result.output_files.is_empty());
        assert!(result.command.is_none());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            TaskResult::decode("%%%"),
            Err(WorkerError::InvalidPipeResult { .. })
        ));

        let not_json = STANDARD.encode("plain text");
        assert!(matches!(
            TaskResult::decode(&not_json),
            Err(WorkerError::InvalidPipeResult { .. })
        ));
    }
}
