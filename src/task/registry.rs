use crate::error::{Result, WorkerError};
use crate::extractor::ExtractionProgress;
use crate::input::InputFile;
use crate::task::TaskMetadata;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// The five arguments every task receives from the scheduler.
#[derive(Debug, Clone, Default)]
pub struct TaskRequest {
    pub pipe_result: Option<String>,
    pub input_files: Vec<InputFile>,
    pub output_path: PathBuf,
    pub workflow_id: Option<String>,
    pub task_config: Option<Value>,
}

/// Observer notified as a task works through its input files.
pub type ProgressCallback<'a> = Option<&'a dyn Fn(&ExtractionProgress)>;

pub type TaskHandler =
    Box<dyn Fn(&TaskRequest, ProgressCallback<'_>) -> Result<String> + Send + Sync>;

struct RegisteredTask {
    metadata: TaskMetadata,
    handler: TaskHandler,
}

/// Tasks known to this worker, registered explicitly at startup.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, RegisteredTask>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, metadata: TaskMetadata, handler: F) -> Result<()>
    where
        F: Fn(&TaskRequest, ProgressCallback<'_>) -> Result<String> + Send + Sync + 'static,
    {
        if self.tasks.contains_key(name) {
            return Err(WorkerError::Config {
                message: format!("Task '{}' is already registered", name),
            });
        }

        tracing::debug!(task = name, "registered task");
        self.tasks.insert(
            name.to_string(),
            RegisteredTask {
                metadata,
                handler: Box::new(handler),
            },
        );
        Ok(())
    }

    pub fn dispatch(&self, name: &str, request: &TaskRequest) -> Result<String> {
        self.dispatch_with_progress(name, request, None)
    }

    pub fn dispatch_with_progress(
        &self,
        name: &str,
        request: &TaskRequest,
        progress: ProgressCallback<'_>,
    ) -> Result<String> {
        let task = self.tasks.get(name).ok_or_else(|| WorkerError::UnknownTask {
            name: name.to_string(),
        })?;
        (task.handler)(request, progress)
    }

    pub fn metadata(&self, name: &str) -> Option<&TaskMetadata> {
        self.tasks.get(name).map(|task| &task.metadata)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Registered names with their metadata, sorted by name.
    pub fn list(&self) -> Vec<(&str, &TaskMetadata)> {
        self.tasks
            .iter()
            .map(|(name, task)| (name.as_str(), &task.metadata))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("tasks", &self.tasks.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(name: &str) -> TaskMetadata {
        TaskMetadata {
            display_name: name.to_string(),
            description: String::new(),
            task_config: Vec::new(),
        }
    }

    #[test]
    fn test_register_and_dispatch() {
        let mut registry = TaskRegistry::new();
        registry
            .register("echo", metadata("Echo"), |request, _| {
                Ok(request.workflow_id.clone().unwrap_or_default())
            })
            .unwrap();

        let request = TaskRequest {
            workflow_id: Some("wf-7".to_string()),
            ..Default::default()
        };

        assert_eq!(registry.dispatch("echo", &request).unwrap(), "wf-7");
        assert!(registry.contains("echo"));
        assert_eq!(registry.metadata("echo").unwrap().display_name, "Echo");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unknown_task() {
        let registry = TaskRegistry::new();
        let result = registry.dispatch("missing", &TaskRequest::default());
        assert!(matches!(result, Err(WorkerError::UnknownTask { .. })));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let mut registry = TaskRegistry::new();
        registry.register("a", metadata("A"), |_, _| Ok(String::new())).unwrap();
        assert!(registry.register("a", metadata("A2"), |_, _| Ok(String::new())).is_err());
        assert_eq!(registry.metadata("a").unwrap().display_name, "A");
    }

    #[test]
    fn test_list_is_sorted() {
        let mut registry = TaskRegistry::new();
        registry.register("b", metadata("B"), |_, _| Ok(String::new())).unwrap();
        registry.register("a", metadata("A"), |_, _| Ok(String::new())).unwrap();

        let names: Vec<&str> = registry.list().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
