use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("ExifTool failed for {path}: {stderr}")]
    ToolExecution { path: String, stderr: String },

    #[error("No input files were processed or ExifTool produced no output.")]
    EmptyResult,

    #[error("Failed to start {tool}: {source}")]
    ToolSpawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid piped result: {message}")]
    InvalidPipeResult { message: String },

    #[error("Invalid task configuration: {message}")]
    InvalidTaskConfig { message: String },

    #[error("Unknown task: {name}")]
    UnknownTask { name: String },

    #[error("Serialization failed: {message}")]
    Serialization { message: String },

    #[error("Task execution aborted: {message}")]
    TaskAborted { message: String },
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for WorkerError {
    fn user_message(&self) -> String {
        match self {
            WorkerError::ToolExecution { path, stderr } => {
                let stderr = stderr.trim();
                if stderr.is_empty() {
                    format!("ExifTool exited with an error for {}", path)
                } else {
                    format!("ExifTool failed for {}: {}", path, stderr)
                }
            }
            WorkerError::ToolSpawn { tool, source } => {
                format!("Could not run '{}': {}", tool, source)
            }
            WorkerError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            WorkerError::InvalidPipeResult { message } => {
                format!("The result handed over by the previous task is unreadable: {}", message)
            }
            WorkerError::InvalidTaskConfig { message } => {
                format!("Invalid task configuration: {}", message)
            }
            WorkerError::UnknownTask { name } => {
                format!("No task registered under the name '{}'", name)
            }
            WorkerError::TaskAborted { message } => {
                format!("The task stopped unexpectedly: {}", message)
            }
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            WorkerError::ToolExecution { .. } => Some(
                "Check that the input file exists and is a format ExifTool can read.".to_string()
            ),
            WorkerError::EmptyResult => Some(
                "Pass at least one file with --input or a --pipe-result from a previous task.".to_string()
            ),
            WorkerError::ToolSpawn { .. } => Some(
                "Install ExifTool or point --tool (or [tool] binary in the config file) at the executable.".to_string()
            ),
            WorkerError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string()
            ),
            WorkerError::InvalidPipeResult { .. } => Some(
                "Piped results must be base64-encoded JSON with an \"output_files\" list.".to_string()
            ),
            WorkerError::InvalidTaskConfig { .. } => Some(
                "Task configuration must be a JSON object, e.g. {\"json_output\": true}.".to_string()
            ),
            WorkerError::UnknownTask { .. } => Some(
                "Run with --list-tasks to see the registered task names.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<tokio::task::JoinError> for WorkerError {
    fn from(error: tokio::task::JoinError) -> Self {
        let message = if error.is_panic() {
            "the task panicked".to_string()
        } else {
            error.to_string()
        };
        WorkerError::TaskAborted { message }
    }
}

impl From<serde_json::Error> for WorkerError {
    fn from(error: serde_json::Error) -> Self {
        WorkerError::Serialization {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkerError>;
