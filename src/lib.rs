pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod input;
pub mod logging;
pub mod runner;
pub mod task;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{CliOverrides, Config, LoggingConfig, OutputConfig, ToolConfig};
pub use error::{Result, UserFriendlyError, WorkerError};

// Core functionality re-exports
pub use extractor::{
    ExifExtractor, ExtractionPlan, ExtractionProgress, FsOutputAllocator, OutputAllocator,
    OutputFile, TASK_NAME,
};
pub use input::{InputFile, InputResolver, PipedInputResolver};
pub use runner::{ProcessRunner, ToolInvocation, ToolOutcome, ToolRunner};
#[cfg(any(test, feature = "test-util"))]
pub use runner::MockRunner;
pub use task::{TaskConfig, TaskMetadata, TaskRegistry, TaskRequest, TaskResult};
pub use ui::{OutputFormatter, OutputMode, ProgressManager};

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A finished task: the encoded result for the scheduler plus its decoded form.
#[derive(Debug, Clone)]
pub struct TaskRun {
    pub encoded: String,
    pub result: TaskResult,
    pub elapsed: Duration,
}

/// Main library interface: the task registry plus the operator-facing output.
pub struct ExifWorker {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    extractor: Arc<ExifExtractor>,
    registry: Arc<TaskRegistry>,
}

impl ExifWorker {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let extractor = Arc::new(ExifExtractor::new(config.tool.binary.clone()));
        Self::with_extractor(config, output_mode, verbose, quiet, extractor)
    }

    /// Builds a worker around a preconfigured extractor, e.g. one with a
    /// different tool runner.
    pub fn with_extractor(
        config: Config,
        output_mode: OutputMode,
        verbose: u8,
        quiet: bool,
        extractor: Arc<ExifExtractor>,
    ) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);

        let mut registry = TaskRegistry::new();
        register_default_tasks(&mut registry, Arc::clone(&extractor))?;

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
            extractor,
            registry: Arc::new(registry),
        })
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        Self::new(
            config,
            output_mode_for(&cli_args.output_format),
            cli_args.verbose,
            cli_args.quiet,
        )
    }

    /// Runs a registered task on the blocking pool and reports progress
    /// while it works through the inputs.
    pub async fn execute(&self, task_name: &str, request: TaskRequest) -> Result<TaskRun> {
        if !self.registry.contains(task_name) {
            return Err(WorkerError::UnknownTask {
                name: task_name.to_string(),
            });
        }

        self.output_formatter
            .start_operation(&format!("Running {}", task_name));
        self.output_formatter.debug(&format!(
            "Output directory: {}",
            request.output_path.display()
        ));

        let start_time = Instant::now();
        let file_progress = self
            .progress_manager
            .create_file_progress(request.input_files.len() as u64);

        let registry = Arc::clone(&self.registry);
        let name = task_name.to_string();
        let pb = file_progress.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            let progress_callback = move |progress: &ExtractionProgress| {
                ui::progress::update_file_progress(&pb, progress);
            };
            registry.dispatch_with_progress(&name, &request, Some(&progress_callback))
        })
        .await
        .map_err(WorkerError::from)?;

        let encoded = match outcome {
            Ok(encoded) => encoded,
            Err(e) => {
                file_progress.abandon();
                return Err(e);
            }
        };

        let result = TaskResult::decode(&encoded)?;
        let elapsed = start_time.elapsed();
        ui::progress::finish_progress_with_summary(
            &file_progress,
            &format!("Processed {} files", result.output_files.len()),
            elapsed,
        );

        Ok(TaskRun {
            encoded,
            result,
            elapsed,
        })
    }

    /// Resolves inputs and command lines for a request without running anything.
    pub fn plan(&self, task_name: &str, request: &TaskRequest) -> Result<ExtractionPlan> {
        if task_name != TASK_NAME || !self.registry.contains(task_name) {
            return Err(WorkerError::UnknownTask {
                name: task_name.to_string(),
            });
        }

        self.extractor.plan(
            request.pipe_result.as_deref(),
            request.input_files.clone(),
            request.task_config.as_ref(),
        )
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn progress_manager(&self) -> &ProgressManager {
        &self.progress_manager
    }

    pub fn handle_error(&self, error: &WorkerError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Registers every task this worker serves.
pub fn register_default_tasks(
    registry: &mut TaskRegistry,
    extractor: Arc<ExifExtractor>,
) -> Result<()> {
    crate::extractor::register(registry, extractor)
}

pub fn output_mode_for(format: &OutputFormat) -> OutputMode {
    match format {
        OutputFormat::Human => OutputMode::Human,
        OutputFormat::Json => OutputMode::Json,
        OutputFormat::Plain => OutputMode::Plain,
    }
}

/// Process exit status for a failed run.
pub fn exit_code_for(error: &WorkerError) -> i32 {
    match error {
        WorkerError::Config { .. } | WorkerError::InvalidTaskConfig { .. } => 2,
        WorkerError::ToolExecution { .. } | WorkerError::ToolSpawn { .. } => 3,
        WorkerError::EmptyResult => 4,
        WorkerError::UnknownTask { .. } => 5,
        _ => 1,
    }
}

pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn build_info() -> BuildInfo {
    BuildInfo {
        version: env!("CARGO_PKG_VERSION"),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown"),
        build_date: option_env!("BUILD_DATE").unwrap_or("unknown"),
        target: std::env::consts::ARCH.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct BuildInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub build_date: &'static str,
    pub target: String,
}

impl std::fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "exif-worker {} ({}) built on {} for {}",
            self.version, self.git_hash, self.build_date, self.target
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn quiet_worker(runner: Arc<MockRunner>) -> ExifWorker {
        let extractor = Arc::new(ExifExtractor::new("exiftool").with_runner(runner));
        ExifWorker::with_extractor(Config::default(), OutputMode::Plain, 0, true, extractor)
            .unwrap()
    }

    #[test]
    fn test_worker_registers_exif_task() {
        let worker = ExifWorker::new(Config::default(), OutputMode::Human, 0, true).unwrap();
        assert!(worker.registry().contains(TASK_NAME));
        assert_eq!(worker.registry().len(), 1);
        assert_eq!(worker.config().tool.binary, "exiftool");
    }

    #[tokio::test]
    async fn test_execute_returns_decoded_result() {
        let temp_dir = TempDir::new().unwrap();
        let runner = Arc::new(MockRunner::new());
        runner.push_success("{\"Make\": \"Canon\"}");
        let worker = quiet_worker(Arc::clone(&runner));

        let request = TaskRequest {
            input_files: vec![InputFile::new("/data/a.jpg", "a.jpg")],
            output_path: temp_dir.path().to_path_buf(),
            workflow_id: Some("wf-1".to_string()),
            task_config: Some(serde_json::json!({"json_output": true})),
            ..Default::default()
        };

        let run = worker.execute(TASK_NAME, request).await.unwrap();
        assert_eq!(run.result.command.as_deref(), Some("exiftool -json"));
        assert_eq!(run.result.workflow_id.as_deref(), Some("wf-1"));
        assert_eq!(run.result.output_files.len(), 1);
        assert_eq!(TaskResult::decode(&run.encoded).unwrap().output_files.len(), 1);
        assert_eq!(runner.invocations().len(), 1);
    }

    #[tokio::test]
    async fn test_execute_unknown_task() {
        let worker = quiet_worker(Arc::new(MockRunner::new()));
        let result = worker.execute("nope", TaskRequest::default()).await;
        assert!(matches!(result, Err(WorkerError::UnknownTask { .. })));
    }

    #[tokio::test]
    async fn test_execute_without_inputs_is_empty_result() {
        let temp_dir = TempDir::new().unwrap();
        let worker = quiet_worker(Arc::new(MockRunner::new()));
        let request = TaskRequest {
            output_path: temp_dir.path().to_path_buf(),
            ..Default::default()
        };

        let error = worker.execute(TASK_NAME, request).await.unwrap_err();
        assert!(matches!(error, WorkerError::EmptyResult));
        assert_eq!(exit_code_for(&error), 4);
    }

    #[test]
    fn test_plan_does_not_run_tool() {
        let runner = Arc::new(MockRunner::new());
        let worker = quiet_worker(Arc::clone(&runner));
        let request = TaskRequest {
            input_files: vec![
                InputFile::new("/data/a.jpg", "a.jpg"),
                InputFile::new("/data/b.jpg", "b.jpg"),
            ],
            ..Default::default()
        };

        let plan = worker.plan(TASK_NAME, &request).unwrap();
        assert_eq!(plan.command, "exiftool");
        assert_eq!(plan.invocations.len(), 2);
        assert!(runner.invocations().is_empty());
        assert!(worker.plan("other", &request).is_err());
    }

    #[test]
    fn test_sample_config_generation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("sample.toml");

        ExifWorker::generate_sample_config(&config_path).unwrap();

        let content = std::fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[tool]"));
        assert!(content.contains("[output]"));
        assert!(content.contains("[logging]"));
    }

    #[test]
    fn test_exit_codes() {
        let tool_failure = WorkerError::ToolExecution {
            path: "a.jpg".to_string(),
            stderr: "bad file".to_string(),
        };
        assert_eq!(exit_code_for(&tool_failure), 3);
        assert_eq!(exit_code_for(&WorkerError::UnknownTask { name: "x".into() }), 5);
        assert_eq!(
            exit_code_for(&WorkerError::Config {
                message: "x".into()
            }),
            2
        );
        assert_eq!(
            exit_code_for(&WorkerError::InvalidPipeResult {
                message: "x".into()
            }),
            1
        );
        assert_eq!(
            exit_code_for(&WorkerError::TaskAborted {
                message: "the task panicked".into()
            }),
            1
        );
    }

    #[test]
    fn test_build_info_display() {
        let build_info = build_info();
        assert!(!version_info().is_empty());
        assert!(build_info.to_string().contains("exif-worker"));
        assert!(build_info.to_string().contains(build_info.version));
    }
}
