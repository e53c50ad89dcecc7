use crate::error::{Result, WorkerError};
use crate::extractor::output_manager::{FsOutputAllocator, OutputAllocator};
use crate::input::{InputFile, InputResolver, PipedInputResolver};
use crate::runner::{ProcessRunner, ToolInvocation, ToolRunner};
use crate::task::{
    ConfigField, EncodedResultBuilder, FieldType, ProgressCallback, ResultBuilder, TaskConfig,
    TaskMetadata, TaskRegistry, TaskRequest,
};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Name under which the extraction task is registered and routed.
pub const TASK_NAME: &str = "openrelik-worker-exif.tasks.extract_exif";

pub const DEFAULT_TOOL: &str = "exiftool";

#[derive(Debug, Clone)]
pub struct ExtractionProgress {
    pub files_processed: usize,
    pub total_files: usize,
    pub current_file: Option<String>,
    pub start_time: Instant,
}

impl ExtractionProgress {
    pub fn new(total_files: usize) -> Self {
        Self {
            files_processed: 0,
            total_files,
            current_file: None,
            start_time: Instant::now(),
        }
    }

    pub fn start_file(&mut self, display_name: &str) {
        self.current_file = Some(display_name.to_string());
    }

    pub fn finish_file(&mut self) {
        self.files_processed += 1;
    }

    pub fn percentage(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.files_processed as f64 / self.total_files as f64) * 100.0
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// What a run would execute, without executing it.
#[derive(Debug, Clone)]
pub struct ExtractionPlan {
    pub command: String,
    pub invocations: Vec<ToolInvocation>,
    pub extension: &'static str,
    pub data_type: &'static str,
}

/// Runs ExifTool once per input file and collects the captured output as
/// workflow artifacts.
pub struct ExifExtractor {
    tool: String,
    runner: Arc<dyn ToolRunner>,
    resolver: Arc<dyn InputResolver>,
    allocator: Arc<dyn OutputAllocator>,
    result_builder: Arc<dyn ResultBuilder>,
}

impl ExifExtractor {
    pub fn new<S: Into<String>>(tool: S) -> Self {
        Self {
            tool: tool.into(),
            runner: Arc::new(ProcessRunner::new()),
            resolver: Arc::new(PipedInputResolver::new()),
            allocator: Arc::new(FsOutputAllocator::new()),
            result_builder: Arc::new(EncodedResultBuilder::new()),
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn ToolRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn InputResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_allocator(mut self, allocator: Arc<dyn OutputAllocator>) -> Self {
        self.allocator = allocator;
        self
    }

    pub fn with_result_builder(mut self, result_builder: Arc<dyn ResultBuilder>) -> Self {
        self.result_builder = result_builder;
        self
    }

    /// `[tool]`, plus `-json` when JSON output is requested.
    pub fn base_command(&self, config: &TaskConfig) -> Vec<String> {
        let mut command = vec![self.tool.clone()];
        if config.json_output {
            command.push("-json".to_string());
        }
        command
    }

    pub fn command_string(&self, config: &TaskConfig) -> String {
        self.base_command(config).join(" ")
    }

    fn invocation_for(&self, base_command: &[String], input: &InputFile) -> ToolInvocation {
        ToolInvocation::new(base_command[0].clone())
            .args(base_command[1..].iter().cloned())
            .arg(input.path.as_os_str())
    }

    pub fn plan(
        &self,
        pipe_result: Option<&str>,
        input_files: Vec<InputFile>,
        task_config: Option<&Value>,
    ) -> Result<ExtractionPlan> {
        let config = TaskConfig::from_value(task_config)?;
        let inputs = self.resolver.resolve(pipe_result, input_files)?;
        let base_command = self.base_command(&config);

        Ok(ExtractionPlan {
            command: base_command.join(" "),
            invocations: inputs
                .iter()
                .map(|input| self.invocation_for(&base_command, input))
                .collect(),
            extension: config.output_extension(),
            data_type: config.output_data_type(),
        })
    }

    pub fn run(
        &self,
        pipe_result: Option<&str>,
        input_files: Vec<InputFile>,
        output_path: &Path,
        workflow_id: Option<&str>,
        task_config: Option<&Value>,
    ) -> Result<String> {
        self.run_with_progress(pipe_result, input_files, output_path, workflow_id, task_config, None)
    }

    /// Processes the inputs strictly in order, one child process at a time.
    /// The first failing invocation aborts the whole task.
    pub fn run_with_progress(
        &self,
        pipe_result: Option<&str>,
        input_files: Vec<InputFile>,
        output_path: &Path,
        workflow_id: Option<&str>,
        task_config: Option<&Value>,
        progress_callback: ProgressCallback<'_>,
    ) -> Result<String> {
        let config = TaskConfig::from_value(task_config)?;
        let inputs = self.resolver.resolve(pipe_result, input_files)?;

        let base_command = self.base_command(&config);
        let command = base_command.join(" ");
        let extension = config.output_extension();
        let data_type = config.output_data_type();

        tracing::info!(
            command = %command,
            files = inputs.len(),
            workflow_id = workflow_id.unwrap_or("-"),
            "starting exif extraction"
        );

        let mut progress = ExtractionProgress::new(inputs.len());
        let mut output_files = Vec::with_capacity(inputs.len());

        for input in &inputs {
            progress.start_file(&input.display_name);
            if let Some(callback) = progress_callback {
                callback(&progress);
            }

            let output = self
                .allocator
                .allocate(output_path, &input.display_name, extension, data_type)?
                .with_source(input.uuid.clone(), input.original_path.clone());
            let invocation = self.invocation_for(&base_command, input);

            tracing::debug!(
                input = %input.path.display(),
                output = %output.path.display(),
                "running {}",
                command
            );

            let outcome = self.runner.run(&invocation, output.create()?)?;
            if !outcome.success() {
                let stderr = outcome.stderr_text();
                tracing::warn!(
                    input = %input.path.display(),
                    exit_code = ?outcome.exit_code,
                    "exiftool failed"
                );
                return Err(WorkerError::ToolExecution {
                    path: input.path.display().to_string(),
                    stderr,
                });
            }

            output_files.push(output.to_serializable()?);
            progress.finish_file();
        }

        if let Some(callback) = progress_callback {
            callback(&progress);
        }

        if output_files.is_empty() {
            return Err(WorkerError::EmptyResult);
        }

        tracing::info!(
            files = output_files.len(),
            elapsed_ms = progress.elapsed().as_millis() as u64,
            "exif extraction finished"
        );

        self.result_builder
            .build(output_files, workflow_id, &command, Map::new())
    }

    /// Entry point used by the task registry.
    pub fn handle(&self, request: &TaskRequest, progress: ProgressCallback<'_>) -> Result<String> {
        self.run_with_progress(
            request.pipe_result.as_deref(),
            request.input_files.clone(),
            &request.output_path,
            request.workflow_id.as_deref(),
            request.task_config.as_ref(),
            progress,
        )
    }
}

impl Default for ExifExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL)
    }
}

pub fn task_metadata() -> TaskMetadata {
    TaskMetadata {
        display_name: "ExifTool Extractor".to_string(),
        description: "Extracts EXIF metadata from files using ExifTool.".to_string(),
        task_config: vec![ConfigField {
            name: TaskConfig::JSON_OUTPUT.to_string(),
            label: "Output in JSON format".to_string(),
            description: "If checked, ExifTool will output metadata in JSON format. \
                          Output files will have a .json extension and 'application/json' MIME type."
                .to_string(),
            field_type: FieldType::Checkbox,
            required: false,
            default_value: Value::Bool(false),
        }],
    }
}

/// Adds the extraction task to `registry`.
pub fn register(registry: &mut TaskRegistry, extractor: Arc<ExifExtractor>) -> Result<()> {
    registry.register(TASK_NAME, task_metadata(), move |request, progress| {
        extractor.handle(request, progress)
    })
}

/// Output directory for a request when the caller names none.
pub fn default_output_path(base: &Path, workflow_id: Option<&str>) -> PathBuf {
    match workflow_id {
        Some(id) if !id.trim().is_empty() => base.join(id.trim()),
        _ => base.to_path_buf(),
    }
}
