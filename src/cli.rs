use crate::config::{CliOverrides, Config};
use crate::error::{Result, WorkerError};
use crate::extractor::{default_output_path, TASK_NAME};
use crate::input::InputFile;
use crate::task::{TaskConfig, TaskRequest};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "exif-worker")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract EXIF metadata from files using ExifTool")]
#[command(
    long_about = "exif-worker runs ExifTool once per input file and stores each tool's output \
                  as a workflow artifact. The encoded task result is printed to stdout."
)]
#[command(after_help = "EXAMPLES:\n  \
    exif-worker -i photo.jpg -o ./outputs\n  \
    exif-worker -i a.jpg -i b.png --json-output --workflow-id wf-42\n  \
    exif-worker --pipe-result \"$PREVIOUS_RESULT\" -o ./outputs\n  \
    exif-worker --list-tasks --output-format json")]
pub struct Cli {
    /// Registered task to run
    #[arg(long, default_value = TASK_NAME)]
    pub task: String,

    /// Base64-encoded result of the previous task; its output files become the inputs
    #[arg(long)]
    pub pipe_result: Option<String>,

    /// Input file (repeatable); ignored when --pipe-result is given
    #[arg(short, long = "input", value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Directory for the produced artifacts
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// Workflow identifier recorded in the result
    #[arg(long)]
    pub workflow_id: Option<String>,

    /// Ask ExifTool for JSON output (same as {"json_output": true})
    #[arg(long)]
    pub json_output: bool,

    /// Task configuration as a JSON object
    #[arg(long, value_name = "JSON")]
    pub task_config: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "EXIF_WORKER_CONFIG", help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// ExifTool executable
    #[arg(long, help = "ExifTool executable name or path (default: exiftool)")]
    pub tool: Option<String>,

    /// Output format for status messages
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show the commands that would run without running them
    #[arg(long)]
    pub dry_run: bool,

    /// List registered tasks and their configuration schema
    #[arg(long)]
    pub list_tasks: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        let log_level = match self.verbose {
            0 => None,
            1 => Some("debug".to_string()),
            _ => Some("trace".to_string()),
        };

        CliOverrides::new()
            .with_tool_binary(self.tool.clone())
            .with_log_level(log_level)
    }

    /// `--task-config` merged with `--json-output`.
    pub fn task_config_value(&self) -> Result<Option<Value>> {
        let mut value = match self.task_config {
            Some(ref raw) => Some(serde_json::from_str::<Value>(raw).map_err(|e| {
                WorkerError::InvalidTaskConfig {
                    message: e.to_string(),
                }
            })?),
            None => None,
        };

        if self.json_output {
            match value {
                Some(Value::Object(ref mut object)) => {
                    object.insert(TaskConfig::JSON_OUTPUT.to_string(), Value::Bool(true));
                }
                None | Some(Value::Null) => {
                    let mut object = serde_json::Map::new();
                    object.insert(TaskConfig::JSON_OUTPUT.to_string(), Value::Bool(true));
                    value = Some(Value::Object(object));
                }
                Some(_) => {}
            }
        }

        Ok(value)
    }

    pub fn input_files(&self) -> Vec<InputFile> {
        self.inputs.iter().map(InputFile::from_path).collect()
    }

    pub fn build_request(&self, config: &Config) -> Result<TaskRequest> {
        let output_path = match self.output_path {
            Some(ref path) => path.clone(),
            None => default_output_path(&config.output.base_directory, self.workflow_id.as_deref()),
        };

        Ok(TaskRequest {
            pipe_result: self.pipe_result.clone(),
            input_files: self.input_files(),
            output_path,
            workflow_id: self.workflow_id.clone(),
            task_config: self.task_config_value()?,
        })
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose > 0 && !self.quiet
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}
