use crate::error::{UserFriendlyError, WorkerError};
use crate::extractor::ExtractionPlan;
use crate::task::{TaskMetadata, TaskResult};
use crate::ui::progress::format_duration;
use console::{style, Emoji, Term};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static CAMERA: Emoji = Emoji("📷 ", "> ");

/// Status messages for the operator. Everything goes to stderr: stdout
/// carries the encoded task result for the scheduler.
pub struct OutputFormatter {
    term: Term,
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let term = Term::stderr();
        let use_colors = match mode {
            OutputMode::Human => term.features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            term,
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn success(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Success, message),
                OutputMode::Json => self.print_json_message("success", message),
                OutputMode::Plain => self.line(&format!("SUCCESS: {}", message)),
            }
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => self.line(&format!("ERROR: {}", message)),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => self.line(&format!("WARNING: {}", message)),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => self.line(&format!("INFO: {}", message)),
            }
        }
    }

    pub fn debug(&self, message: &str) {
        if self.should_show_message(2) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        self.line(&format!("  {}", style(message).dim()));
                    } else {
                        self.line(&format!("  DEBUG: {}", message));
                    }
                }
                OutputMode::Json => self.print_json_message("debug", message),
                OutputMode::Plain => self.line(&format!("DEBUG: {}", message)),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        self.line(&format!("{}{}", CAMERA, style(operation).bold()));
                    } else {
                        self.line(&format!("> {}", operation));
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => self.line(&format!("STARTING: {}", operation)),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &WorkerError) {
        self.error(&error.user_message());

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        self.line(&format!(
                            "{}{}",
                            INFO,
                            style(format!("Suggestion: {}", suggestion)).cyan()
                        ));
                    } else {
                        self.line(&format!("Suggestion: {}", suggestion));
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => self.line(&format!("SUGGESTION: {}", suggestion)),
            }
        }
    }

    /// Summary of a finished task: the command and every artifact produced.
    pub fn print_task_summary(&self, result: &TaskResult, elapsed: Duration) {
        if self.quiet {
            return;
        }

        let command = result.command.as_deref().unwrap_or("-");
        match self.mode {
            OutputMode::Human => {
                self.print_separator();
                if self.use_colors {
                    self.line(&format!(
                        "{}{}",
                        CHECKMARK,
                        style("Metadata extraction completed!").green().bold()
                    ));
                } else {
                    self.line("✓ Metadata extraction completed!");
                }
                self.line(&format!("  Command:    {}", command));
                self.line(&format!("  Artifacts:  {}", result.output_files.len()));
                self.line(&format!("  Time taken: {}", format_duration(elapsed)));
                for file in &result.output_files {
                    self.line(&format!(
                        "    {} -> {}",
                        json_str(file, "display_name"),
                        json_str(file, "path")
                    ));
                }
                self.print_separator();
            }
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "summary",
                    "command": command,
                    "workflow_id": result.workflow_id,
                    "output_files": result.output_files,
                    "duration_ms": elapsed.as_millis() as u64,
                    "timestamp": chrono::Utc::now().to_rfc3339()
                }));
            }
            OutputMode::Plain => {
                self.line("COMPLETED: Metadata extraction");
                self.line(&format!("Command: {}", command));
                self.line(&format!("Artifacts: {}", result.output_files.len()));
                for file in &result.output_files {
                    self.line(&format!("Artifact: {}", json_str(file, "path")));
                }
            }
        }
    }

    pub fn print_plan(&self, plan: &ExtractionPlan) {
        match self.mode {
            OutputMode::Json => {
                let invocations: Vec<Vec<String>> = plan
                    .invocations
                    .iter()
                    .map(|invocation| {
                        std::iter::once(invocation.program.clone())
                            .chain(
                                invocation
                                    .args
                                    .iter()
                                    .map(|arg| arg.to_string_lossy().into_owned()),
                            )
                            .collect()
                    })
                    .collect();
                self.print_json_object(&serde_json::json!({
                    "type": "plan",
                    "command": plan.command,
                    "extension": plan.extension,
                    "data_type": plan.data_type,
                    "invocations": invocations
                }));
            }
            _ => {
                self.line(&format!("  Command:   {}", plan.command));
                self.line(&format!(
                    "  Artifacts: {} ({})",
                    plan.extension, plan.data_type
                ));
                self.line(&format!("  Files:     {}", plan.invocations.len()));
                for invocation in &plan.invocations {
                    let args: Vec<String> = invocation
                        .args
                        .iter()
                        .map(|arg| arg.to_string_lossy().into_owned())
                        .collect();
                    self.line(&format!("    {} {}", invocation.program, args.join(" ")));
                }
            }
        }
    }

    /// Registered tasks, written to stdout since they are the requested output.
    pub fn print_task_list(&self, tasks: &[(&str, &TaskMetadata)]) {
        match self.mode {
            OutputMode::Json => {
                let listing: Vec<serde_json::Value> = tasks
                    .iter()
                    .map(|(name, metadata)| {
                        serde_json::json!({
                            "task_name": name,
                            "metadata": metadata
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&listing).unwrap_or_else(|_| "[]".to_string())
                );
            }
            _ => {
                for (name, metadata) in tasks {
                    println!("{}", name);
                    println!("  {}: {}", metadata.display_name, metadata.description);
                    for field in &metadata.task_config {
                        println!(
                            "  --{} ({:?}, default {}): {}",
                            field.name, field.field_type, field.default_value, field.label
                        );
                    }
                }
            }
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    self.line(&style("─".repeat(60)).dim().to_string());
                } else {
                    self.line(&"-".repeat(60));
                }
            }
            OutputMode::Plain => self.line(&"-".repeat(60)),
            OutputMode::Json => {}
        }
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn line(&self, text: &str) {
        // A closed stderr is not worth failing the task over
        let _ = self.term.write_line(text);
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        if self.use_colors {
            let styled = match msg_type {
                MessageType::Success => format!("{}{}", CHECKMARK, style(message).green().bold()),
                MessageType::Error => format!("{}{}", CROSS, style(message).red().bold()),
                MessageType::Warning => format!("{}{}", WARNING, style(message).yellow().bold()),
                MessageType::Info => format!("{}{}", INFO, style(message).cyan()),
            };
            self.line(&styled);
        } else {
            let prefix = match msg_type {
                MessageType::Success => "✓",
                MessageType::Error => "✗",
                MessageType::Warning => "!",
                MessageType::Info => "i",
            };
            self.line(&format!("{} {}", prefix, message));
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        self.line(&serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string()));
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

fn json_str<'a>(value: &'a serde_json::Value, key: &str) -> &'a str {
    value.get(key).and_then(|v| v.as_str()).unwrap_or("?")
}
