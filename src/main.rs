use anyhow::Context;
use clap::Parser;
use exif_worker::{
    exit_code_for, logging, Cli, ExifWorker, OutputFormatter, OutputMode, TaskRequest,
    UserFriendlyError, WorkerError,
};
use std::path::{Path, PathBuf};
use std::process;

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let worker = match ExifWorker::from_cli(&cli) {
        Ok(worker) => worker,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    if let Err(e) = logging::init(&worker.config().logging.level) {
        worker.handle_error(&e);
        return exit_code_for(&e);
    }

    if cli.list_tasks {
        worker
            .output_formatter()
            .print_task_list(&worker.registry().list());
        return 0;
    }

    let request = match cli.build_request(worker.config()) {
        Ok(request) => request,
        Err(e) => {
            worker.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    if cli.dry_run {
        return handle_dry_run(&cli, &worker, &request);
    }

    tracing::debug!(
        task = %cli.task,
        output_path = %request.output_path.display(),
        "dispatching task"
    );

    match worker.execute(&cli.task, request).await {
        Ok(run) => {
            // stdout carries only the encoded result
            println!("{}", run.encoded);
            worker
                .output_formatter()
                .print_task_summary(&run.result, run.elapsed);
            0
        }
        Err(e) => {
            tracing::error!(error = %e, "task failed");
            worker.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("exif-worker.toml"));

    match write_sample_config(&config_path) {
        Ok(()) => {
            println!(
                "Generated sample configuration file: {}",
                config_path.display()
            );
            println!("\nTo use this configuration:");
            println!(
                "  exif-worker --config {} -i <file>",
                config_path.display()
            );
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {:#}", e);
            2
        }
    }
}

fn write_sample_config(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    ExifWorker::generate_sample_config(path)
        .with_context(|| format!("writing {}", path.display()))
}

fn handle_dry_run(cli: &Cli, worker: &ExifWorker, request: &TaskRequest) -> i32 {
    let formatter = worker.output_formatter();

    formatter.info("DRY RUN MODE - ExifTool will not be executed");
    formatter.print_separator();

    let plan = match worker.plan(&cli.task, request) {
        Ok(plan) => plan,
        Err(e) => {
            worker.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    formatter.info(&format!("Task: {}", cli.task));
    formatter.info(&format!(
        "Output directory: {}",
        request.output_path.display()
    ));
    formatter.print_plan(&plan);

    if plan.invocations.is_empty() {
        formatter.warning(&WorkerError::EmptyResult.user_message());
    }

    formatter.print_separator();
    formatter.success("Dry run completed successfully");
    0
}

fn print_startup_error(error: &WorkerError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}
