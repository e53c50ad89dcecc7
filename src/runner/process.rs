use super::{ToolInvocation, ToolOutcome, ToolRunner};
use crate::error::{Result, WorkerError};
use std::fs::File;
use std::process::{Command, Stdio};

/// Spawns the real executable.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ToolRunner for ProcessRunner {
    fn run(&self, invocation: &ToolInvocation, stdout: File) -> Result<ToolOutcome> {
        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| WorkerError::ToolSpawn {
                tool: invocation.program.clone(),
                source: e,
            })?;

        // stdout is not piped, so only stderr is collected here
        let output = child.wait_with_output()?;

        Ok(ToolOutcome {
            exit_code: output.status.code(),
            stderr: output.stderr,
        })
    }
}
