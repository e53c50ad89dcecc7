use super::{ToolInvocation, ToolOutcome, ToolRunner};
use crate::error::Result;
use std::collections::VecDeque;
use std::fs::File;
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// What a scripted invocation writes and how it exits.
#[derive(Debug, Clone)]
pub struct ScriptedRun {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: i32,
}

/// Test runner: no process is spawned. Each call pops the next scripted run
/// (an empty success once the script is exhausted) and records the invocation.
#[derive(Debug, Default)]
pub struct MockRunner {
    script: Mutex<VecDeque<ScriptedRun>>,
    pub calls: Mutex<Vec<ToolInvocation>>,
}

impl MockRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_success<B: Into<Vec<u8>>>(&self, stdout: B) -> &Self {
        self.push(ScriptedRun {
            stdout: stdout.into(),
            stderr: Vec::new(),
            exit_code: 0,
        })
    }

    pub fn push_failure<B: Into<Vec<u8>>>(&self, exit_code: i32, stderr: B) -> &Self {
        self.push(ScriptedRun {
            stdout: Vec::new(),
            stderr: stderr.into(),
            exit_code,
        })
    }

    pub fn push(&self, run: ScriptedRun) -> &Self {
        lock(&self.script).push_back(run);
        self
    }

    pub fn invocations(&self) -> Vec<ToolInvocation> {
        lock(&self.calls).clone()
    }
}

// Poisoned locks are recovered; the guarded queues stay consistent
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ToolRunner for MockRunner {
    fn run(&self, invocation: &ToolInvocation, mut stdout: File) -> Result<ToolOutcome> {
        lock(&self.calls).push(invocation.clone());

        let run = lock(&self.script).pop_front().unwrap_or(ScriptedRun {
            stdout: Vec::new(),
            stderr: Vec::new(),
            exit_code: 0,
        });

        stdout.write_all(&run.stdout)?;
        stdout.flush()?;

        Ok(ToolOutcome {
            exit_code: Some(run.exit_code),
            stderr: run.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_scripted_runs_replay_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let runner = MockRunner::new();
        runner.push_success("first").push_failure(2, "second failed");

        let out = temp_dir.path().join("out.txt");
        let ok = runner
            .run(&ToolInvocation::new("exiftool"), File::create(&out).unwrap())
            .unwrap();
        assert!(ok.success());
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "first");

        let failed = runner
            .run(&ToolInvocation::new("exiftool"), File::create(&out).unwrap())
            .unwrap();
        assert_eq!(failed.exit_code, Some(2));
        assert_eq!(failed.stderr_text(), "second failed");

        let exhausted = runner
            .run(&ToolInvocation::new("exiftool"), File::create(&out).unwrap())
            .unwrap();
        assert!(exhausted.success());
        assert_eq!(runner.invocations().len(), 3);
    }

    #[test]
    fn test_poisoned_lock_still_usable() {
        let temp_dir = TempDir::new().unwrap();
        let runner = Arc::new(MockRunner::new());

        let poisoner = Arc::clone(&runner);
        let joined = std::thread::spawn(move || {
            let _guard = poisoner.calls.lock().unwrap();
            panic!("holding the call log");
        })
        .join();
        assert!(joined.is_err());
        assert!(runner.calls.is_poisoned());

        runner.push_success("after");
        runner
            .run(
                &ToolInvocation::new("exiftool"),
                File::create(temp_dir.path().join("out.txt")).unwrap(),
            )
            .unwrap();
        assert_eq!(runner.invocations().len(), 1);
    }
}
