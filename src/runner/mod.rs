#[cfg(any(test, feature = "test-util"))]
pub mod mock;
pub mod process;

use crate::error::Result;
use std::ffi::OsString;
use std::fs::File;

#[cfg(any(test, feature = "test-util"))]
pub use mock::MockRunner;
pub use process::ProcessRunner;

/// A single child-process command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<OsString>,
}

impl ToolInvocation {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg<A: Into<OsString>>(mut self, arg: A) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// How a finished child process exited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stderr: Vec<u8>,
}

impl ToolOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Runs an external tool with its standard output redirected into `stdout`.
///
/// Implementations block until the child exits and buffer its standard error.
pub trait ToolRunner: Send + Sync {
    fn run(&self, invocation: &ToolInvocation, stdout: File) -> Result<ToolOutcome>;
}
