//! Subprocess execution utilities.
//!
//! Build steps (`bootstrap.sh`, `bjam`) run through the [`ProcessRunner`]
//! seam so the install pipeline can be exercised in tests without spawning
//! anything.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};

use thiserror::Error;

/// A failed or unstartable external build step. Always fatal.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to start `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed with exit code {code}")]
    Failed { command: String, code: i32 },

    #[error("`{command}` was terminated by a signal")]
    Terminated { command: String },
}

/// Builder for subprocess invocations.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }
        cmd
    }

    /// Execute with captured output and wait for completion.
    pub fn exec(&self) -> std::io::Result<Output> {
        self.build_command()
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
    }

    /// Execute with inherited stdio and return the exit status.
    pub fn status(&self) -> std::io::Result<ExitStatus> {
        self.build_command().status()
    }

    /// Display the command for log and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Runs an external build step synchronously in a working directory.
///
/// Implementations stream output as the step runs; a non-zero exit status is
/// reported as an error, never swallowed.
pub trait ProcessRunner {
    fn run(&self, program: &Path, args: &[String], cwd: &Path) -> Result<(), ProcessError>;
}

/// Production runner: inherits stdio so the build tool's own output scrolls
/// past the user exactly as it would in a shell.
#[derive(Debug, Default, Clone, Copy)]
pub struct StreamingRunner;

impl ProcessRunner for StreamingRunner {
    fn run(&self, program: &Path, args: &[String], cwd: &Path) -> Result<(), ProcessError> {
        let builder = ProcessBuilder::new(program).args(args).cwd(cwd);
        tracing::debug!("running: {}", builder.display_command());

        let status = builder.status().map_err(|source| ProcessError::Spawn {
            command: builder.display_command(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            match status.code() {
                Some(code) => Err(ProcessError::Failed {
                    command: builder.display_command(),
                    code,
                }),
                None => Err(ProcessError::Terminated {
                    command: builder.display_command(),
                }),
            }
        }
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_process_builder_exec() {
        let output = ProcessBuilder::new("echo").arg("hello").exec().unwrap();

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("hello"));
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("./bjam").args(["--layout=tagged", "install"]);

        assert_eq!(pb.display_command(), "./bjam --layout=tagged install");
    }

    #[test]
    fn test_streaming_runner_success() {
        let tmp = TempDir::new().unwrap();
        let runner = StreamingRunner;

        runner
            .run(Path::new("sh"), &["-c".into(), "true".into()], tmp.path())
            .unwrap();
    }

    #[test]
    fn test_streaming_runner_reports_exit_code() {
        let tmp = TempDir::new().unwrap();
        let runner = StreamingRunner;

        let err = runner
            .run(Path::new("sh"), &["-c".into(), "exit 3".into()], tmp.path())
            .unwrap_err();

        match err {
            ProcessError::Failed { code, .. } => assert_eq!(code, 3),
            other => panic!("unexpected error: {other}"),
        }
    }
}
