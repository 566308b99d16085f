//! Test utilities and mocks for keg unit tests.
//!
//! The pipeline crosses two seams that are awkward in tests: architecture
//! inspection and external process execution. Both get canned
//! implementations here, plus fixtures for the formulas the crate ships.

pub mod fixtures;

pub use fixtures::*;

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::formula::Formula;
use crate::inspect::{ArchInspector, InspectError};
use crate::sources::{FetchError, PackageFetcher};
use crate::util::process::{ProcessError, ProcessRunner};

#[derive(Debug, Clone, Copy)]
enum ArchAnswer {
    Universal,
    Single,
    Missing,
}

/// Inspector returning a canned answer instead of parsing a real binary.
pub struct MockArchInspector {
    answer: ArchAnswer,
    queries: Mutex<Vec<String>>,
}

impl MockArchInspector {
    /// Every program looks like a multi-architecture build.
    pub fn universal() -> Self {
        Self::with_answer(ArchAnswer::Universal)
    }

    /// Every program looks like a single-architecture build.
    pub fn single() -> Self {
        Self::with_answer(ArchAnswer::Single)
    }

    /// Every lookup fails as if the program were not on PATH.
    pub fn missing() -> Self {
        Self::with_answer(ArchAnswer::Missing)
    }

    fn with_answer(answer: ArchAnswer) -> Self {
        MockArchInspector {
            answer,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Program names asked about, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl ArchInspector for MockArchInspector {
    fn is_universal(&self, program: &str) -> Result<bool, InspectError> {
        self.queries.lock().unwrap().push(program.to_string());
        match self.answer {
            ArchAnswer::Universal => Ok(true),
            ArchAnswer::Single => Ok(false),
            ArchAnswer::Missing => Err(InspectError::NotFound {
                program: program.to_string(),
            }),
        }
    }
}

/// One invocation seen by a [`RecordingRunner`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl RecordedCall {
    /// Final path component of the program, for terse assertions.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Runner that records invocations and reports success without spawning
/// anything. Optionally fails the first invocation of a named program.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<RecordedCall>>,
    fail_on: Option<String>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report exit code 1 whenever `program` (by file name) is invoked.
    pub fn failing_on(program: &str) -> Self {
        RecordingRunner {
            calls: Mutex::new(Vec::new()),
            fail_on: Some(program.to_string()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl ProcessRunner for RecordingRunner {
    fn run(&self, program: &Path, args: &[String], cwd: &Path) -> Result<(), ProcessError> {
        let call = RecordedCall {
            program: program.to_path_buf(),
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
        };
        let name = call.program_name();
        self.calls.lock().unwrap().push(call);

        if self.fail_on.as_deref() == Some(name.as_str()) {
            return Err(ProcessError::Failed { command: name, code: 1 });
        }
        Ok(())
    }
}

/// Fetcher that lays out the fixture source tree for a formula instead of
/// touching the network. Records which formulas were staged, in order.
#[derive(Debug, Default)]
pub struct FixtureFetcher {
    staged: Mutex<Vec<String>>,
}

impl FixtureFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Formula names staged so far, in order.
    pub fn staged(&self) -> Vec<String> {
        self.staged.lock().unwrap().clone()
    }
}

impl PackageFetcher for FixtureFetcher {
    fn stage(&self, formula: &Formula, dest: &Path) -> Result<(), FetchError> {
        match formula.package.name.as_str() {
            "boost" => fixtures::boost_source_tree(dest),
            "boost-log" => fixtures::boost_log_source_tree(dest),
            other => panic!("no fixture source tree for formula '{other}'"),
        }
        self.staged
            .lock()
            .unwrap()
            .push(formula.package.name.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_inspector_records_queries() {
        let inspector = MockArchInspector::universal();
        assert!(inspector.is_universal("python").unwrap());
        assert!(inspector.is_universal("python3").unwrap());
        assert_eq!(inspector.queries(), vec!["python", "python3"]);
    }

    #[test]
    fn test_recording_runner_success_and_failure() {
        let runner = RecordingRunner::failing_on("bjam");

        runner
            .run(Path::new("/src/bootstrap.sh"), &[], Path::new("/src"))
            .unwrap();
        let err = runner
            .run(Path::new("/src/bjam"), &["install".to_string()], Path::new("/src"))
            .unwrap_err();
        assert!(matches!(err, ProcessError::Failed { code: 1, .. }));

        let calls = runner.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].program_name(), "bootstrap.sh");
        assert_eq!(calls[1].args, vec!["install"]);
    }
}
