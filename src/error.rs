//! Process exit codes and the `--json-errors` payload.
//!
//! A finished run maps to one of four codes through [`ExitCode::for_run`];
//! anything that stops `run_app` early is [`ExitCode::GeneralError`].

use serde::Serialize;

/// How an imgdupe invocation ended.
///
/// | code | prefix  | meaning                                            |
/// |------|---------|----------------------------------------------------|
/// | 0    | `ID000` | run finished, duplicate uploads reported           |
/// | 1    | `ID001` | configuration, credential or store failure         |
/// | 2    | `ID002` | run finished, every upload is unique               |
/// | 3    | `ID003` | run finished but a request, download or hash failed |
/// | 130  | `ID130` | stopped by Ctrl+C after saving the store            |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Duplicates were reported.
    Success = 0,
    /// Fatal error before or during the run.
    GeneralError = 1,
    /// Nothing to report.
    NoDuplicates = 2,
    /// Some remote or local step was skipped after an error.
    PartialSuccess = 3,
    /// Ctrl+C.
    Interrupted = 130,
}

impl ExitCode {
    /// Code for a run that reached the end of the pipeline.
    ///
    /// An interruption outranks recoverable failures, which outrank the
    /// duplicate verdict.
    #[must_use]
    pub fn for_run(interrupted: bool, had_failures: bool, found_duplicates: bool) -> Self {
        match (interrupted, had_failures, found_duplicates) {
            (true, _, _) => Self::Interrupted,
            (false, true, _) => Self::PartialSuccess,
            (false, false, true) => Self::Success,
            (false, false, false) => Self::NoDuplicates,
        }
    }

    /// Value passed to `std::process::exit`.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Stable identifier printed in error lines and JSON.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "ID000",
            Self::GeneralError => "ID001",
            Self::NoDuplicates => "ID002",
            Self::PartialSuccess => "ID003",
            Self::Interrupted => "ID130",
        }
    }
}

/// Object printed on stderr by `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Identifier such as `ID001`
    pub code: String,
    /// Numeric process exit code
    pub exit_code: i32,
    /// Error followed by its context chain
    pub message: String,
    /// True only for [`ExitCode::Interrupted`]
    pub interrupted: bool,
}

impl StructuredError {
    /// Describe `err`, which ended the process with `exit_code`.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
