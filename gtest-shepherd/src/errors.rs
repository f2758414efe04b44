// Copyright (c) The gtest-shepherd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::StderrStyles;
use owo_colors::OwoColorize;
use shepherd_runner::errors::{ConfigReadError, RunAbortedError};
use std::error::Error;
use thiserror::Error;

/// Documented exit codes for gtest-shepherd.
///
/// A run may fail for a variety of reasons. This structure documents the
/// exit codes that occur in case of expected failures.
pub enum ShepherdExitCode {}

impl ShepherdExitCode {
    /// The suite ran to completion with no failures and no crashes.
    pub const OK: i32 = 0;

    /// One or more tests failed or terminated the binary.
    pub const TEST_RUN_FAILED: i32 = 1;

    /// An issue occurred before the first test could run.
    pub const SETUP_ERROR: i32 = 96;

    /// An internal invariant was violated. This is a bug in gtest-shepherd
    /// or a binary that does not honor its listing contract.
    pub const INTERNAL_ERROR: i32 = 97;

    /// An execution attempt exceeded the wall-clock timeout and the run was
    /// aborted.
    pub const TIMED_OUT: i32 = 104;
}

// The #[error()] strings are placeholder messages; errors are rendered
// through display_to_stderr, which colorizes them.

/// A fatal error surfaced to the user, mapped to an exit code.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config read error")]
    ConfigRead {
        #[from]
        err: ConfigReadError,
    },
    #[error("test run aborted")]
    RunAborted {
        #[from]
        err: RunAbortedError,
    },
    #[error("error writing output")]
    WriteOutput {
        #[source]
        err: std::io::Error,
    },
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigRead { .. } | Self::WriteOutput { .. } => ShepherdExitCode::SETUP_ERROR,
            Self::RunAborted { err } => match err {
                RunAbortedError::Timeout { .. } => ShepherdExitCode::TIMED_OUT,
                RunAbortedError::UnknownTest(_) | RunAbortedError::NoForwardProgress { .. } => {
                    ShepherdExitCode::INTERNAL_ERROR
                }
                RunAbortedError::RuntimeCreate { .. }
                | RunAbortedError::ListTests { .. }
                | RunAbortedError::Execute { .. }
                | RunAbortedError::NothingExecuted { .. }
                | RunAbortedError::WorkdirCleanup { .. }
                | RunAbortedError::WriteOutput { .. } => ShepherdExitCode::SETUP_ERROR,
            },
        }
    }

    /// Displays the error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::ConfigRead { err } => {
                tracing::error!("failed to read local test configuration");
                Some(err as &dyn Error)
            }
            Self::RunAborted { err } => match err {
                RunAbortedError::Timeout { command, period } => {
                    tracing::error!(
                        "execution of `{}` timed out after {}; aborting the run",
                        command.style(styles.bold),
                        humantime::format_duration(*period),
                    );
                    None
                }
                other => {
                    tracing::error!("{}", other);
                    other.source()
                }
            },
            Self::WriteOutput { err } => {
                tracing::error!("error writing output");
                Some(err as &dyn Error)
            }
        };

        while let Some(err) = next_error {
            tracing::error!(
                target: "gtest_shepherd::no_heading",
                "{}",
                format!("\nCaused by:\n  {}", err).style(styles.warning_text),
            );
            next_error = err.source();
        }
    }
}
