// Copyright (c) The gtest-shepherd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by shepherd-runner.

use crate::test_list::TestCaseName;
use camino::Utf8PathBuf;
use std::time::Duration;
use thiserror::Error;

/// An error that occurred while obtaining the declared test list.
#[derive(Clone, Debug, Error)]
pub enum CreateTestListError {
    /// The listing invocation produced no test cases at all.
    #[error("no tests to run from `{command}`")]
    EmptySuite {
        /// The listing command line.
        command: String,
    },
}

/// An error that occurred while executing the test binary.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The binary could not be spawned.
    #[error("failed to spawn `{command}`")]
    Spawn {
        /// The command line that failed to spawn.
        command: String,
        /// The underlying io error.
        #[source]
        error: std::io::Error,
    },

    /// Waiting for the binary, or draining its output, failed.
    #[error("error waiting for `{command}` to exit")]
    Wait {
        /// The command line being waited on.
        command: String,
        /// The underlying io error.
        #[source]
        error: std::io::Error,
    },

    /// The attempt exceeded its wall-clock ceiling and the child was killed.
    ///
    /// The working directory has already been force-removed by the time this
    /// error is returned, since the killed process may have left it in a
    /// partial state.
    #[error("`{command}` did not exit within {}", humantime::format_duration(*.period))]
    Timeout {
        /// The command line that timed out.
        command: String,
        /// The ceiling that was exceeded.
        period: Duration,
        /// Output captured up to the point the child was killed.
        output: String,
    },
}

/// A test case reported by the binary that is absent from the declared list.
///
/// The declared list is fixed for the lifetime of a run and every started
/// case comes from it, so this indicates a binary that does not honor its
/// listing contract.
#[derive(Clone, Debug, Error)]
#[error("test `{test}` not found in the declared test list")]
pub struct UnknownTestError {
    /// The undeclared test case.
    pub test: TestCaseName,
}

/// An error reading the local configuration file next to the test binary.
#[derive(Debug, Error)]
pub enum ConfigReadError {
    /// The file could not be read.
    #[error("error reading config file `{path}`")]
    Read {
        /// The config file path.
        path: Utf8PathBuf,
        /// The underlying io error.
        #[source]
        error: std::io::Error,
    },

    /// The file is not well-formed XML.
    #[error("config file `{path}` is not valid XML")]
    Parse {
        /// The config file path.
        path: Utf8PathBuf,
        /// The underlying XML error.
        #[source]
        error: quick_xml::Error,
    },

    /// The file parsed but the required element was absent or empty.
    #[error("config file `{path}` is missing element `{element_path}`")]
    MissingElement {
        /// The config file path.
        path: Utf8PathBuf,
        /// Slash-separated path of the element that was expected.
        element_path: &'static str,
    },
}

/// A fatal condition that aborted the run.
///
/// Recoverable conditions never surface here: test failures and mid-suite
/// binary crashes are folded into the run results and reported through the
/// summary and the exit code instead.
#[derive(Debug, Error)]
pub enum RunAbortedError {
    /// The Tokio runtime driving attempts could not be created.
    #[error("error creating Tokio runtime")]
    RuntimeCreate {
        /// The underlying io error.
        #[source]
        error: std::io::Error,
    },

    /// The declared test list could not be obtained.
    #[error(transparent)]
    ListTests {
        /// The underlying listing error.
        #[from]
        error: CreateTestListError,
    },

    /// An execution attempt failed outright.
    #[error("error executing the test binary")]
    Execute {
        /// The underlying execution error.
        #[from]
        error: ExecuteError,
    },

    /// An execution attempt exceeded the wall-clock ceiling.
    ///
    /// The ceiling covers a whole attempt, so resumption cannot recover from
    /// it: the run is over.
    #[error("`{command}` timed out after {}", humantime::format_duration(*.period))]
    Timeout {
        /// The command line that timed out.
        command: String,
        /// The ceiling that was exceeded.
        period: Duration,
    },

    /// An attempt finished without a single test starting.
    #[error("attempt {attempt} finished without starting any test")]
    NothingExecuted {
        /// 1-based attempt number.
        attempt: usize,
    },

    /// The working directory could not be cleared between attempts.
    ///
    /// Continuing would leak a possibly corrupt directory into the next
    /// attempt, so this is fatal.
    #[error("error clearing working directory `{workdir}`")]
    WorkdirCleanup {
        /// The directory that could not be removed.
        workdir: Utf8PathBuf,
        /// The underlying io error.
        #[source]
        error: std::io::Error,
    },

    /// A started test was not found in the declared list.
    #[error(transparent)]
    UnknownTest(#[from] UnknownTestError),

    /// A resumed attempt did not advance past the previous crash point.
    ///
    /// The exclusion filter covers every case up to and including the last
    /// crash, so a binary that starts one of them again would resume forever.
    #[error("test `{test}` ran again despite being excluded; aborting instead of resuming forever")]
    NoForwardProgress {
        /// The test case that was started a second time.
        test: TestCaseName,
    },

    /// Echoing captured output through the reporter failed.
    #[error("error writing run output")]
    WriteOutput {
        /// The underlying io error.
        #[source]
        error: std::io::Error,
    },
}
