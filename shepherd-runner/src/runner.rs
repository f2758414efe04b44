// Copyright (c) The gtest-shepherd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The resumption state machine.
//!
//! One [`SuiteRunner`] owns one run: it lists the declared suite, then
//! executes attempts in a loop. An attempt that ends before the final
//! declared case has started is a crash; the case that was in flight is
//! recorded, the working directory is cleared, and the next attempt starts
//! past the crash point through a rebuilt exclusion filter. The loop makes
//! strictly monotonic progress through the declared order, so a run takes at
//! most one attempt per declared case.

use crate::{
    errors::{ExecuteError, RunAbortedError, UnknownTestError},
    executor,
    reporter::SuiteReporter,
    test_command::TestCommand,
    test_filter,
    test_list::{TestCaseName, TestList},
};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexSet;
use std::{
    io,
    time::{Duration, Instant},
};

/// Builder for [`SuiteRunner`].
#[derive(Debug, Default)]
pub struct SuiteRunnerBuilder {
    timeout: Option<Duration>,
    user_exclusion: Option<String>,
}

impl SuiteRunnerBuilder {
    /// Sets the wall-clock ceiling for a single attempt. `None` means
    /// unbounded. The ceiling is re-armed on every resumption.
    pub fn set_timeout(&mut self, timeout: Option<Duration>) -> &mut Self {
        self.timeout = timeout;
        self
    }

    /// Sets an exclusion applied to every attempt, in gtest filter
    /// semantics.
    pub fn set_user_exclusion(&mut self, user_exclusion: Option<String>) -> &mut Self {
        self.user_exclusion = user_exclusion;
        self
    }

    /// Creates a runner for `binary`, clearing `workdir` between attempts.
    pub fn build(&self, binary: Utf8PathBuf, workdir: Utf8PathBuf) -> SuiteRunner {
        SuiteRunner {
            binary,
            workdir,
            timeout: self.timeout,
            user_exclusion: self.user_exclusion.clone(),
        }
    }
}

/// Runs one binary's declared suite to completion, resuming after crashes.
#[derive(Debug)]
pub struct SuiteRunner {
    binary: Utf8PathBuf,
    workdir: Utf8PathBuf,
    timeout: Option<Duration>,
    user_exclusion: Option<String>,
}

impl SuiteRunner {
    /// Executes the run to completion, echoing attempt output and resumption
    /// notices through `reporter`.
    ///
    /// Recoverable conditions (failing tests, mid-suite crashes) are folded
    /// into the returned [`RunResults`]; an `Err` always means the run was
    /// aborted.
    pub fn execute<W: io::Write>(
        self,
        reporter: &mut SuiteReporter<W>,
    ) -> Result<RunResults, RunAbortedError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|error| RunAbortedError::RuntimeCreate { error })?;
        runtime.block_on(self.execute_impl(reporter))
    }

    async fn execute_impl<W: io::Write>(
        self,
        reporter: &mut SuiteReporter<W>,
    ) -> Result<RunResults, RunAbortedError> {
        let started_at = Instant::now();
        let mut filter = test_filter::initial_filter(self.user_exclusion.as_deref());

        // Listing pass. No timeout: listing does not execute any test, and
        // its output is not echoed. The listing carries the user exclusion,
        // so the declared list only contains cases that can actually run;
        // in particular its final element is reachable.
        let list_cmd = TestCommand::for_listing(&self.binary, filter.as_deref());
        tracing::debug!("listing tests: {}", list_cmd.command_line());
        let listing = executor::execute(&list_cmd, None, &self.workdir).await?;
        let all_tests = TestList::parse(listing.output(), list_cmd.command_line())?;
        tracing::debug!("{} declared test cases", all_tests.len());

        let mut failing = IndexSet::new();
        let mut terminating = Vec::new();
        let mut previous_index: Option<usize> = None;
        let mut attempts = 0;

        loop {
            let cmd = TestCommand::for_run(&self.binary, filter.as_deref());
            attempts += 1;
            tracing::debug!("attempt {}: {}", attempts, cmd.command_line());

            let attempt = match executor::execute(&cmd, self.timeout, &self.workdir).await {
                Ok(attempt) => attempt,
                Err(ExecuteError::Timeout {
                    command,
                    period,
                    output,
                }) => {
                    // Show what the binary managed to print before it was
                    // killed, then abort the whole run.
                    reporter
                        .attempt_output(&output)
                        .map_err(|error| RunAbortedError::WriteOutput { error })?;
                    return Err(RunAbortedError::Timeout { command, period });
                }
                Err(error) => return Err(RunAbortedError::Execute { error }),
            };
            reporter
                .attempt_output(attempt.output())
                .map_err(|error| RunAbortedError::WriteOutput { error })?;

            failing.extend(attempt.failed_tests());

            let Some(last_ran) = attempt.last_started_test() else {
                return Err(RunAbortedError::NothingExecuted { attempt: attempts });
            };

            if Some(&last_ran) == all_tests.last() {
                // The final declared case started; the suite is exhausted.
                // An abnormal exit here means that very case killed the
                // binary without reporting a verdict.
                if attempt.crashed_before_next_test() {
                    terminating.push(last_ran);
                }
                break;
            }

            let index = all_tests
                .position(&last_ran)
                .ok_or_else(|| UnknownTestError {
                    test: last_ran.clone(),
                })?;
            if previous_index.is_some_and(|previous| index <= previous) {
                return Err(RunAbortedError::NoForwardProgress { test: last_ran });
            }
            previous_index = Some(index);

            reporter
                .resumption(&last_ran, &self.binary)
                .map_err(|error| RunAbortedError::WriteOutput { error })?;
            terminating.push(last_ran.clone());

            // The dead attempt may have left the directory in any state.
            // Clearing it happens before the filter is built so that a
            // filter error can never leak a corrupt directory into a
            // subsequent invocation.
            clear_workdir(&self.workdir).await?;

            filter = Some(test_filter::resume_filter(
                &last_ran,
                &all_tests,
                self.user_exclusion.as_deref(),
            )?);
        }

        Ok(RunResults {
            binary: self.binary,
            declared: all_tests.len(),
            failing,
            terminating,
            attempts,
            elapsed: started_at.elapsed(),
        })
    }
}

async fn clear_workdir(workdir: &Utf8Path) -> Result<(), RunAbortedError> {
    match tokio::fs::remove_dir_all(workdir).await {
        Ok(()) => Ok(()),
        // The binary may not have created it at all.
        Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(error) => Err(RunAbortedError::WorkdirCleanup {
            workdir: workdir.to_owned(),
            error,
        }),
    }
}

/// The accumulated outcome of a completed run.
#[derive(Debug)]
pub struct RunResults {
    /// The binary that was run.
    pub binary: Utf8PathBuf,
    /// Number of declared test cases.
    pub declared: usize,
    /// Tests reported as failed, in first-seen order, coalesced across
    /// attempts.
    pub failing: IndexSet<TestCaseName>,
    /// Tests whose execution terminated the binary, one entry per recovered
    /// crash, in crash order.
    pub terminating: Vec<TestCaseName>,
    /// Number of execution attempts, including the first.
    pub attempts: usize,
    /// Wall-clock time for the whole run, listing included.
    pub elapsed: Duration,
}

impl RunResults {
    /// The process exit code summarizing the run: 0 for a fully clean suite,
    /// 1 as soon as anything failed or terminated the binary.
    pub fn exit_code(&self) -> i32 {
        if self.failing.is_empty() && self.terminating.is_empty() {
            0
        } else {
            1
        }
    }
}
