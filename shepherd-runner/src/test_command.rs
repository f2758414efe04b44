// Copyright (c) The gtest-shepherd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A to-be-run invocation of the test binary.

use crate::test_filter::FILTER_FLAG;
use camino::{Utf8Path, Utf8PathBuf};
use std::process::Stdio;

/// The flag that switches the binary into listing mode.
const LIST_FLAG: &str = "--gtest_list_tests";

/// Represents one invocation of the test binary with a fixed set of
/// arguments.
#[derive(Clone, Debug)]
pub struct TestCommand {
    program: Utf8PathBuf,
    args: Vec<String>,
}

impl TestCommand {
    /// An invocation that lists the declared tests without running any.
    ///
    /// The listing honors `filter`, so a user exclusion narrows the declared
    /// list itself: an excluded case is not merely skipped, it is never part
    /// of the suite the run is measured against.
    pub fn for_listing(binary: &Utf8Path, filter: Option<&str>) -> Self {
        let mut args = Vec::new();
        if let Some(filter) = filter {
            args.push(format!("{FILTER_FLAG}={filter}"));
        }
        args.push(LIST_FLAG.to_owned());
        Self {
            program: binary.to_owned(),
            args,
        }
    }

    /// An invocation that runs the suite, skipping whatever `filter`
    /// excludes. With no filter the whole declared suite runs.
    pub fn for_run(binary: &Utf8Path, filter: Option<&str>) -> Self {
        let mut args = Vec::new();
        if let Some(filter) = filter {
            args.push(format!("{FILTER_FLAG}={filter}"));
        }
        Self {
            program: binary.to_owned(),
            args,
        }
    }

    /// The human-readable command line, for diagnostics.
    pub fn command_line(&self) -> String {
        let mut line = self.program.to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }

    /// Builds the process command: stdin closed, both output streams piped
    /// for capture.
    pub(crate) fn build(&self) -> tokio::process::Command {
        let mut command = tokio::process::Command::new(self.program.as_str());
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }
}
