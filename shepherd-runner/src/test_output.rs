// Copyright (c) The gtest-shepherd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Captured output of one execution attempt and the marker-line protocol
//! used to interpret it.
//!
//! Only two line shapes are recognized: a start marker emitted when a test
//! begins, and a failure marker carrying a parenthesized duration suffix.
//! Every other line is opaque and ignored.

use crate::test_list::TestCaseName;
use std::process::ExitStatus;

/// Marker printed when a test case starts executing.
const RUN_MARKER: &str = "[ RUN      ]";

/// Marker printed when a test case fails.
const FAILED_MARKER: &str = "[  FAILED  ]";

/// Combined captured output of a single execution attempt, together with the
/// attempt's exit status.
#[derive(Debug)]
pub struct AttemptOutput {
    output: String,
    exit_status: ExitStatus,
}

impl AttemptOutput {
    pub(crate) fn new(output: String, exit_status: ExitStatus) -> Self {
        Self {
            output,
            exit_status,
        }
    }

    /// The captured output text.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// The attempt's exit status.
    pub fn exit_status(&self) -> ExitStatus {
        self.exit_status
    }

    /// The most recent test observed to have started, or `None` if no test
    /// ever started.
    pub fn last_started_test(&self) -> Option<TestCaseName> {
        last_started_test(&self.output)
    }

    /// Every test reported as failed by a well-formed failure marker, in
    /// output order.
    pub fn failed_tests(&self) -> Vec<TestCaseName> {
        failed_tests(&self.output)
    }

    /// True when the binary died while a test was in flight: the exit status
    /// is abnormal and the most recent marker line is a start marker with no
    /// failure marker after it.
    pub fn crashed_before_next_test(&self) -> bool {
        !self.exit_status.success() && last_marker_is_start(&self.output)
    }
}

/// Scans backwards for the most recent start marker and extracts the case
/// name (the part after the suite qualifier).
fn last_started_test(output: &str) -> Option<TestCaseName> {
    output
        .lines()
        .rev()
        .find_map(|line| marker_payload(line, RUN_MARKER).and_then(case_name))
}

/// Collects the case names from well-formed failure markers.
///
/// A failure line is well-formed only if it ends with the closing paren of
/// its duration suffix. Lines truncated mid-write by a dying process, and
/// the recap lines printed at the end of a run (which carry no duration),
/// are excluded so that a corrupted or duplicated name is never reported.
fn failed_tests(output: &str) -> Vec<TestCaseName> {
    output
        .lines()
        .filter_map(|line| {
            let payload = marker_payload(line, FAILED_MARKER)?.trim();
            if !payload.ends_with(')') {
                return None;
            }
            let (name, _duration) = payload.split_once('(')?;
            let name = name.trim();
            (!name.is_empty()).then(|| TestCaseName::new(name))
        })
        .collect()
}

/// True when the most recent marker line is a start marker. Output with no
/// marker lines at all has no test in flight.
fn last_marker_is_start(output: &str) -> bool {
    output
        .lines()
        .rev()
        .find_map(|line| {
            if line.contains(FAILED_MARKER) {
                Some(false)
            } else if line.contains(RUN_MARKER) {
                Some(true)
            } else {
                None
            }
        })
        .unwrap_or(false)
}

/// Returns the text after `marker`, if the line contains it. The marker may
/// appear mid-line (some environments prefix output with timestamps).
fn marker_payload<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.find(marker).map(|idx| &line[idx + marker.len()..])
}

/// Extracts the case name from a qualified `Suite.case` start payload.
fn case_name(payload: &str) -> Option<TestCaseName> {
    let (_suite, case) = payload.trim().split_once('.')?;
    let case = case.trim();
    (!case.is_empty()).then(|| TestCaseName::new(case))
}
