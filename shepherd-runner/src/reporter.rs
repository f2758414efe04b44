// Copyright (c) The gtest-shepherd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reporting: attempt output echo, resumption notices, and the final
//! summary.

use crate::{helpers::plural, runner::RunResults, test_list::TestCaseName};
use camino::Utf8Path;
use owo_colors::{OwoColorize, Style, style};
use std::io;
use swrite::{SWrite, swrite};

/// Renders run progress and the final summary to a writer.
///
/// The reporter is pure presentation: all state lives in the runner and in
/// [`RunResults`].
pub struct SuiteReporter<W> {
    writer: W,
    styles: Styles,
}

impl<W: io::Write> SuiteReporter<W> {
    /// Creates a reporter writing to `writer`, without colors.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            styles: Styles::default(),
        }
    }

    /// Enables colored output.
    pub fn colorize(&mut self) {
        self.styles.colorize();
    }

    /// Echoes the captured output of one attempt, verbatim. Flushed right
    /// away so progress is visible between attempts.
    pub fn attempt_output(&mut self, output: &str) -> io::Result<()> {
        self.writer.write_all(output.as_bytes())?;
        if !output.is_empty() && !output.ends_with('\n') {
            writeln!(self.writer)?;
        }
        self.writer.flush()
    }

    /// Announces that `test` killed the binary and the run is resuming past
    /// it.
    pub fn resumption(&mut self, test: &TestCaseName, binary: &Utf8Path) -> io::Result<()> {
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "Test {} terminated execution of {}. Resuming from the next case.",
            test.style(self.styles.fail),
            display_name(binary).style(self.styles.bold),
        )
    }

    /// Renders the final summary: one status line with counts and elapsed
    /// time, then the failing and terminating identifiers when present.
    pub fn report_summary(&mut self, results: &RunResults) -> io::Result<()> {
        let summary_style = if results.exit_code() == 0 {
            self.styles.pass
        } else {
            self.styles.fail
        };

        let mut summary_str = String::new();
        if !results.failing.is_empty() {
            swrite!(
                summary_str,
                "{} failed",
                results.failing.len().style(self.styles.count)
            );
        }
        if !results.terminating.is_empty() {
            if !summary_str.is_empty() {
                swrite!(summary_str, ", ");
            }
            swrite!(
                summary_str,
                "{} terminated the binary",
                results.terminating.len().style(self.styles.count)
            );
        }
        if summary_str.is_empty() {
            swrite!(summary_str, "{}", "no failures".style(self.styles.pass));
        }

        writeln!(self.writer, "{}", "-".repeat(12))?;
        writeln!(
            self.writer,
            "{:>12} [{:>8.3?}s] {} {} declared, {} {}: {}",
            "Summary".style(summary_style),
            results.elapsed.as_secs_f64(),
            results.declared.style(self.styles.count),
            plural::tests_str(results.declared),
            results.attempts.style(self.styles.count),
            if results.attempts != 1 {
                "attempts"
            } else {
                "attempt"
            },
            summary_str,
        )?;

        if !results.failing.is_empty() {
            writeln!(self.writer)?;
            writeln!(
                self.writer,
                "{} of {} {} from {} failed:",
                results.failing.len().style(self.styles.count),
                results.declared.style(self.styles.count),
                plural::tests_str(results.declared),
                display_name(&results.binary).style(self.styles.bold),
            )?;
            for test in &results.failing {
                writeln!(self.writer, "    {}", test.style(self.styles.fail))?;
            }
        }

        if !results.terminating.is_empty() {
            writeln!(self.writer)?;
            writeln!(
                self.writer,
                "{} {} led to binary termination:",
                results.terminating.len().style(self.styles.count),
                plural::tests_str(results.terminating.len()),
            )?;
            for test in &results.terminating {
                writeln!(self.writer, "    {}", test.style(self.styles.fail))?;
            }
        }

        self.writer.flush()
    }
}

/// The binary's file name, for display. Falls back to the full path when it
/// has no final component.
fn display_name(binary: &Utf8Path) -> &str {
    binary.file_name().unwrap_or_else(|| binary.as_str())
}

#[derive(Clone, Copy, Debug, Default)]
struct Styles {
    pass: Style,
    fail: Style,
    count: Style,
    bold: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.pass = style().green().bold();
        self.fail = style().red().bold();
        self.count = style().bold();
        self.bold = style().bold();
    }
}
