// Copyright (c) The gtest-shepherd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::ExpectedError,
    output::{OutputContext, OutputOpts, OutputWriter},
};
use camino::Utf8PathBuf;
use clap::Parser;
use shepherd_runner::{config::LocalConfig, reporter::SuiteReporter, runner::SuiteRunnerBuilder};
use std::time::Duration;

/// Run a Google Test binary to completion, resuming after crashes and hangs.
///
/// The declared suite is listed once; whenever the binary dies before the
/// last declared test has run, it is relaunched with an exclusion filter
/// covering everything that already ran, and the accumulated failures are
/// reported at the end.
#[derive(Debug, Parser)]
#[command(version, styles = crate::output::clap_styles::style())]
pub struct ShepherdApp {
    #[command(flatten)]
    output: OutputOpts,

    /// Path to the Google Test binary to run
    #[arg(short = 'b', long, value_name = "PATH")]
    gtest_binary: Utf8PathBuf,

    /// Wall-clock ceiling for one execution attempt, in minutes; 0 disables
    /// it. The ceiling is re-armed on every resumption.
    #[arg(long, value_name = "MINUTES", default_value_t = 60)]
    timeout: u64,

    /// Tests to exclude from execution, in gtest filter semantics
    #[arg(short = 'e', long, value_name = "FILTER")]
    exclude: Option<String>,
}

impl ShepherdApp {
    /// Initializes the output context.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the process exit code.
    pub fn exec(
        self,
        output: OutputContext,
        output_writer: &mut OutputWriter,
    ) -> Result<i32, ExpectedError> {
        let Self {
            output: _,
            gtest_binary,
            timeout,
            exclude,
        } = self;

        let config = LocalConfig::discover(&gtest_binary)?;
        let workdir = config.scratch_dir(&gtest_binary);
        tracing::debug!("working directory: {}", workdir);

        let timeout = (timeout != 0).then(|| Duration::from_secs(timeout * 60));

        let mut reporter = SuiteReporter::new(output_writer.stdout_writer());
        if output
            .color
            .should_colorize(supports_color::Stream::Stdout)
        {
            reporter.colorize();
        }

        let mut builder = SuiteRunnerBuilder::default();
        builder.set_timeout(timeout).set_user_exclusion(exclude);
        let runner = builder.build(gtest_binary, workdir);

        let results = runner.execute(&mut reporter)?;
        reporter
            .report_summary(&results)
            .map_err(|err| ExpectedError::WriteOutput { err })?;
        Ok(results.exit_code())
    }
}
