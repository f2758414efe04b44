// Copyright (c) The gtest-shepherd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Execution of a single attempt: spawn the binary, capture its output, and
//! enforce the wall-clock ceiling.

use crate::{errors::ExecuteError, test_command::TestCommand, test_output::AttemptOutput};
use camino::Utf8Path;
use std::{io, process::ExitStatus, time::Duration};
use tokio::{
    io::AsyncReadExt,
    process::{Child, ChildStderr, ChildStdout},
};

/// Runs `cmd` to completion, capturing its combined output.
///
/// With a timeout set, the child is killed once the period elapses and the
/// working directory is force-removed, since the killed process may have
/// left it in a partial state. A timeout ends the whole run: it is a ceiling
/// on one attempt, not on one test, so resumption cannot make progress past
/// it.
pub(crate) async fn execute(
    cmd: &TestCommand,
    timeout: Option<Duration>,
    workdir: &Utf8Path,
) -> Result<AttemptOutput, ExecuteError> {
    let mut child = cmd.build().spawn().map_err(|error| ExecuteError::Spawn {
        command: cmd.command_line(),
        error,
    })?;
    let mut stdout = child.stdout.take().expect("child stdout was piped");
    let mut stderr = child.stderr.take().expect("child stderr was piped");

    let mut stdout_buf = Vec::new();
    let mut stderr_buf = Vec::new();

    let status = match timeout {
        Some(period) => {
            let waited = tokio::time::timeout(
                period,
                wait_with_output(
                    &mut child,
                    &mut stdout,
                    &mut stderr,
                    &mut stdout_buf,
                    &mut stderr_buf,
                ),
            )
            .await;
            match waited {
                Ok(result) => result,
                Err(_elapsed) => {
                    if let Err(error) = child.kill().await {
                        tracing::warn!("failed to kill timed-out child: {}", error);
                    }
                    force_remove_workdir(workdir).await;
                    return Err(ExecuteError::Timeout {
                        command: cmd.command_line(),
                        period,
                        output: combine_output(stdout_buf, stderr_buf),
                    });
                }
            }
        }
        None => {
            wait_with_output(
                &mut child,
                &mut stdout,
                &mut stderr,
                &mut stdout_buf,
                &mut stderr_buf,
            )
            .await
        }
    }
    .map_err(|error| ExecuteError::Wait {
        command: cmd.command_line(),
        error,
    })?;

    Ok(AttemptOutput::new(
        combine_output(stdout_buf, stderr_buf),
        status,
    ))
}

/// Drains both output pipes while waiting for the child to exit. The pipes
/// must be drained concurrently with the wait, or a chatty child would block
/// on a full pipe forever.
async fn wait_with_output(
    child: &mut Child,
    stdout: &mut ChildStdout,
    stderr: &mut ChildStderr,
    stdout_buf: &mut Vec<u8>,
    stderr_buf: &mut Vec<u8>,
) -> io::Result<ExitStatus> {
    let (stdout_read, stderr_read, status) = tokio::join!(
        stdout.read_to_end(stdout_buf),
        stderr.read_to_end(stderr_buf),
        child.wait(),
    );
    stdout_read?;
    stderr_read?;
    status
}

/// The combined output text: stdout first (the marker lines are emitted
/// there), then whatever landed on stderr.
fn combine_output(stdout_buf: Vec<u8>, stderr_buf: Vec<u8>) -> String {
    let mut combined = stdout_buf;
    combined.extend_from_slice(&stderr_buf);
    String::from_utf8_lossy(&combined).into_owned()
}

/// Best-effort removal on the timeout path. The run is aborting anyway, so a
/// removal failure is only worth a warning.
async fn force_remove_workdir(workdir: &Utf8Path) {
    match tokio::fs::remove_dir_all(workdir).await {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => {
            tracing::warn!("failed to remove working directory `{}`: {}", workdir, error);
        }
    }
}
