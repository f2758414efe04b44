// Copyright (c) The gtest-shepherd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests driving the resumption runner against scripted fake
//! Google Test binaries.

#![cfg(unix)]

use camino::{Utf8Path, Utf8PathBuf};
use pretty_assertions::assert_eq;
use shepherd_runner::{
    errors::{CreateTestListError, RunAbortedError},
    reporter::SuiteReporter,
    runner::{RunResults, SuiteRunnerBuilder},
    test_list::TestCaseName,
};
use std::{fs, os::unix::fs::PermissionsExt, time::Duration};

fn write_script(dir: &Utf8Path, body: &str) -> Utf8PathBuf {
    let path = dir.join("fake_gtest");
    fs::write(&path, body).expect("script written");
    let mut perms = fs::metadata(&path).expect("script metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("script made executable");
    path
}

fn run_suite(
    binary: &Utf8Path,
    workdir: &Utf8Path,
    timeout: Option<Duration>,
    user_exclusion: Option<&str>,
) -> (Result<RunResults, RunAbortedError>, String) {
    let mut buf = Vec::new();
    let mut reporter = SuiteReporter::new(&mut buf);
    let mut builder = SuiteRunnerBuilder::default();
    builder
        .set_timeout(timeout)
        .set_user_exclusion(user_exclusion.map(str::to_owned));
    let runner = builder.build(binary.to_owned(), workdir.to_owned());
    let result = runner.execute(&mut reporter);
    (result, String::from_utf8(buf).expect("output is UTF-8"))
}

fn names(cases: &[&str]) -> Vec<TestCaseName> {
    cases.iter().map(|case| TestCaseName::new(case)).collect()
}

#[test]
fn clean_suite_runs_in_one_attempt() {
    let dir = camino_tempfile::tempdir().expect("tempdir created");
    let binary = write_script(
        dir.path(),
        r#"#!/bin/sh
if [ "$1" = "--gtest_list_tests" ]; then
  printf 'Basic.\n  create\n  fill\n  verify\n'
  exit 0
fi
printf '[ RUN      ] Basic.create\n[       OK ] Basic.create (1 ms)\n'
printf '[ RUN      ] Basic.fill\n[       OK ] Basic.fill (2 ms)\n'
printf '[ RUN      ] Basic.verify\n[       OK ] Basic.verify (0 ms)\n'
exit 0
"#,
    );
    let workdir = dir.path().join("scratch");

    let (result, output) = run_suite(&binary, &workdir, None, None);
    let results = result.expect("run completed");

    assert!(results.failing.is_empty(), "failing: {:?}", results.failing);
    assert!(results.terminating.is_empty());
    assert_eq!(results.attempts, 1);
    assert_eq!(results.declared, 3);
    assert_eq!(results.exit_code(), 0);
    assert!(output.contains("[ RUN      ] Basic.verify"));
    assert!(!output.contains("Resuming"), "output: {output}");
}

#[test]
fn crash_resumes_past_the_terminating_case() {
    let dir = camino_tempfile::tempdir().expect("tempdir created");
    let filter_log = dir.path().join("filters.log");
    let binary = write_script(
        dir.path(),
        &format!(
            r#"#!/bin/sh
if [ "$1" = "--gtest_list_tests" ]; then
  printf 'Demo.\n  alpha\n  beta\n  gamma\n'
  exit 0
fi
printf '%s\n' "$1" >> {filter_log}
if [ $# -eq 0 ]; then
  printf '[ RUN      ] Demo.alpha\n[       OK ] Demo.alpha (0 ms)\n'
  printf '[ RUN      ] Demo.beta\n'
  exit 139
fi
printf '[ RUN      ] Demo.gamma\n[       OK ] Demo.gamma (0 ms)\n'
exit 0
"#
        ),
    );
    let workdir = dir.path().join("scratch");
    fs::create_dir_all(workdir.join("leftover")).expect("workdir populated");

    let (result, output) = run_suite(&binary, &workdir, None, None);
    let results = result.expect("run completed");

    assert!(results.failing.is_empty(), "failing: {:?}", results.failing);
    assert_eq!(results.terminating, names(&["beta"]));
    assert_eq!(results.attempts, 2);
    assert_eq!(results.exit_code(), 1);

    // The recovered attempt must exclude everything at or before the crash
    // point, and the corrupt working directory must be gone.
    let filters = fs::read_to_string(&filter_log).expect("filter log read");
    assert_eq!(filters, "\n--gtest_filter=-*.alpha:*.beta\n");
    assert!(!workdir.exists(), "workdir should have been cleared");
    assert!(
        output.contains("Test beta terminated execution of fake_gtest."),
        "output: {output}"
    );
}

#[test]
fn all_failures_in_one_clean_attempt() {
    let dir = camino_tempfile::tempdir().expect("tempdir created");
    let binary = write_script(
        dir.path(),
        r#"#!/bin/sh
if [ "$1" = "--gtest_list_tests" ]; then
  printf 'Fail.\n  one\n  two\n  three\n'
  exit 0
fi
printf '[ RUN      ] Fail.one\n[  FAILED  ] Fail.one (0 ms)\n'
printf '[ RUN      ] Fail.two\n[  FAILED  ] Fail.two (0 ms)\n'
printf '[ RUN      ] Fail.three\n[  FAILED  ] Fail.three (0 ms)\n'
printf '[  FAILED  ] 3 tests, listed below:\n'
printf '[  FAILED  ] Fail.one\n[  FAILED  ] Fail.two\n[  FAILED  ] Fail.three\n'
exit 1
"#,
    );
    let workdir = dir.path().join("scratch");

    let (result, _output) = run_suite(&binary, &workdir, None, None);
    let results = result.expect("run completed");

    // The binary exited on its own after the last declared case, so nothing
    // is terminating; the failures are reported once each despite the recap
    // block repeating them.
    let failing: Vec<_> = results.failing.iter().cloned().collect();
    assert_eq!(failing, names(&["Fail.one", "Fail.two", "Fail.three"]));
    assert!(results.terminating.is_empty());
    assert_eq!(results.attempts, 1);
    assert_eq!(results.exit_code(), 1);
}

#[test]
fn failures_accumulate_across_a_crash() {
    let dir = camino_tempfile::tempdir().expect("tempdir created");
    let binary = write_script(
        dir.path(),
        r#"#!/bin/sh
if [ "$1" = "--gtest_list_tests" ]; then
  printf 'Mix.\n  a\n  b\n  c\n  d\n'
  exit 0
fi
if [ $# -eq 0 ]; then
  printf '[ RUN      ] Mix.a\n[  FAILED  ] Mix.a (5 ms)\n'
  printf '[ RUN      ] Mix.b\n'
  exit 134
fi
printf '[ RUN      ] Mix.c\n[  FAILED  ] Mix.c (1 ms)\n'
printf '[ RUN      ] Mix.d\n[       OK ] Mix.d (0 ms)\n'
printf '[  FAILED  ] 1 test, listed below:\n[  FAILED  ] Mix.c\n'
exit 1
"#,
    );
    let workdir = dir.path().join("scratch");

    let (result, _output) = run_suite(&binary, &workdir, None, None);
    let results = result.expect("run completed");

    let failing: Vec<_> = results.failing.iter().cloned().collect();
    assert_eq!(failing, names(&["Mix.a", "Mix.c"]));
    assert_eq!(results.terminating, names(&["b"]));
    assert_eq!(results.attempts, 2);
    assert_eq!(results.exit_code(), 1);
}

#[test]
fn crash_on_the_final_case_is_recorded() {
    let dir = camino_tempfile::tempdir().expect("tempdir created");
    let binary = write_script(
        dir.path(),
        r#"#!/bin/sh
if [ "$1" = "--gtest_list_tests" ]; then
  printf 'Tail.\n  first\n  last\n'
  exit 0
fi
printf '[ RUN      ] Tail.first\n[       OK ] Tail.first (0 ms)\n'
printf '[ RUN      ] Tail.last\n'
exit 139
"#,
    );
    let workdir = dir.path().join("scratch");

    let (result, _output) = run_suite(&binary, &workdir, None, None);
    let results = result.expect("run completed");

    // The final declared case started, so the suite is exhausted: no
    // resumption, but the in-flight case is recorded as terminating.
    assert_eq!(results.attempts, 1);
    assert_eq!(results.terminating, names(&["last"]));
    assert!(results.failing.is_empty());
    assert_eq!(results.exit_code(), 1);
}

#[test]
fn user_exclusion_applies_to_every_attempt() {
    let dir = camino_tempfile::tempdir().expect("tempdir created");
    let filter_log = dir.path().join("filters.log");
    let binary = write_script(
        dir.path(),
        &format!(
            r#"#!/bin/sh
case "$*" in
*--gtest_list_tests*)
  # The listing respects the exclusion filter, like a real gtest binary.
  printf 'Excl.\n  one\n  two\n  three\n'
  exit 0
  ;;
esac
printf '%s\n' "$1" >> {filter_log}
case "$1" in
*-\*.one:\*.two*)
  printf '[ RUN      ] Excl.three\n[       OK ] Excl.three (0 ms)\n'
  exit 0
  ;;
*)
  printf '[ RUN      ] Excl.one\n[       OK ] Excl.one (0 ms)\n'
  printf '[ RUN      ] Excl.two\n'
  exit 139
  ;;
esac
"#
        ),
    );
    let workdir = dir.path().join("scratch");

    let (result, _output) = run_suite(&binary, &workdir, None, Some("*.skipme"));
    let results = result.expect("run completed");

    assert_eq!(results.terminating, names(&["two"]));
    assert_eq!(results.exit_code(), 1);

    let filters = fs::read_to_string(&filter_log).expect("filter log read");
    assert_eq!(
        filters,
        "--gtest_filter=-*.skipme\n--gtest_filter=-*.one:*.two:*.skipme\n"
    );
}

#[test]
fn empty_listing_aborts_before_any_attempt() {
    let dir = camino_tempfile::tempdir().expect("tempdir created");
    let ran_log = dir.path().join("ran.log");
    let binary = write_script(
        dir.path(),
        &format!(
            r#"#!/bin/sh
if [ "$1" = "--gtest_list_tests" ]; then
  exit 0
fi
printf 'ran\n' >> {ran_log}
exit 0
"#
        ),
    );
    let workdir = dir.path().join("scratch");

    let (result, output) = run_suite(&binary, &workdir, None, None);
    let err = result.expect_err("empty suite aborts");

    assert!(matches!(
        err,
        RunAbortedError::ListTests {
            error: CreateTestListError::EmptySuite { .. }
        }
    ));
    assert!(!ran_log.exists(), "no execution attempt should have run");
    assert_eq!(output, "");
}

#[test]
fn timeout_kills_the_attempt_and_removes_the_workdir() {
    let dir = camino_tempfile::tempdir().expect("tempdir created");
    let binary = write_script(
        dir.path(),
        r#"#!/bin/sh
if [ "$1" = "--gtest_list_tests" ]; then
  printf 'Slow.\n  hang\n'
  exit 0
fi
printf '[ RUN      ] Slow.hang\n'
exec sleep 30
"#,
    );
    let workdir = dir.path().join("scratch");
    fs::create_dir_all(workdir.join("partial")).expect("workdir populated");

    let (result, _output) =
        run_suite(&binary, &workdir, Some(Duration::from_millis(300)), None);
    let err = result.expect_err("timeout aborts");

    assert!(
        matches!(err, RunAbortedError::Timeout { .. }),
        "unexpected error: {err:?}"
    );
    assert!(!workdir.exists(), "workdir should have been force-removed");
}

#[test]
fn silent_attempt_is_fatal() {
    let dir = camino_tempfile::tempdir().expect("tempdir created");
    let binary = write_script(
        dir.path(),
        r#"#!/bin/sh
if [ "$1" = "--gtest_list_tests" ]; then
  printf 'Quiet.\n  one\n'
  exit 0
fi
printf 'setup crashed before any test\n'
exit 127
"#,
    );
    let workdir = dir.path().join("scratch");

    let (result, _output) = run_suite(&binary, &workdir, None, None);
    let err = result.expect_err("silent attempt aborts");
    assert!(matches!(
        err,
        RunAbortedError::NothingExecuted { attempt: 1 }
    ));
}
