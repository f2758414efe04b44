// Copyright (c) The gtest-shepherd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Construction of gtest exclusion filters.
//!
//! A filter value is passed to the binary as `--gtest_filter=<value>`. An
//! exclusion value starts with `-` and lists `:`-separated `*.<case>`
//! patterns; the binary skips every case matching one of them.

use crate::{
    errors::UnknownTestError,
    test_list::{TestCaseName, TestList},
};
use itertools::Itertools;

/// The flag through which filters are passed to the binary.
pub const FILTER_FLAG: &str = "--gtest_filter";

/// The filter value for the first attempt: just the user exclusion, or no
/// filter at all.
pub fn initial_filter(user_exclusion: Option<&str>) -> Option<String> {
    user_exclusion.map(|excluded| format!("-{excluded}"))
}

/// Builds the exclusion filter for a resumed attempt.
///
/// Covers every case at or before `last_ran`'s position in declared order.
/// Position, not failure status, decides coverage: cases that already passed
/// must be excluded too, since the binary cannot skip ahead on its own. The
/// user exclusion, when present, is appended as a suffix so it applies to
/// every attempt.
pub fn resume_filter(
    last_ran: &TestCaseName,
    all_tests: &TestList,
    user_exclusion: Option<&str>,
) -> Result<String, UnknownTestError> {
    let index = all_tests.position(last_ran).ok_or_else(|| UnknownTestError {
        test: last_ran.clone(),
    })?;

    let mut filter = format!(
        "-{}",
        all_tests
            .cases()
            .take(index + 1)
            .map(|case| format!("*.{case}"))
            .join(":")
    );
    if let Some(excluded) = user_exclusion {
        filter.push(':');
        filter.push_str(excluded);
    }
    Ok(filter)
}
