// Copyright (c) The gtest-shepherd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The declared test list, obtained from a listing-mode invocation of the
//! test binary.

use crate::errors::CreateTestListError;
use smol_str::SmolStr;
use std::fmt;

/// The name of one test case within the binary's declared suite.
///
/// Case names are opaque: identity and ordering come from the declared list,
/// not from any structure within the name.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct TestCaseName(SmolStr);

impl TestCaseName {
    /// Creates a new test case name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(SmolStr::new(name.as_ref()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for TestCaseName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TestCaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TestCaseName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// The fixed, ordered list of test cases declared by the binary.
///
/// Obtained once per run, before any execution attempt, and immutable from
/// then on. Order is execution order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestList {
    cases: Vec<TestCaseName>,
}

impl TestList {
    /// Parses listing-mode output into a test list.
    ///
    /// The listing format groups cases under suite header lines that end
    /// with a `.`; each case line may carry a trailing `#` comment (used for
    /// parameterized instances). Header lines are skipped, comments are
    /// stripped, and the bare case names are kept in declared order.
    ///
    /// An empty result is a hard error: there is nothing to run.
    pub fn parse(
        listing_output: &str,
        command: impl Into<String>,
    ) -> Result<Self, CreateTestListError> {
        let cases: Vec<_> = listing_output.lines().filter_map(parse_line).collect();
        if cases.is_empty() {
            return Err(CreateTestListError::EmptySuite {
                command: command.into(),
            });
        }
        Ok(Self { cases })
    }

    /// Iterates over the declared cases in order.
    pub fn cases(&self) -> impl Iterator<Item = &TestCaseName> + '_ {
        self.cases.iter()
    }

    /// The number of declared cases.
    pub fn len(&self) -> usize {
        self.cases.len()
    }

    /// True if no cases are declared. Unreachable through [`parse`], which
    /// rejects empty listings.
    ///
    /// [`parse`]: Self::parse
    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// The final declared case. Execution is complete once this case has
    /// been observed to start and the binary exits.
    pub fn last(&self) -> Option<&TestCaseName> {
        self.cases.last()
    }

    /// The position of `case` in declared order.
    pub fn position(&self, case: &TestCaseName) -> Option<usize> {
        self.cases.iter().position(|c| c == case)
    }
}

fn parse_line(line: &str) -> Option<TestCaseName> {
    let stripped = match line.split_once('#') {
        Some((before, _comment)) => before,
        None => line,
    }
    .trim();
    if stripped.is_empty() || stripped.ends_with('.') {
        return None;
    }
    Some(TestCaseName::new(stripped))
}
