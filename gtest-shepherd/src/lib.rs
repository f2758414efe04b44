// Copyright (c) The gtest-shepherd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Run a Google Test binary to completion, resuming after crashes and hangs.
//!
//! The binary's declared suite is listed once up front. When an execution
//! attempt ends abnormally before the last declared case has run, the case
//! that was in flight is recorded, the suite's working directory is cleared,
//! and the binary is relaunched with an exclusion filter covering everything
//! that already ran. Failing and crash-terminating tests are collected
//! across attempts into a single summary.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::OutputWriter;
