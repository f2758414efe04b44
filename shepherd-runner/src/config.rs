// Copyright (c) The gtest-shepherd Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local test configuration, read from an XML file stored next to the test
//! binary.
//!
//! The file names the directory the suite uses as scratch space. The runner
//! clears that directory between attempts, so it must never point at
//! anything shared.

use crate::errors::ConfigReadError;
use camino::{Utf8Path, Utf8PathBuf};
use quick_xml::{Reader, events::Event};

/// Name of the configuration file expected next to the binary.
pub const CONFIG_FILE_NAME: &str = "config.xml";

/// Element holding the scratch root, relative to the document root.
const TEST_DIR_PATH: &str = "localConfiguration/testDir";

/// Local test configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LocalConfig {
    test_dir: Utf8PathBuf,
}

impl LocalConfig {
    /// Reads the configuration from `config.xml` in the directory containing
    /// `binary`.
    pub fn discover(binary: &Utf8Path) -> Result<Self, ConfigReadError> {
        let dir = binary.parent().unwrap_or(Utf8Path::new("."));
        let path = dir.join(CONFIG_FILE_NAME);
        let contents = std::fs::read_to_string(&path).map_err(|error| ConfigReadError::Read {
            path: path.clone(),
            error,
        })?;
        Self::parse(&contents, &path)
    }

    fn parse(contents: &str, path: &Utf8Path) -> Result<Self, ConfigReadError> {
        let mut reader = Reader::from_str(contents);
        let mut stack: Vec<String> = Vec::new();
        let mut test_dir: Option<Utf8PathBuf> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => {
                    stack.push(String::from_utf8_lossy(start.name().as_ref()).into_owned());
                }
                Ok(Event::End(_)) => {
                    stack.pop();
                }
                Ok(Event::Text(text)) if at_test_dir(&stack) => {
                    let value = text.unescape().map_err(|error| ConfigReadError::Parse {
                        path: path.to_owned(),
                        error,
                    })?;
                    let value = value.trim();
                    if !value.is_empty() {
                        test_dir = Some(Utf8PathBuf::from(value));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(error) => {
                    return Err(ConfigReadError::Parse {
                        path: path.to_owned(),
                        error,
                    });
                }
            }
        }

        match test_dir {
            Some(test_dir) => Ok(Self { test_dir }),
            None => Err(ConfigReadError::MissingElement {
                path: path.to_owned(),
                element_path: TEST_DIR_PATH,
            }),
        }
    }

    /// The configured scratch root.
    pub fn test_dir(&self) -> &Utf8Path {
        &self.test_dir
    }

    /// The scratch directory owned by one run of `binary`.
    ///
    /// A subdirectory of the configured root, named after the binary, so
    /// clearing it between attempts can never touch the root itself or the
    /// scratch space of another suite.
    pub fn scratch_dir(&self, binary: &Utf8Path) -> Utf8PathBuf {
        self.test_dir.join(binary.file_stem().unwrap_or("suite"))
    }
}

/// True when the element stack sits at `<root>/localConfiguration/testDir`.
fn at_test_dir(stack: &[String]) -> bool {
    stack.len() == 3 && stack[1] == "localConfiguration" && stack[2] == "testDir"
}
