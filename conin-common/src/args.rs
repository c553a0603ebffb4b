// Copyright (C) 2024-2025 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::path::PathBuf;

use anyhow::{anyhow, Result};

pub const DEFAULT_READ_CAPACITY: usize = 64;

#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub config: Option<PathBuf>,
    pub code_page: Option<u32>,
    /// Read code page bytes/records instead of UTF-16.
    pub narrow: bool,
    /// Read input records instead of text.
    pub events: bool,
    /// Feed each input character as a key-down/key-up record pair.
    pub as_keys: bool,
    pub capacity: usize,
    pub help: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config: None,
            code_page: None,
            narrow: false,
            events: false,
            as_keys: false,
            capacity: DEFAULT_READ_CAPACITY,
            help: false,
        }
    }
}

impl Args {
    /// Parse the argument list. The first item is the program name.
    ///
    /// # Errors
    /// Returns an error for unknown flags, missing values, or values that do
    /// not parse.
    pub fn parse<It: Iterator<Item = String>>(mut it: It) -> Result<Self> {
        trace!("Parsing args");

        let _program_name = it.next();
        let mut args = Self::default();

        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--config" => {
                    let value = it
                        .next()
                        .ok_or_else(|| anyhow!("Missing argument for --config"))?;
                    args.config = Some(PathBuf::from(value));
                }
                "--code-page" => {
                    let value = it
                        .next()
                        .ok_or_else(|| anyhow!("Missing argument for --code-page"))?;
                    args.code_page = Some(
                        value
                            .parse()
                            .map_err(|e| anyhow!("Invalid code page {value}: {e}"))?,
                    );
                }
                "--capacity" => {
                    let value = it
                        .next()
                        .ok_or_else(|| anyhow!("Missing argument for --capacity"))?;
                    let capacity: usize = value
                        .parse()
                        .map_err(|e| anyhow!("Invalid capacity {value}: {e}"))?;
                    if capacity == 0 {
                        return Err(anyhow!("--capacity must be at least 1"));
                    }
                    args.capacity = capacity;
                }
                "--narrow" => args.narrow = true,
                "--events" => args.events = true,
                "--as-keys" => args.as_keys = true,
                "--help" => args.help = true,
                _ => return Err(anyhow!("Invalid argument {arg}")),
            }
        }

        Ok(args)
    }

    #[must_use]
    pub fn usage(program_name: &str) -> String {
        format!(
            "\
                 Usage:\n\
                 {program_name} [ARGS]\n\
                 \n\
                 Args:\n\
                 --config: Optional, path to the config file\n\
                 --code-page: Optional, code page for narrow reads (overrides config)\n\
                 --narrow: Optional, read code page bytes instead of UTF-16\n\
                 --events: Optional, read input records instead of text\n\
                 --as-keys: Optional, feed stdin as key events instead of text\n\
                 --capacity: Optional, units requested per read (default {DEFAULT_READ_CAPACITY})\n\
                 --help: Optional, show this help message\n\
                 "
        )
    }
}
