// Copyright (C) 2024 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::path::PathBuf;

use conin_common::args::{Args, DEFAULT_READ_CAPACITY};
use test_log::test;

fn args(list: &[&str]) -> anyhow::Result<Args> {
    Args::parse(
        std::iter::once("conin")
            .chain(list.iter().copied())
            .map(ToString::to_string),
    )
}

#[test]
fn test_args_parse() {
    let parsed = args(&[]).unwrap();
    assert_eq!(parsed, Args::default());
    assert_eq!(parsed.capacity, DEFAULT_READ_CAPACITY);

    let parsed = args(&["--config", "test.toml"]).unwrap();
    assert_eq!(parsed.config, Some(PathBuf::from("test.toml")));
    assert_eq!(parsed.code_page, None);

    let parsed = args(&["--code-page", "1252", "--narrow", "--events"]).unwrap();
    assert_eq!(parsed.code_page, Some(1252));
    assert!(parsed.narrow);
    assert!(parsed.events);
    assert!(!parsed.as_keys);

    let parsed = args(&["--as-keys", "--capacity", "3", "--help"]).unwrap();
    assert!(parsed.as_keys);
    assert_eq!(parsed.capacity, 3);
    assert!(parsed.help);
}

#[test]
fn test_invalid_arg() {
    assert!(args(&["--config", "test.toml", "--invalid"]).is_err());
}

#[test]
fn test_missing_values() {
    assert!(args(&["--config"]).is_err());
    assert!(args(&["--code-page"]).is_err());
    assert!(args(&["--capacity"]).is_err());
}

#[test]
fn test_bad_values() {
    assert!(args(&["--code-page", "utf8"]).is_err());
    assert!(args(&["--capacity", "-1"]).is_err());
    assert!(args(&["--capacity", "0"]).is_err());
}

#[test]
fn test_usage_mentions_every_flag() {
    let usage = Args::usage("conin");
    for flag in [
        "--config",
        "--code-page",
        "--narrow",
        "--events",
        "--as-keys",
        "--capacity",
        "--help",
    ] {
        assert!(usage.contains(flag), "usage is missing {flag}");
    }
}
