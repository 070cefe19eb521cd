// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    before_subcommand = { &["offtrack", "-C", "/tmp", "list"] },
    with_equals = { &["offtrack", "-C=/tmp", "list"] },
    no_space = { &["offtrack", "-C/tmp", "list"] },
    long_flag = { &["offtrack", "--directory", "/tmp", "list"] },
    after_subcommand = { &["offtrack", "sync", "-C", "/tmp"] },
)]
fn test_directory_flag(args: &[&str]) {
    let cli = Cli::try_parse_from(args).unwrap();
    assert_eq!(cli.directory, Some("/tmp".to_string()));
}

#[test]
fn test_directory_defaults_to_none() {
    let cli = Cli::try_parse_from(["offtrack", "list"]).unwrap();
    assert!(cli.directory.is_none());
}
