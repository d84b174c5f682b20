// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use clap::Parser;
use yare::parameterized;

#[parameterized(
    separate = { &["gatescan", "-C", "/tmp", "status"] },
    equals = { &["gatescan", "-C=/tmp", "status"] },
    no_space = { &["gatescan", "-C/tmp", "status"] },
    long = { &["gatescan", "--directory", "/tmp", "status"] },
    long_equals = { &["gatescan", "--directory=/tmp", "status"] },
    after_subcommand = { &["gatescan", "status", "-C", "/tmp"] },
)]
fn parse_directory(args: &[&str]) {
    let cli = Cli::try_parse_from(args).unwrap();
    assert_eq!(cli.directory, Some("/tmp".to_string()));
}

#[test]
fn parse_no_directory() {
    let cli = Cli::try_parse_from(["gatescan", "status"]).unwrap();
    assert_eq!(cli.directory, None);
}
