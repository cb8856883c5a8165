use crate::prelude::*;

#[test]
fn help_lists_the_operator_subcommands() {
    cli().args(&["--help"]).passes().stdout_has("Create a queued loop").stdout_has("List every loop");
}

#[test]
fn version_prints_a_version_string() {
    cli().args(&["--version"]).passes().stdout_has("loopctl");
}

#[test]
fn unknown_subcommand_fails_with_a_usage_error() {
    cli().args(&["frobnicate"]).fails().stderr_has("error");
}
