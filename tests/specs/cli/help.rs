//! Help and version specs

use crate::prelude::*;
use predicates::prelude::*;

#[test]
fn help_lists_every_command() {
    mensa()
        .args(&["--help"])
        .command()
        .assert()
        .success()
        .stdout(
            predicate::str::contains("run")
                .and(predicate::str::contains("simulate"))
                .and(predicate::str::contains("config")),
        );
}

#[test]
fn run_help_documents_stop_conditions() {
    mensa()
        .args(&["run", "--help"])
        .passes()
        .stdout_has("--duration")
        .stdout_has("--meals")
        .stdout_has("--event-log");
}

#[test]
fn version_is_printed() {
    mensa()
        .args(&["--version"])
        .passes()
        .stdout_has("mensa");
}

#[test]
fn missing_subcommand_fails() {
    mensa().fails();
}
