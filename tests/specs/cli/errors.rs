//! Error reporting specs

use crate::prelude::*;

#[test]
fn single_agent_is_rejected() {
    mensa()
        .args(&["simulate", "--agents", "1"])
        .fails()
        .stderr_has("agents must be at least 2");
}

#[test]
fn unknown_topology_is_rejected() {
    mensa()
        .args(&["simulate", "--topology", "star"])
        .fails()
        .stderr_has("unknown topology");
}

#[test]
fn missing_config_file_is_reported() {
    let temp = Project::empty();
    temp.mensa()
        .args(&["config", "--config", "nope.toml"])
        .fails()
        .stderr_has("nope.toml");
}

#[test]
fn malformed_config_file_is_reported() {
    let temp = Project::empty();
    temp.file("bad.toml", "agents = \"many\"\n");

    temp.mensa()
        .args(&["config", "--config", "bad.toml"])
        .fails()
        .stderr_has("invalid config");
}

#[test]
fn bad_duration_flag_is_rejected() {
    mensa()
        .args(&["run", "--duration", "whenever"])
        .fails()
        .stderr_has("--duration");
}
