//! Config printing specs

use crate::prelude::*;

#[test]
fn defaults_are_printed_as_toml() {
    mensa()
        .args(&["config"])
        .passes()
        .stdout_has("agents = 5")
        .stdout_has("topology = \"ring\"")
        .stdout_has("starvation_threshold = \"5s\"")
        .stdout_has("[think]")
        .stdout_lacks("meals_per_agent");
}

#[test]
fn flags_override_file_values() {
    let temp = Project::empty();
    temp.file("table.toml", "agents = 8\nmeals_per_agent = 2\n");

    temp.mensa()
        .args(&["config", "--config", "table.toml", "--topology", "complete"])
        .passes()
        .stdout_has("agents = 8")
        .stdout_has("topology = \"complete\"")
        .stdout_has("meals_per_agent = 2");
}

#[test]
fn printed_config_loads_back_unchanged() {
    let temp = Project::empty();
    temp.file("table.toml", crate::prelude::FAST_TABLE);

    let first = temp
        .mensa()
        .args(&["config", "--config", "table.toml"])
        .passes();
    temp.file("again.toml", first.stdout());

    temp.mensa()
        .args(&["config", "--config", "again.toml"])
        .passes()
        .stdout_eq(first.stdout());
}
