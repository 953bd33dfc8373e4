//! Live runtime specs

use crate::prelude::*;

#[test]
fn meal_limit_stops_the_table() {
    let temp = Project::empty();
    temp.file("table.toml", FAST_TABLE);

    let result = temp
        .mensa()
        .args(&["run", "--config", "table.toml", "--meals", "3", "--json"])
        .passes();
    let json = result.json();

    assert_eq!(json["stopped"], "sated");
    assert_eq!(json["total_meals"], 9);
    let agents = json["agents"].as_array().unwrap();
    assert_eq!(agents.len(), 3);
    let forks: usize = agents
        .iter()
        .map(|a| a["forks"].as_array().unwrap().len())
        .sum();
    assert_eq!(forks, 3);
}

#[test]
fn duration_stops_the_table_with_a_summary() {
    let temp = Project::empty();
    temp.file("table.toml", FAST_TABLE);

    temp.mensa()
        .args(&[
            "run",
            "--config",
            "table.toml",
            "--agents",
            "4",
            "--duration",
            "200ms",
        ])
        .passes()
        .stdout_has("stopped: duration elapsed")
        .stdout_has("AGENT")
        .stdout_has("every fork accounted for");
}

#[test]
fn event_log_records_every_meal() {
    let temp = Project::empty();
    temp.file("table.toml", FAST_TABLE);

    temp.mensa()
        .args(&[
            "run",
            "--config",
            "table.toml",
            "--meals",
            "2",
            "--event-log",
            "events.jsonl",
        ])
        .passes();

    let log = temp.read("events.jsonl");
    let records: Vec<serde_json::Value> = log
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let eating = records.iter().filter(|r| r["name"] == "agent:eating").count();
    assert_eq!(eating, 6);
    assert!(records
        .windows(2)
        .all(|w| w[0]["sequence"].as_u64() < w[1]["sequence"].as_u64()));
}

#[test]
fn event_log_keeps_only_matching_events() {
    let temp = Project::empty();
    temp.file("table.toml", FAST_TABLE);

    temp.mensa()
        .args(&[
            "run",
            "--config",
            "table.toml",
            "--meals",
            "2",
            "--event-log",
            "events.jsonl",
            "--log-events",
            "agent:eating",
            "--log-events",
            "agent:stopped",
        ])
        .passes();

    let log = temp.read("events.jsonl");
    let names: Vec<String> = log
        .lines()
        .map(|line| {
            let record: serde_json::Value = serde_json::from_str(line).unwrap();
            record["name"].as_str().unwrap().to_string()
        })
        .collect();
    assert_eq!(names.iter().filter(|n| *n == "agent:eating").count(), 6);
    assert_eq!(names.iter().filter(|n| *n == "agent:stopped").count(), 3);
    assert_eq!(names.len(), 9);
}

#[test]
fn log_filter_needs_an_event_log() {
    Project::empty()
        .mensa()
        .args(&["run", "--meals", "1", "--log-events", "fork:*"])
        .fails()
        .stderr_has("--event-log");
}

#[test]
fn slow_neighbor_shows_up_as_starving() {
    let temp = Project::empty();
    temp.file(
        "table.toml",
        r#"
agents = 2
tick_interval = "5ms"
starvation_threshold = "10ms"

[think]
min = "1ms"
max = "1ms"

[eat]
min = "100ms"
max = "100ms"
"#,
    );

    let json = temp
        .mensa()
        .args(&["run", "--config", "table.toml", "--meals", "2", "--json"])
        .passes()
        .json();

    assert_eq!(json["stopped"], "sated");
    let starving = json["starving"].as_object().unwrap();
    assert!(!starving.is_empty());
    assert!(starving.values().all(|count| count.as_u64().unwrap() > 0));
}
