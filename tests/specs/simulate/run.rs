//! Simulation specs

use crate::prelude::*;

#[test]
fn prints_meals_and_invariant_status() {
    mensa()
        .args(&["simulate", "--agents", "5", "--steps", "5000", "--seed", "3"])
        .passes()
        .stdout_has("simulated 5000 steps: 5 agents, ring topology, seed 3")
        .stdout_has("total meals:")
        .stdout_has("invariants held at every step");
}

#[test]
fn same_seed_gives_same_output() {
    let args = ["simulate", "--topology", "complete", "--agents", "4", "--seed", "17"];
    let first = mensa().args(&args).passes();

    mensa().args(&args).passes().stdout_eq(first.stdout());
}

#[test]
fn json_summary_has_one_count_per_agent() {
    let result = mensa()
        .args(&["simulate", "--agents", "6", "--steps", "20000", "--json"])
        .passes();
    let json = result.json();

    let meals = json["meals"].as_array().unwrap();
    assert_eq!(meals.len(), 6);
    assert!(meals.iter().all(|m| m.as_u64().unwrap() > 0), "{}", json);
    assert_eq!(json["steps"], 20000);
}

#[test]
fn meal_limit_ends_the_run_early() {
    let result = mensa()
        .args(&["simulate", "--agents", "3", "--steps", "100000", "--meals", "2", "--json"])
        .passes();
    let json = result.json();

    assert_eq!(json["meals"], serde_json::json!([2, 2, 2]));
    assert!(json["steps"].as_u64().unwrap() < 100000);
}
