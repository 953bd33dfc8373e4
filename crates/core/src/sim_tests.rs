use super::*;
use crate::topology::TopologyKind;
use proptest::prelude::*;
use std::time::Duration;
use yare::parameterized;

fn table(kind: TopologyKind, agents: u32) -> Table {
    let topology = Topology::build(kind, agents).unwrap();
    Table::new(topology, Duration::from_secs(5)).unwrap()
}

fn released_meals(events: &[Event], agent: AgentId) -> Vec<u64> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Released { agent: a, meals } if *a == agent => Some(*meals),
            _ => None,
        })
        .collect()
}

#[test]
fn pair_takes_turns() {
    let mut sim = Simulation::new(table(TopologyKind::Ring, 2));
    let (a0, a1) = (AgentId(0), AgentId(1));

    assert_eq!(sim.step(a0).unwrap(), StepOutcome::BecameHungry);
    assert!(sim.philosophers()[0].is_eating());

    assert_eq!(sim.step(a1).unwrap(), StepOutcome::BecameHungry);
    assert_eq!(sim.philosophers()[1].phase(), Phase::Requesting);
    assert_eq!(sim.in_flight(), 1);

    // Request reaches an eater and waits
    assert_eq!(sim.step(a0).unwrap(), StepOutcome::Delivered);
    assert_eq!(sim.in_flight(), 0);

    assert_eq!(sim.step(a0).unwrap(), StepOutcome::FinishedEating);
    assert_eq!(sim.in_flight(), 1);

    assert_eq!(sim.step(a1).unwrap(), StepOutcome::Delivered);
    assert!(sim.philosophers()[1].is_eating());

    assert_eq!(sim.step(a1).unwrap(), StepOutcome::FinishedEating);
    assert_eq!(sim.meals(), vec![1, 1]);
    assert_eq!(sim.steps(), 6);
    sim.check_invariants().unwrap();
}

#[test]
fn requesting_agent_without_mail_is_idle() {
    let mut sim = Simulation::new(table(TopologyKind::Ring, 3));
    sim.step(AgentId(2)).unwrap();

    assert_eq!(sim.step(AgentId(2)).unwrap(), StepOutcome::Idle);
}

#[test]
fn unknown_agent_is_rejected() {
    let mut sim = Simulation::new(table(TopologyKind::Ring, 3));
    let err = sim.step(AgentId(9)).unwrap_err();
    assert!(matches!(err, SimulationError::UnknownAgent(AgentId(9))));
}

#[parameterized(
    ring_2 = { TopologyKind::Ring, 2 },
    ring_3 = { TopologyKind::Ring, 3 },
    ring_5 = { TopologyKind::Ring, 5 },
    ring_7 = { TopologyKind::Ring, 7 },
    complete_4 = { TopologyKind::Complete, 4 },
)]
fn everyone_eats_under_round_robin(kind: TopologyKind, agents: u32) {
    let mut sim = Simulation::new(table(kind, agents));
    sim.run_round_robin(200).unwrap();

    for (id, meals) in sim.meals().into_iter().enumerate() {
        assert!(meals > 0, "agent {} never ate", id);
    }
}

#[parameterized(
    seed_1 = { 1 },
    seed_42 = { 42 },
    seed_9001 = { 9001 },
)]
fn random_schedule_reaches_meal_limit(seed: u64) {
    let mut sim = Simulation::new(table(TopologyKind::Ring, 5)).with_meal_limit(3);
    sim.run_random(50_000, seed).unwrap();

    assert!(sim.is_sated(), "meals after run: {:?}", sim.meals());
}

#[test]
fn same_seed_replays_identically() {
    let mut first = Simulation::new(table(TopologyKind::Complete, 4));
    let mut second = Simulation::new(table(TopologyKind::Complete, 4));

    first.run_random(500, 7).unwrap();
    second.run_random(500, 7).unwrap();

    assert_eq!(first.events(), second.events());
    assert_eq!(first.meals(), second.meals());
}

#[test]
fn meal_counts_only_go_up() {
    let mut sim = Simulation::new(table(TopologyKind::Ring, 4));
    sim.run_random(2_000, 3).unwrap();

    for agent in 0..4 {
        let meals = released_meals(sim.events(), AgentId(agent));
        assert!(!meals.is_empty());
        assert!(meals.windows(2).all(|w| w[1] == w[0] + 1), "{:?}", meals);
    }
}

#[test]
fn stop_all_settles_every_fork() {
    let mut sim = Simulation::new(table(TopologyKind::Ring, 5));
    sim.run_random(300, 11).unwrap();
    sim.stop_all().unwrap();

    assert_eq!(sim.in_flight(), 0);
    let held: usize = sim.philosophers().iter().map(|p| p.owned_count()).sum();
    assert_eq!(held, 5);
    assert!(sim.philosophers().iter().all(|p| p.phase() == Phase::Stopped));
}

fn topology_kind() -> impl Strategy<Value = TopologyKind> {
    prop_oneof![Just(TopologyKind::Ring), Just(TopologyKind::Complete)]
}

proptest! {
    #[test]
    fn invariants_hold_under_any_schedule(
        kind in topology_kind(),
        agents in 2u32..8,
        seed in any::<u64>(),
    ) {
        let mut sim = Simulation::new(table(kind, agents));
        let outcome = sim.run_random(1_500, seed);
        prop_assert!(outcome.is_ok(), "{:?}", outcome);

        let stopped = sim.stop_all();
        prop_assert!(stopped.is_ok(), "{:?}", stopped);
    }

    #[test]
    fn explicit_schedules_keep_neighbors_apart(
        schedule in prop::collection::vec(0u32..6, 0..600),
    ) {
        let mut sim = Simulation::new(table(TopologyKind::Ring, 6));
        let outcome = sim.run(schedule.into_iter().map(AgentId));
        prop_assert!(outcome.is_ok(), "{:?}", outcome);
    }
}
