use super::*;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn defaults_without_flags() {
    let config = TableArgs::default().resolve().unwrap();
    assert_eq!(config, TableConfig::default());
}

#[test]
fn flags_override_the_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("table.toml");
    std::fs::write(&path, "agents = 9\ntick_interval = \"2s\"\n").unwrap();

    let args = TableArgs {
        config: Some(path),
        agents: Some(4),
        topology: Some(TopologyKind::Complete),
    };
    let config = args.resolve().unwrap();

    assert_eq!(config.agents, 4);
    assert_eq!(config.topology, TopologyKind::Complete);
    assert_eq!(config.tick_interval, Duration::from_secs(2));
}

#[test]
fn overrides_are_validated() {
    let args = TableArgs {
        agents: Some(1),
        ..TableArgs::default()
    };
    assert!(args.resolve().is_err());
}
