use std::fs;

use maze_q_learning::observers::NoopObserver;
use maze_q_learning::{AgentConfig, ConfigFile, Error, Maze, QAgent};
use tempfile::tempdir;

#[test]
fn shipped_config_matches_defaults() {
    let file = ConfigFile::load(concat!(env!("CARGO_MANIFEST_DIR"), "/config.json")).unwrap();
    assert_eq!(file.agent("QAGENT").unwrap(), AgentConfig::default());
}

#[test]
fn loads_config_from_disk() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("config.json");
    let mut file = ConfigFile::default();
    let mut config = AgentConfig::default();
    config.discount_factor = 0.9;
    file.insert("QAGENT", config);
    fs::write(&path, serde_json::to_string_pretty(&file).unwrap()).unwrap();

    let loaded = ConfigFile::load(&path).unwrap();
    assert_eq!(loaded.agent("QAGENT").unwrap().discount_factor, 0.9);
}

#[test]
fn missing_file_is_an_io_error() {
    let tmp = tempdir().unwrap();
    let err = ConfigFile::load(tmp.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[test]
fn training_history_is_exported() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("history.csv");
    let maze: Maze = "####\n#SG#\n####".parse().unwrap();
    let mut agent = QAgent::with_seed("QAGENT", maze, AgentConfig::default(), Some(5)).unwrap();
    let report = agent.train(4, 10_000, &mut NoopObserver).unwrap();
    report.write_csv(&path).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines[0], "episode,exploration_rate,turns,wall_hits,explored");
    assert_eq!(lines.len(), 5);
    assert!(lines[1].starts_with("0,0.8,"));
}
