//! Tests for server configuration.

use mancala_server::ServerConfig;

#[test]
fn test_empty_toml_uses_defaults() {
    let config = ServerConfig::from_toml("").expect("Parse failed");
    assert_eq!(config, ServerConfig::default());
    assert_eq!(config.host(), "127.0.0.1");
    assert_eq!(*config.port(), 3000);
    assert_eq!(*config.max_waiting_matches(), 10);
    assert_eq!(*config.leaderboard_size(), 10);
    assert!(config.database().is_none());
    assert!(config.shared_secret().is_none());
}

#[test]
fn test_partial_toml_overrides() {
    let config = ServerConfig::from_toml(
        r#"
        port = 8080
        database = "mancala.db"
        max_waiting_matches = 3
        "#,
    )
    .expect("Parse failed");
    assert_eq!(*config.port(), 8080);
    assert_eq!(config.database().as_deref(), Some("mancala.db"));
    assert_eq!(*config.max_waiting_matches(), 3);
    assert_eq!(config.host(), "127.0.0.1");
}

#[test]
fn test_invalid_toml_fails() {
    let err = ServerConfig::from_toml("port = \"not a number\"").expect_err("Should fail");
    assert!(err.message.contains("Failed to parse config"));
}

#[test]
fn test_from_file() {
    let file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    std::fs::write(file.path(), "leaderboard_size = 25\n").expect("Write failed");

    let config = ServerConfig::from_file(file.path()).expect("Load failed");
    assert_eq!(*config.leaderboard_size(), 25);
}

#[test]
fn test_missing_file_fails() {
    assert!(ServerConfig::from_file("/nonexistent/mancala.toml").is_err());
}
