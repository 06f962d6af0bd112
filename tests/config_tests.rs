use std::path::PathBuf;

use annwire::config::Config;
use annwire::error::{ClientError, ErrorKind};
use annwire::types::LoadMode;

#[test]
fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.connection.socket_path, PathBuf::from("/tmp/jvector.sock"));
    assert_eq!(config.connection.poll_interval_ms, 1000);
    assert!(config.connection.connect_timeout().is_none());
    assert_eq!(config.loading.mode, LoadMode::Bulk);
    assert_eq!(config.loading.write_batch_size, 1000);
    assert_eq!(config.loading.bulk_file_path, PathBuf::from("/tmp/data.bin"));
    assert_eq!(config.logging.level, "info");
    assert!(config.validate().is_ok());
}

#[test]
fn test_from_toml_partial() {
    let config = Config::from_toml(
        r#"
        [connection]
        socket_path = "/run/ann/server.sock"
        connect_timeout_secs = 30

        [loading]
        mode = "incremental"
        write_batch_size = 250
        "#,
    )
    .unwrap();

    assert_eq!(config.connection.socket_path, PathBuf::from("/run/ann/server.sock"));
    assert_eq!(
        config.connection.connect_timeout(),
        Some(std::time::Duration::from_secs(30))
    );
    assert_eq!(config.connection.poll_interval_ms, 1000);
    assert_eq!(config.loading.mode, LoadMode::Incremental);
    assert_eq!(config.loading.write_batch_size, 250);
    assert_eq!(config.loading.bulk_file_path, PathBuf::from("/tmp/data.bin"));
    assert_eq!(config.logging.format, "text");
}

#[test]
fn test_invalid_toml() {
    let err = Config::from_toml("[loading]\nmode = \"sideways\"\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
}

#[test]
fn test_validate() {
    let mut config = Config::default();
    config.loading.write_batch_size = 0;
    assert!(matches!(config.validate(), Err(ClientError::Config(_))));

    let mut config = Config::default();
    config.connection.poll_interval_ms = 0;
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.logging.format = "xml".into();
    assert!(config.validate().is_err());
}

// The only test in this binary that touches the process environment.
#[test]
fn test_load_file_and_env_overrides() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = dir.path().join("annwire.toml");
    std::fs::write(
        &file,
        "[connection]\nsocket_path = \"/from/file.sock\"\n\n[logging]\nlevel = \"debug\"\n",
    )
    .unwrap();

    let config = Config::load(Some(&file)).unwrap();
    assert_eq!(config.connection.socket_path, PathBuf::from("/from/file.sock"));
    assert_eq!(config.logging.level, "debug");

    std::env::set_var("ANNWIRE_SOCKET_PATH", "/from/env.sock");
    std::env::set_var("ANNWIRE_WRITE_BATCH_SIZE", "64");
    std::env::set_var("ANNWIRE_LOAD_MODE", "incremental");
    let config = Config::load(Some(&file)).unwrap();
    assert_eq!(config.connection.socket_path, PathBuf::from("/from/env.sock"));
    assert_eq!(config.loading.write_batch_size, 64);
    assert_eq!(config.loading.mode, LoadMode::Incremental);

    std::env::set_var("ANNWIRE_WRITE_BATCH_SIZE", "many");
    assert!(matches!(
        Config::load(Some(&file)),
        Err(ClientError::Config(_))
    ));

    std::env::remove_var("ANNWIRE_SOCKET_PATH");
    std::env::remove_var("ANNWIRE_WRITE_BATCH_SIZE");
    std::env::remove_var("ANNWIRE_LOAD_MODE");

    let missing = dir.path().join("missing.toml");
    assert!(matches!(
        Config::load(Some(&missing)),
        Err(ClientError::Config(_))
    ));
}
