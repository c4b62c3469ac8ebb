//! Layering of files and environment overrides.

use semble_config::{ConfigError, ConfigLoader, LogFormat};
use std::io::Write;

fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn toml_file_fills_missing_keys_with_defaults() {
    let file = write_temp(
        ".toml",
        r#"
            [pipeline]
            continue_on_error = true

            [logging]
            format = "pretty"
        "#,
    );

    let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
    assert!(config.pipeline.continue_on_error);
    assert_eq!(config.pipeline.timeout_ms, 30_000);
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert_eq!(config.events.history_capacity, 1000);
}

#[test]
fn env_overrides_win_over_file_values() {
    let file = write_temp(
        ".json",
        r#"{"pipeline": {"timeout_ms": 1000}, "events": {"history_capacity": 20}}"#,
    );

    let config = ConfigLoader::new()
        .with_file(file.path())
        .unwrap()
        .with_env_vars(
            "SEMBLE",
            [
                ("SEMBLE__PIPELINE__TIMEOUT_MS", "2500"),
                ("SEMBLE__LOGGING__LEVEL", "DEBUG"),
            ],
        )
        .unwrap()
        .load()
        .unwrap();

    assert_eq!(config.pipeline.timeout_ms, 2500);
    assert_eq!(config.events.history_capacity, 20);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn unknown_keys_in_file_are_rejected() {
    let file = write_temp(
        ".toml",
        r"
            [events]
            history_capacity = 10
            max_listeners = 3
        ",
    );

    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::TomlError(_))));
}

#[test]
fn invalid_file_values_fail_on_load() {
    let file = write_temp(".toml", "[events]\nhistory_capacity = 0\n");

    let result = ConfigLoader::new().with_file(file.path()).unwrap().load();
    assert!(matches!(
        result,
        Err(ConfigError::InvalidValue { field, .. }) if field == "events.history_capacity"
    ));
}

#[test]
fn unknown_extension_is_rejected() {
    let file = write_temp(".ini", "[pipeline]\n");
    let result = ConfigLoader::new().with_file(file.path());
    assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
}
