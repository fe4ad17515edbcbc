// Property-based tests for layered configuration loading

use common::config::Settings;
use proptest::prelude::*;
use std::fs;
use tempfile::TempDir;

proptest! {
    /// *For any* values written to default.toml, loading the directory yields
    /// those values and the result validates.
    #[test]
    fn property_file_values_are_loaded(
        reconcile in 1u64..3600u64,
        timeout in 1u64..300u64,
        max_connections in 2u32..50u32,
        log_level in prop::sample::select(vec!["trace", "debug", "info", "warn", "error"])
    ) {
        let temp_dir = TempDir::new().unwrap();
        let config = format!(
            r#"
[database]
url = "postgresql://localhost/prop"
max_connections = {max_connections}
min_connections = 1
connect_timeout_seconds = 5

[scheduler]
reconcile_interval_seconds = {reconcile}

[fetcher]
timeout_seconds = {timeout}

[observability]
log_level = "{log_level}"
"#
        );
        fs::write(temp_dir.path().join("default.toml"), config).unwrap();

        let settings = Settings::load_from_path(temp_dir.path()).unwrap();
        prop_assert_eq!(settings.scheduler.reconcile_interval_seconds, reconcile);
        prop_assert_eq!(settings.fetcher.timeout_seconds, timeout);
        prop_assert_eq!(settings.database.max_connections, max_connections);
        prop_assert_eq!(settings.observability.log_level.as_str(), log_level);
        prop_assert_eq!(settings.fetcher.max_error_body_bytes, 2048);
        prop_assert!(settings.validate().is_ok());
    }
}

#[test]
fn test_local_file_overrides_default_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("default.toml"),
        "[scheduler]\nreconcile_interval_seconds = 30\n",
    )
    .unwrap();
    fs::write(
        temp_dir.path().join("local.toml"),
        "[scheduler]\nreconcile_interval_seconds = 5\n",
    )
    .unwrap();

    let settings = Settings::load_from_path(temp_dir.path()).unwrap();
    assert_eq!(settings.scheduler.reconcile_interval_seconds, 5);
}
