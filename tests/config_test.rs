#[path = "common/mod.rs"]
mod common;

use common::ListwinTest;
use listwin::Config;
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

// ============================================================================
// Config command tests
// ============================================================================

#[test]
fn test_config_show_defaults() {
    let listwin = ListwinTest::new();

    let output = listwin.run_success(&["config", "show"]);
    assert!(output.contains("Configuration"));
    assert!(output.contains("base_url"));
    assert!(output.contains("not configured"));
    assert!(output.contains("page_size"));
}

#[test]
fn test_config_show_json() {
    let listwin = ListwinTest::new();

    let json = listwin.run_json(&["config", "show", "--json"]);
    assert_eq!(json["page_size"], "20");
    assert_eq!(json["max_window"], "50");
    assert_eq!(json["throttle_ms"], "300");
    assert_eq!(json["cache_expiry_secs"], "3600");
    assert!(json["base_url"].is_null());
    assert!(json["effective_base_url"].is_null());
    assert!(
        json["config_file"]
            .as_str()
            .unwrap()
            .ends_with("config.yaml")
    );
}

#[test]
fn test_config_set_then_get() {
    let listwin = ListwinTest::new();

    listwin.run_success(&["config", "set", "page_size", "30"]);
    let output = listwin.run_success(&["config", "get", "page_size"]);
    assert_eq!(output.trim(), "30");

    let json = listwin.run_json(&["config", "get", "page_size", "--json"]);
    assert_eq!(json["key"], "page_size");
    assert_eq!(json["value"], "30");
}

#[test]
fn test_config_set_base_url() {
    let listwin = ListwinTest::new();

    let json = listwin.run_json(&[
        "config",
        "set",
        "base_url",
        "http://localhost:8080/api",
        "--json",
    ]);
    assert_eq!(json["action"], "config_set");
    assert_eq!(json["success"], true);

    let output = listwin.run_success(&["config", "show"]);
    assert!(output.contains("http://localhost:8080/api"));
}

#[test]
fn test_config_get_not_set() {
    let listwin = ListwinTest::new();

    let stderr = listwin.run_failure(&["config", "get", "base_url"]);
    assert!(stderr.contains("not set"));
}

#[test]
fn test_config_set_invalid_key() {
    let listwin = ListwinTest::new();

    let stderr = listwin.run_failure(&["config", "set", "invalid.key", "value"]);
    assert!(stderr.contains("unknown config key"));
    assert!(stderr.contains("max_window"));
}

#[test]
fn test_config_set_invalid_values() {
    let listwin = ListwinTest::new();

    let stderr = listwin.run_failure(&["config", "set", "page_size", "lots"]);
    assert!(stderr.contains("invalid value"));

    let stderr = listwin.run_failure(&["config", "set", "max_window", "0"]);
    assert!(stderr.contains("max_window must be at least 1"));

    let stderr = listwin.run_failure(&["config", "set", "base_url", "not a url"]);
    assert!(stderr.contains("invalid URL"));
}

#[test]
fn test_config_file_created() {
    let listwin = ListwinTest::new();

    listwin.run_success(&["config", "set", "max_window", "80"]);

    let config_path = listwin.temp_dir.path().join(".listwin").join("config.yaml");
    assert!(config_path.exists(), "Config file should be created");

    let content = fs::read_to_string(config_path).unwrap();
    assert!(content.contains("max_window: 80"));
    // Existing values survive a set.
    assert!(content.contains("cache_dir:"));
}

#[test]
fn test_invalid_config_file_is_reported() {
    let listwin = ListwinTest::new();
    let config_path = listwin.temp_dir.path().join(".listwin").join("config.yaml");
    fs::write(&config_path, "page_size: 0\n").unwrap();

    let stderr = listwin.run_failure(&["config", "show"]);
    assert!(stderr.contains("page_size must be at least 1"));
}

// ============================================================================
// Config loading (in-process)
// ============================================================================

#[test]
#[serial]
fn test_load_missing_file_is_default() {
    let tmp = TempDir::new().unwrap();
    unsafe { std::env::set_var("LISTWIN_ROOT", tmp.path().join(".listwin")) };

    let config = Config::load().unwrap();
    assert_eq!(config, Config::default());

    unsafe { std::env::remove_var("LISTWIN_ROOT") };
}

#[test]
#[serial]
fn test_save_then_load() {
    let tmp = TempDir::new().unwrap();
    unsafe { std::env::set_var("LISTWIN_ROOT", tmp.path().join("nested").join(".listwin")) };

    let mut config = Config::default();
    config.set("base_url", "https://api.example.com").unwrap();
    config.set("recheck_ms", "450").unwrap();
    config.save().unwrap();

    assert!(Config::config_path().starts_with(tmp.path()));
    let loaded = Config::load().unwrap();
    assert_eq!(loaded, config);
    assert_eq!(
        loaded.engine_options().recheck_delay,
        std::time::Duration::from_millis(450)
    );

    unsafe { std::env::remove_var("LISTWIN_ROOT") };
}

#[test]
#[serial]
fn test_base_url_env_overrides_file() {
    let mut config = Config::default();
    config.set("base_url", "https://file.example.com").unwrap();

    unsafe { std::env::set_var("LISTWIN_BASE_URL", "https://env.example.com") };
    assert_eq!(config.base_url().as_deref(), Some("https://env.example.com"));

    unsafe { std::env::set_var("LISTWIN_BASE_URL", "") };
    assert_eq!(config.base_url().as_deref(), Some("https://file.example.com"));

    unsafe { std::env::remove_var("LISTWIN_BASE_URL") };
    assert_eq!(config.base_url().as_deref(), Some("https://file.example.com"));
}
