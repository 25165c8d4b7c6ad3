#![allow(dead_code)]

use std::fs;
use std::process::{Command, Output};
use std::sync::Arc;
use std::time::Duration;

use listwin::api::MemoryListApi;
use listwin::notify::CollectingNotifier;
use listwin::{EngineOptions, JsonRecord, ListEndpoint, ListEngine, RecordId};
use tempfile::TempDir;

pub type TestEngine = ListEngine<MemoryListApi<JsonRecord>>;

/// Records with ids `ids`, each named `user<id>`.
pub fn records(ids: impl IntoIterator<Item = RecordId>) -> Vec<JsonRecord> {
    ids.into_iter()
        .map(|id| JsonRecord::new(id).with_field("name", format!("user{id}")))
        .collect()
}

pub fn options(page_size: usize, max_window: usize) -> EngineOptions {
    EngineOptions {
        page_size,
        max_window,
        ..EngineOptions::default()
    }
}

/// Engine over an in-memory collection, with a collecting notifier.
pub fn engine_with(
    ids: impl IntoIterator<Item = RecordId>,
    options: EngineOptions,
) -> (Arc<MemoryListApi<JsonRecord>>, Arc<CollectingNotifier>, TestEngine) {
    let api = Arc::new(MemoryListApi::new(records(ids)));
    let notifier = Arc::new(CollectingNotifier::new());
    let engine = ListEngine::with_options(api.clone(), ListEndpoint::new("api/users"), options)
        .with_notifier(notifier.clone());
    (api, notifier, engine)
}

/// Let the throttle interval pass.
pub async fn after_throttle() {
    tokio::time::advance(Duration::from_millis(300)).await;
}

/// Helper struct to run listwin commands in an isolated temp directory
pub struct ListwinTest {
    pub temp_dir: TempDir,
    binary_path: String,
}

impl ListwinTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        // Keep cursor caches inside the temp dir rather than the user cache dir.
        let config_dir = temp_dir.path().join(".listwin");
        fs::create_dir_all(&config_dir).expect("Failed to create config dir");
        fs::write(
            config_dir.join("config.yaml"),
            format!("cache_dir: {}\n", temp_dir.path().join("cache").display()),
        )
        .expect("Failed to write config");

        ListwinTest {
            temp_dir,
            binary_path: env!("CARGO_BIN_EXE_listwin").to_string(),
        }
    }

    /// Write a fixture file into the temp dir and return its path as a string.
    pub fn write_fixture(&self, name: &str, content: &str) -> String {
        let path = self.temp_dir.path().join(name);
        fs::write(&path, content).expect("Failed to write fixture");
        path.to_string_lossy().into_owned()
    }

    /// Fixture with ids `ids`, each named `user<id>`.
    pub fn write_records(&self, name: &str, ids: impl IntoIterator<Item = RecordId>) -> String {
        let json = serde_json::to_string(&records(ids)).expect("Failed to encode records");
        self.write_fixture(name, &json)
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(&self.binary_path)
            .args(args)
            .current_dir(self.temp_dir.path())
            .env_remove("LISTWIN_ROOT")
            .env_remove("LISTWIN_BASE_URL")
            .env("NO_COLOR", "1")
            .output()
            .expect("Failed to execute listwin command")
    }

    pub fn run_success(&self, args: &[&str]) -> String {
        let output = self.run(args);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            !output.status.success(),
            "Command {:?} should have failed\nstdout: {}",
            args,
            String::from_utf8_lossy(&output.stdout)
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }

    pub fn run_json(&self, args: &[&str]) -> serde_json::Value {
        let stdout = self.run_success(args);
        serde_json::from_str(&stdout).expect("Command did not print JSON")
    }
}
