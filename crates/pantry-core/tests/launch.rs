use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pantry_common::{LaunchConfig, LaunchSettings};
use pantry_core::{
    CommandInitializer, InitOutcome, Initializer, SchemaInitializer, Server, launch,
};

/// Counts calls and optionally fails or writes the database file.
#[derive(Default)]
struct FakeInitializer {
    calls: AtomicUsize,
    fail: bool,
    create_file: bool,
}

#[async_trait]
impl Initializer for FakeInitializer {
    async fn initialize(&self, config: &LaunchConfig) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("simulated initializer exit status 1");
        }
        if self.create_file {
            std::fs::write(&config.database_path, b"")?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct RecordingServer {
    launched: Mutex<Vec<LaunchConfig>>,
}

impl RecordingServer {
    fn bind_addrs(&self) -> Vec<String> {
        self.launched
            .lock()
            .unwrap()
            .iter()
            .map(LaunchConfig::bind_addr)
            .collect()
    }
}

#[async_trait]
impl Server for RecordingServer {
    async fn serve(&self, config: LaunchConfig) -> anyhow::Result<()> {
        self.launched.lock().unwrap().push(config);
        Ok(())
    }
}

struct FailingServer;

#[async_trait]
impl Server for FailingServer {
    async fn serve(&self, _config: LaunchConfig) -> anyhow::Result<()> {
        anyhow::bail!("address already in use")
    }
}

fn temp_data_dir() -> PathBuf {
    std::env::temp_dir()
        .join(format!("pantry-launch-{}", uuid::Uuid::new_v4()))
        .join("nested")
        .join("data")
}

fn config_for(data_dir: &PathBuf, port: Option<&str>) -> LaunchConfig {
    LaunchSettings {
        data_dir: Some(data_dir.display().to_string()),
        port: port.map(str::to_string),
        ..Default::default()
    }
    .into_config()
    .unwrap()
}

#[tokio::test]
async fn first_run_creates_dir_initializes_once_and_serves_on_default_port() {
    let data_dir = temp_data_dir();
    assert!(!data_dir.exists());
    let initializer = FakeInitializer {
        create_file: true,
        ..Default::default()
    };
    let server = RecordingServer::default();

    let outcome = launch(config_for(&data_dir, None), &initializer, &server)
        .await
        .unwrap();

    assert_eq!(outcome, InitOutcome::Initialized);
    assert!(data_dir.is_dir());
    assert_eq!(initializer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(server.bind_addrs(), vec!["0.0.0.0:5000".to_string()]);
}

#[tokio::test]
async fn second_run_skips_initializer() {
    let data_dir = temp_data_dir();
    let initializer = FakeInitializer {
        create_file: true,
        ..Default::default()
    };
    let server = RecordingServer::default();

    launch(config_for(&data_dir, None), &initializer, &server)
        .await
        .unwrap();
    let outcome = launch(config_for(&data_dir, None), &initializer, &server)
        .await
        .unwrap();

    assert_eq!(outcome, InitOutcome::AlreadyPresent);
    assert_eq!(initializer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(server.launched.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn existing_database_is_left_alone() {
    let data_dir = temp_data_dir();
    std::fs::create_dir_all(&data_dir).unwrap();
    let db_path = data_dir.join("church_pantry.db");
    std::fs::write(&db_path, b"existing").unwrap();

    let initializer = FakeInitializer::default();
    let server = RecordingServer::default();
    let outcome = launch(config_for(&data_dir, None), &initializer, &server)
        .await
        .unwrap();

    assert_eq!(outcome, InitOutcome::AlreadyPresent);
    assert_eq!(initializer.calls.load(Ordering::SeqCst), 0);
    assert_eq!(std::fs::read(&db_path).unwrap(), b"existing");
    let launched = server.launched.lock().unwrap();
    assert_eq!(launched.len(), 1);
    assert_eq!(launched[0].database_path, db_path);
}

#[tokio::test]
async fn failed_initializer_still_launches_server() {
    let data_dir = temp_data_dir();
    let initializer = FakeInitializer {
        fail: true,
        ..Default::default()
    };
    let server = RecordingServer::default();

    let outcome = launch(config_for(&data_dir, None), &initializer, &server)
        .await
        .unwrap();

    match outcome {
        InitOutcome::InitFailed(reason) => assert!(reason.contains("exit status 1")),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(server.launched.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn strict_init_aborts_before_server() {
    let data_dir = temp_data_dir();
    let mut config = config_for(&data_dir, None);
    config.strict_init = true;
    let initializer = FakeInitializer {
        fail: true,
        ..Default::default()
    };
    let server = RecordingServer::default();

    let err = launch(config, &initializer, &server).await.unwrap_err();
    assert!(err.to_string().contains("database initialization failed"));
    assert!(server.launched.lock().unwrap().is_empty());
}

#[tokio::test]
async fn port_override_reaches_server() {
    let data_dir = temp_data_dir();
    let initializer = FakeInitializer::default();
    let server = RecordingServer::default();

    launch(config_for(&data_dir, Some("8080")), &initializer, &server)
        .await
        .unwrap();

    assert_eq!(server.bind_addrs(), vec!["0.0.0.0:8080".to_string()]);
}

#[tokio::test]
async fn server_failure_is_fatal() {
    let data_dir = temp_data_dir();
    let initializer = FakeInitializer::default();

    let err = launch(config_for(&data_dir, None), &initializer, &FailingServer)
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("address already in use"));
}

#[cfg(unix)]
#[tokio::test]
async fn uncreatable_data_dir_is_fatal() {
    let blocker = std::env::temp_dir().join(format!("pantry-file-{}", uuid::Uuid::new_v4()));
    std::fs::write(&blocker, b"not a directory").unwrap();
    let data_dir = blocker.join("data");
    let initializer = FakeInitializer::default();
    let server = RecordingServer::default();

    let err = launch(config_for(&data_dir, None), &initializer, &server)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("create data dir"));
    assert_eq!(initializer.calls.load(Ordering::SeqCst), 0);
    assert!(server.launched.lock().unwrap().is_empty());
}

#[tokio::test]
async fn schema_initializer_creates_database_file() {
    let data_dir = temp_data_dir();
    let server = RecordingServer::default();

    let first = launch(config_for(&data_dir, None), &SchemaInitializer, &server)
        .await
        .unwrap();
    let second = launch(config_for(&data_dir, None), &SchemaInitializer, &server)
        .await
        .unwrap();

    assert_eq!(first, InitOutcome::Initialized);
    assert_eq!(second, InitOutcome::AlreadyPresent);
    assert!(data_dir.join("church_pantry.db").is_file());
}

#[cfg(unix)]
#[tokio::test]
async fn command_initializer_maps_exit_status() {
    let data_dir = temp_data_dir();
    std::fs::create_dir_all(&data_dir).unwrap();
    let config = config_for(&data_dir, None);

    CommandInitializer::new("true")
        .initialize(&config)
        .await
        .unwrap();

    let err = CommandInitializer::new("false")
        .initialize(&config)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("exited with"));

    let err = CommandInitializer::new("/nonexistent/pantry-init")
        .initialize(&config)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("spawn initializer"));
}
