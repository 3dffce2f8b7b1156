//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use mock_apollo::config::ServerConfig;
use mock_apollo::lifecycle::{self, Application};
use mock_apollo::observability::logging;

pub const STUB: &str = "\
app:
  cluster:
    ns:
      releaseKey: abc
      configurations:
        mysql: mysql://root@localhost/mysql
";

/// Write a snapshot file and return its path.
pub fn write_snapshot(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// A running service on ephemeral ports.
pub struct TestApp {
    pub app: Application,
    pub base_url: String,
    pub admin_url: String,
    pub client: reqwest::Client,
    _subscriber: Box<dyn tracing::Subscriber + Send + Sync>,
}

pub async fn start_app(paths: Vec<PathBuf>, poll_timeout_secs: u64) -> TestApp {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.admin.bind_address = "127.0.0.1:0".to_string();
    config.watch.paths = paths;
    config.poll.timeout_secs = poll_timeout_secs;

    let (subscriber, log_level) = logging::build(&config.observability).unwrap();
    let app = lifecycle::start(config, log_level).await.unwrap();
    let base_url = format!("http://{}", app.http_addr());
    let admin_url = format!("http://{}", app.admin_addr().unwrap());

    TestApp {
        app,
        base_url,
        admin_url,
        client: reqwest::Client::new(),
        _subscriber: Box::new(subscriber),
    }
}

impl TestApp {
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap()
    }

    /// Wait until `count` polls are registered.
    pub async fn wait_for_polls(&self, count: usize) {
        let coordinator = self.app.coordinator();
        tokio::time::timeout(Duration::from_secs(5), async {
            while coordinator.outstanding_polls() != count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    pub async fn stop(self) {
        self.app.shutdown();
        self.app.wait().await.unwrap();
    }
}

/// `notifications` query value for the given namespaces.
pub fn notifications(namespaces: &[&str]) -> String {
    let entries: Vec<_> = namespaces
        .iter()
        .enumerate()
        .map(|(i, ns)| serde_json::json!({ "notificationId": i, "namespaceName": ns }))
        .collect();
    serde_json::to_string(&entries).unwrap()
}
