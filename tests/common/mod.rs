//! Helpers for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use feedwatch::domain::item::Item;
use feedwatch::error::{MonitorError, MonitorResult};
use feedwatch::models::config::{FeedConfig, MonitorConfig};
use feedwatch::notify::{NotifyOutcome, NotifyResult, Notifier};
use feedwatch::processing::embedding::Embedder;
use feedwatch::sources::{FetchError, FetchResult, SourceFetcher};

/// Logger keeping every record in memory so tests can assert on warnings.
pub struct CaptureLogger {
    records: Mutex<Vec<(log::Level, String)>>,
}

static LOGGER: CaptureLogger = CaptureLogger {
    records: Mutex::new(Vec::new()),
};

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        self.records
            .lock()
            .expect("log mutex poisoned")
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

impl CaptureLogger {
    /// Installs the capturing logger for this test binary, once.
    pub fn install() -> &'static CaptureLogger {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Trace);
        }
        &LOGGER
    }

    /// Warning messages mentioning `needle`.
    pub fn warnings_mentioning(&self, needle: &str) -> Vec<String> {
        self.records
            .lock()
            .expect("log mutex poisoned")
            .iter()
            .filter(|(level, msg)| *level == log::Level::Warn && msg.contains(needle))
            .map(|(_, msg)| msg.clone())
            .collect()
    }
}

/// Temporary directory holding history and config files for a test.
pub struct TestDir {
    dir: tempfile::TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        TestDir {
            dir: tempfile::tempdir().expect("Failed to create temporary directory."),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, contents).expect("Failed to write test file.");
        path
    }

    pub fn read_history(&self, name: &str) -> Vec<String> {
        let raw = std::fs::read_to_string(self.path(name)).expect("Failed to read history.");
        serde_json::from_str(&raw).expect("History is not a JSON array of strings.")
    }
}

/// Embedder backed by a lookup table; unknown texts map to an axis no topic
/// uses. Every embedded text is recorded.
#[derive(Clone, Default)]
pub struct FakeEmbedder {
    table: HashMap<String, Vec<f32>>,
    pub seen: Arc<Mutex<Vec<String>>>,
}

impl FakeEmbedder {
    pub fn with(entries: &[(&str, [f32; 3])]) -> Self {
        Self {
            table: entries
                .iter()
                .map(|(text, vec)| (text.to_string(), vec.to_vec()))
                .collect(),
            seen: Arc::default(),
        }
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().expect("seen mutex poisoned").clone()
    }
}

impl Embedder for FakeEmbedder {
    fn embed(&mut self, texts: &[String]) -> MonitorResult<Vec<Vec<f32>>> {
        let mut seen = self.seen.lock().expect("seen mutex poisoned");
        texts
            .iter()
            .map(|text| {
                seen.push(text.clone());
                if text == "explode" {
                    return Err(MonitorError::Embedding("model failure".to_string()));
                }
                Ok(self
                    .table
                    .get(text)
                    .cloned()
                    .unwrap_or_else(|| vec![0.0, 0.0, 1.0]))
            })
            .collect()
    }
}

/// Fetcher serving canned items per feed name; feeds without an entry fail.
#[derive(Default)]
pub struct FakeFetcher {
    items: HashMap<String, Vec<Item>>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn with(feed: &str, items: Vec<Item>) -> Self {
        Self::default().and(feed, items)
    }

    pub fn and(mut self, feed: &str, items: Vec<Item>) -> Self {
        self.items.insert(feed.to_string(), items);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls mutex poisoned").clone()
    }
}

#[async_trait]
impl SourceFetcher for FakeFetcher {
    async fn fetch(&self, feed: &FeedConfig) -> FetchResult<Vec<Item>> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(feed.name.clone());
        self.items
            .get(&feed.name)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: feed.url.clone(),
                status: 503,
            })
    }
}

/// Notifier recording every batch it was asked to deliver.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, Vec<Item>)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, Vec<Item>)> {
        self.sent.lock().expect("sent mutex poisoned").clone()
    }

    pub fn sent_titles(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .flat_map(|(_, items)| items.into_iter().map(|i| i.title))
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, items: &[Item], target: &str) -> NotifyResult<NotifyOutcome> {
        self.sent
            .lock()
            .expect("sent mutex poisoned")
            .push((target.to_string(), items.to_vec()));
        Ok(NotifyOutcome {
            delivered: items.len(),
            failed: 0,
        })
    }
}

/// Configuration with the given feeds and topics, threshold 0.4 and channel
/// `chan-1`.
pub fn config(feeds: &[&str], topics: &[&str]) -> MonitorConfig {
    let feeds: Vec<_> = feeds
        .iter()
        .map(|name| serde_json::json!({"name": name, "url": format!("https://{name}.example.com/rss")}))
        .collect();
    let topics: serde_json::Map<_, _> = topics
        .iter()
        .map(|t| (t.to_string(), serde_json::json!(1)))
        .collect();
    let json = serde_json::json!({
        "feeds": feeds,
        "positive_topics": topics,
        "similarity_threshold": 0.4,
        "output": {"discord_channel_id": "chan-1"}
    });
    MonitorConfig::from_json(&json.to_string()).expect("Failed to build test config.")
}
