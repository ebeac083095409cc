//! Configuration model loaded from external sources.

use std::collections::BTreeMap;
use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

use crate::error::{MonitorError, MonitorResult};
use crate::{DEFAULT_MODEL_NAME, DEFAULT_SIMILARITY_THRESHOLD};

/// Prefix for environment overrides, e.g. `FEEDWATCH__SIMILARITY_THRESHOLD`.
const ENV_PREFIX: &str = "FEEDWATCH";

#[derive(Clone, Debug, Deserialize)]
/// Settings for a single monitoring run.
pub struct MonitorConfig {
    pub feeds: Vec<FeedConfig>,
    /// Topic labels are the keys; values are kept for compatibility and ignored.
    #[serde(default)]
    pub positive_topics: BTreeMap<String, IgnoredAny>,
    #[serde(default = "default_threshold")]
    pub similarity_threshold: f32,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Rss,
    Html,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub kind: Option<SourceKind>,
    #[serde(default)]
    pub item_selector: Option<String>,
    #[serde(default)]
    pub title_selector: Option<String>,
    #[serde(default)]
    pub link_selector: Option<String>,
}

impl FeedConfig {
    /// Kind of adapter used for this feed.
    ///
    /// Falls back to HTML scraping for known deal-listing sites and to
    /// syndication parsing for everything else.
    pub fn source_kind(&self) -> SourceKind {
        match self.kind {
            Some(kind) => kind,
            None if self.url.to_lowercase().contains("dealmoon") => SourceKind::Html,
            None => SourceKind::Rss,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    #[default]
    Command,
    Discord,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default, deserialize_with = "deserialize_channel_id")]
    pub discord_channel_id: Option<String>,
    #[serde(default)]
    pub transport: Transport,
    /// Program invoked by the command transport.
    #[serde(default)]
    pub command: Option<String>,
}

impl OutputConfig {
    /// Channel identifier, if one is configured and not blank.
    pub fn target(&self) -> Option<&str> {
        self.discord_channel_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Channel ids are accepted both as strings and as bare numbers.
fn deserialize_channel_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    }))
}

fn default_threshold() -> f32 {
    DEFAULT_SIMILARITY_THRESHOLD
}

fn default_model_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

impl MonitorConfig {
    /// Loads the JSON configuration at `path`, layered with environment
    /// overrides.
    pub fn load(path: impl AsRef<Path>) -> MonitorResult<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Json).required(true))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                MonitorError::Configuration(format!("cannot read {}: {e}", path.display()))
            })?;

        let config: Self = settings.try_deserialize().map_err(|e| {
            MonitorError::Configuration(format!("invalid configuration in {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a JSON string without consulting the
    /// environment.
    pub fn from_json(json: &str) -> MonitorResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| MonitorError::Configuration(format!("invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> MonitorResult<()> {
        if !self.similarity_threshold.is_finite() {
            return Err(MonitorError::Configuration(
                "similarity_threshold must be a finite number".to_string(),
            ));
        }
        if self.model_name.trim().is_empty() {
            return Err(MonitorError::Configuration(
                "model_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Configured topic labels in a stable order.
    pub fn topics(&self) -> Vec<String> {
        self.positive_topics.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{MonitorConfig, SourceKind, Transport};
    use crate::error::MonitorError;

    #[test]
    fn defaults_apply_for_optional_fields() {
        let config = MonitorConfig::from_json(
            r#"{"feeds": [{"name": "news", "url": "https://example.com/rss"}]}"#,
        )
        .expect("valid config");

        assert!(config.topics().is_empty());
        assert_eq!(config.similarity_threshold, 0.4);
        assert_eq!(config.model_name, "paraphrase-multilingual-MiniLM-L12-v2");
        assert_eq!(config.output.transport, Transport::Command);
        assert_eq!(config.output.target(), None);
    }

    #[test]
    fn topic_values_are_ignored() {
        let config = MonitorConfig::from_json(
            r#"{
                "feeds": [],
                "positive_topics": {"laptop deals": 1, "rust jobs": {"weight": 2}, "gpu": null},
                "output": {"discord_channel_id": "12345"}
            }"#,
        )
        .expect("valid config");

        assert_eq!(config.topics(), vec!["gpu", "laptop deals", "rust jobs"]);
        assert_eq!(config.output.target(), Some("12345"));
    }

    #[test]
    fn missing_feeds_is_a_configuration_error() {
        let result = MonitorConfig::from_json(r#"{"positive_topics": {"a": 1}}"#);

        assert!(matches!(result, Err(MonitorError::Configuration(_))));
    }

    #[test]
    fn numeric_channel_id_is_accepted() {
        let config = MonitorConfig::from_json(
            r#"{"feeds": [], "output": {"discord_channel_id": 1234567890123}}"#,
        )
        .expect("valid config");

        assert_eq!(config.output.target(), Some("1234567890123"));
    }

    #[test]
    fn blank_channel_is_no_target() {
        let config = MonitorConfig::from_json(
            r#"{"feeds": [], "output": {"discord_channel_id": "   "}}"#,
        )
        .expect("valid config");

        assert_eq!(config.output.target(), None);
    }

    #[test]
    fn source_kind_is_inferred_from_url() {
        let config = MonitorConfig::from_json(
            r#"{"feeds": [
                {"name": "deals", "url": "https://www.DealMoon.com/en"},
                {"name": "blog", "url": "https://blog.example.com/feed.xml"},
                {"name": "forced", "url": "https://www.dealmoon.com/rss", "kind": "rss"}
            ]}"#,
        )
        .expect("valid config");

        let kinds: Vec<_> = config.feeds.iter().map(|f| f.source_kind()).collect();
        assert_eq!(kinds, vec![SourceKind::Html, SourceKind::Rss, SourceKind::Rss]);
    }
}
