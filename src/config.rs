//! Startup configuration loaded from TOML; every field has a default.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use corridor_content::{OfflineClient, PromptTemplate};
use corridor_grid::SegmentLength;
use corridor_runtime::RuntimeConfig;
use corridor_segment::CorridorDims;
use serde::Deserialize;
use thiserror::Error;

/// Placeholder shipped in sample configs; never a real credential.
const API_KEY_PLACEHOLDER: &str = "your key";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("segment length must be positive and finite, got {0}")]
    Length(f32),
    #[error("corridor needs at least one light station")]
    NoSlots,
    #[error("invalid topic switch {0:?}, expected TICK:TOPIC")]
    Switch(String),
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CorridorConfig {
    #[serde(default)]
    pub corridor: CorridorDims,
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ContentConfig {
    /// Topic shown before any switch.
    #[serde(default)]
    pub topic: String,
    /// Never contact the hosted API, even with a key.
    #[serde(default)]
    pub offline: bool,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub prompts: PromptTemplate,
    #[serde(default)]
    pub text_delay_ms: u64,
    #[serde(default)]
    pub image_delay_ms: u64,
    #[serde(default = "default_swatch_px")]
    pub swatch_px: u32,
    /// Images generated at once per client.
    #[serde(default = "default_image_workers")]
    pub image_workers: usize,
}

fn default_swatch_px() -> u32 {
    8
}

fn default_image_workers() -> usize {
    4
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            topic: String::new(),
            offline: false,
            api_key: None,
            prompts: PromptTemplate::default(),
            text_delay_ms: 0,
            image_delay_ms: 0,
            swatch_px: default_swatch_px(),
            image_workers: default_image_workers(),
        }
    }
}

impl ContentConfig {
    /// The configured key unless it is blank or the sample placeholder.
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && *k != API_KEY_PLACEHOLDER)
    }

    pub fn offline_client(&self) -> OfflineClient {
        OfflineClient::new()
            .with_text_delay(Duration::from_millis(self.text_delay_ms))
            .with_image_delay(Duration::from_millis(self.image_delay_ms))
            .with_swatch_px(self.swatch_px)
            .with_image_workers(self.image_workers)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct StreamConfig {
    /// Ticks to wait before re-fetching after a failed fetch.
    #[serde(default = "default_retry_backoff_ticks")]
    pub retry_backoff_ticks: u64,
    #[serde(default)]
    pub fetch_workers: usize,
    #[serde(default)]
    pub decode_workers: usize,
}

fn default_retry_backoff_ticks() -> u64 {
    120
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            retry_backoff_ticks: default_retry_backoff_ticks(),
            fetch_workers: 0,
            decode_workers: 0,
        }
    }
}

impl StreamConfig {
    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            fetch_workers: self.fetch_workers,
            decode_workers: self.decode_workers,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub start: f64,
    /// Distance walked per tick.
    #[serde(default = "default_speed")]
    pub speed: f64,
    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_speed() -> f64 {
    0.1
}
fn default_fps() -> u32 {
    60
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            start: 0.0,
            speed: default_speed(),
            fps: default_fps(),
        }
    }
}

impl CorridorConfig {
    pub fn segment_length(&self) -> Result<SegmentLength, ConfigError> {
        SegmentLength::new(f64::from(self.corridor.length))
            .ok_or(ConfigError::Length(self.corridor.length))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.segment_length()?;
        if self.corridor.lights == 0 {
            return Err(ConfigError::NoSlots);
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<CorridorConfig, ConfigError> {
    let s = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: CorridorConfig = toml::from_str(&s).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    cfg.validate()?;
    Ok(cfg)
}

/// Topic change scheduled for a given tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicSwitch {
    pub tick: u64,
    pub topic: String,
}

impl FromStr for TopicSwitch {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tick, topic) = s
            .split_once(':')
            .ok_or_else(|| ConfigError::Switch(s.to_string()))?;
        let tick = tick
            .trim()
            .parse()
            .map_err(|_| ConfigError::Switch(s.to_string()))?;
        Ok(TopicSwitch {
            tick,
            topic: topic.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg: CorridorConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.corridor, CorridorDims::default());
        assert_eq!(cfg.stream.retry_backoff_ticks, 120);
        assert_eq!(cfg.viewer.speed, 0.1);
        assert_eq!(cfg.content.prompts, PromptTemplate::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn sample_config_matches_defaults() {
        let cfg: CorridorConfig = toml::from_str(include_str!("../corridor.toml")).unwrap();
        assert_eq!(cfg.corridor, CorridorDims::default());
        assert_eq!(cfg.content.usable_api_key(), None);
        assert_eq!(cfg.content.topic, "forest");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn sections_override_fields() {
        let cfg: CorridorConfig = toml::from_str(
            r#"
            [corridor]
            length = 40.0
            lights = 3

            [content]
            topic = "forest"
            offline = true
            image_delay_ms = 25
            image_workers = 6

            [content.prompts]
            image_suffix = " watercolor"

            [stream]
            retry_backoff_ticks = 30
            fetch_workers = 2

            [viewer]
            speed = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(cfg.corridor.length, 40.0);
        assert_eq!(cfg.corridor.width, 4.0);
        assert_eq!(cfg.content.topic, "forest");
        assert!(cfg.content.offline);
        assert_eq!(cfg.content.image_workers, 6);
        assert_eq!(cfg.content.prompts.image_prompt("a"), "a watercolor");
        assert!(cfg.content.prompts.text.contains("{topic}"));
        assert_eq!(cfg.stream.runtime().fetch_workers, 2);
        assert_eq!(cfg.viewer.speed, 0.5);
        assert_eq!(cfg.viewer.fps, 60);
    }

    #[test]
    fn placeholder_and_blank_keys_are_ignored() {
        let mut content = ContentConfig::default();
        assert_eq!(content.usable_api_key(), None);
        content.api_key = Some("your key".into());
        assert_eq!(content.usable_api_key(), None);
        content.api_key = Some("  ".into());
        assert_eq!(content.usable_api_key(), None);
        content.api_key = Some("sk-123".into());
        assert_eq!(content.usable_api_key(), Some("sk-123"));
    }

    #[test]
    fn bad_dimensions_are_rejected() {
        let cfg: CorridorConfig = toml::from_str("[corridor]\nlength = -1.0").unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::Length(_))));
        let cfg: CorridorConfig = toml::from_str("[corridor]\nlights = 0").unwrap();
        assert!(matches!(cfg.validate(), Err(ConfigError::NoSlots)));
    }

    #[test]
    fn load_config_reports_path_on_errors() {
        let missing = Path::new("/definitely/not/here/corridor.toml");
        let err = load_config(missing).unwrap_err();
        assert!(err.to_string().contains("corridor.toml"));

        let path = std::env::temp_dir().join(format!("corridor-cfg-{}.toml", std::process::id()));
        fs::write(&path, "[viewer]\nspeed = \"fast\"").unwrap();
        let err = load_config(&path).unwrap_err();
        let _ = fs::remove_file(&path);
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn topic_switch_parses_tick_and_topic() {
        assert_eq!(
            "120:deep ocean".parse::<TopicSwitch>().unwrap(),
            TopicSwitch {
                tick: 120,
                topic: "deep ocean".into()
            }
        );
        assert!("ocean".parse::<TopicSwitch>().is_err());
        assert!("x:ocean".parse::<TopicSwitch>().is_err());
    }
}
