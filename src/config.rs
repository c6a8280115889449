use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

use crate::theme::ThemeColor;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub scripts: ScriptsConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "walkthrough-sync".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8790,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    /// Path segment the REST API uses for presentation entities
    #[serde(default = "default_entity_path")]
    pub entity_path: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_entity_path() -> String {
    "brdges".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            entity_path: default_entity_path(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeConfig {
    pub nats_url: String,
    /// Subject prefix for room data channels
    pub room_prefix: String,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            nats_url: "nats://localhost:4222".to_string(),
            room_prefix: "room".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    pub slide_debounce_ms: u64,
    pub transcript_debounce_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            slide_debounce_ms: 300,
            transcript_debounce_ms: 300,
        }
    }
}

impl SyncConfig {
    pub fn slide_debounce(&self) -> Duration {
        Duration::from_millis(self.slide_debounce_ms)
    }

    pub fn transcript_debounce(&self) -> Duration {
        Duration::from_millis(self.transcript_debounce_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    pub max_attempts: u32,
    pub interval_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval_ms: 500,
        }
    }
}

impl DiscoveryConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptsConfig {
    /// Quiet period before edited scripts are persisted automatically.
    /// Absent means edits are only saved on an explicit commit.
    pub autosave_ms: Option<u64>,
}

impl ScriptsConfig {
    pub fn autosave(&self) -> Option<Duration> {
        self.autosave_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThemeConfig {
    #[serde(default)]
    pub accent: ThemeColor,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            backend: BackendConfig::default(),
            realtime: RealtimeConfig::default(),
            sync: SyncConfig::default(),
            discovery: DiscoveryConfig::default(),
            scripts: ScriptsConfig::default(),
            theme: ThemeConfig::default(),
        }
    }
}

impl Config {
    /// Load from a config file (extension optional) with `WALKTHROUGH__*` overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("WALKTHROUGH").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
