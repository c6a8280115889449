use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type WalkthroughId = i64;

/// A completed recording session, as listed by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Walkthrough {
    pub id: WalkthroughId,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
}

/// Accepts RFC 3339 as well as naive ISO timestamps (taken as UTC)
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalkthroughListResponse {
    #[serde(default)]
    pub has_walkthroughs: bool,
    #[serde(default)]
    pub walkthroughs: Vec<Walkthrough>,
}

impl WalkthroughListResponse {
    pub fn into_walkthroughs(self) -> Vec<Walkthrough> {
        if self.has_walkthroughs {
            self.walkthroughs
        } else {
            Vec::new()
        }
    }
}

/// Narration for one slide
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub script: String,
    #[serde(default)]
    pub agent: String,
}

impl ScriptEntry {
    pub fn new(script: impl Into<String>, agent: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            agent: agent.into(),
        }
    }
}

/// Slide id → script
pub type ScriptMap = BTreeMap<String, ScriptEntry>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptMetadata {
    #[serde(default)]
    pub source_walkthrough_id: Option<Value>,
    #[serde(default)]
    pub generated_at: Option<String>,
}

impl ScriptMetadata {
    /// The walkthrough the scripts were generated from; the backend sends
    /// it either as a number or as a numeric string
    pub fn source_walkthrough(&self) -> Option<WalkthroughId> {
        match self.source_walkthrough_id.as_ref()? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
        .filter(|id| *id != 0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptsResponse {
    #[serde(default)]
    pub has_scripts: bool,
    #[serde(default)]
    pub scripts: ScriptMap,
    #[serde(default)]
    pub metadata: Option<ScriptMetadata>,
}

/// Scripts currently stored server-side
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScriptsSnapshot {
    pub scripts: ScriptMap,
    pub source_walkthrough: Option<WalkthroughId>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateScriptsResponse {
    #[serde(default)]
    pub scripts: Option<ScriptMap>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceStatus {
    Active,
    #[default]
    Inactive,
}

/// A cloned voice available for agent synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub status: VoiceStatus,
}

impl Voice {
    pub fn is_active(&self) -> bool {
        self.status == VoiceStatus::Active
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VoiceListResponse {
    #[serde(default)]
    pub voices: Vec<Voice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CloneVoiceResponse {
    #[serde(default)]
    pub voice: Option<Voice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityMetadata {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignedUrlResponse {
    pub url: String,
}
