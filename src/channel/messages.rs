use serde::{Deserialize, Serialize};

use crate::agent::AgentConfig;
use crate::session::AgentRole;

/// Data-channel topic carrying slide and script notifications
pub const TOPIC_SLIDE_UPDATES: &str = "slide_updates";
/// Topic the agent uses to signal that a recorded walkthrough is being finalised
pub const TOPIC_WALKTHROUGH_COMPLETED: &str = "walkthrough_completed";
pub const TOPIC_TRANSCRIPT_POSITION: &str = "transcript_position";
pub const TOPIC_AGENT_CONFIG: &str = "agent_config";

/// Every message exchanged over the room data channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Envelope {
    #[serde(rename = "SLIDE_UPDATE")]
    SlideUpdate(SlideUpdate),
    #[serde(rename = "SCRIPTS_UPDATED")]
    ScriptsUpdated(ScriptsUpdated),
    #[serde(rename = "WALKTHROUGH_COMPLETED")]
    WalkthroughCompleted(WalkthroughCompleted),
    #[serde(rename = "TRANSCRIPT_POSITION")]
    TranscriptPosition(TranscriptPositionMessage),
    #[serde(rename = "AGENT_CONFIG")]
    AgentConfig(AgentConfigMessage),
}

impl Envelope {
    /// Wire discriminator
    pub fn kind(&self) -> &'static str {
        match self {
            Envelope::SlideUpdate(_) => "SLIDE_UPDATE",
            Envelope::ScriptsUpdated(_) => "SCRIPTS_UPDATED",
            Envelope::WalkthroughCompleted(_) => "WALKTHROUGH_COMPLETED",
            Envelope::TranscriptPosition(_) => "TRANSCRIPT_POSITION",
            Envelope::AgentConfig(_) => "AGENT_CONFIG",
        }
    }

    /// Topic the envelope is published on
    pub fn topic(&self) -> &'static str {
        match self {
            Envelope::SlideUpdate(_) | Envelope::ScriptsUpdated(_) => TOPIC_SLIDE_UPDATES,
            Envelope::WalkthroughCompleted(_) => TOPIC_WALKTHROUGH_COMPLETED,
            Envelope::TranscriptPosition(_) => TOPIC_TRANSCRIPT_POSITION,
            Envelope::AgentConfig(_) => TOPIC_AGENT_CONFIG,
        }
    }
}

/// Tells the agent which slide the presenter is on and where to fetch it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideUpdate {
    pub brdge_id: String,
    pub num_slides: u32,
    pub api_base_url: String,
    pub current_slide: u32,
    pub slide_url: String,
    pub agent_type: AgentRole,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptsUpdated {
    pub brdge_id: String,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

/// Signal only; any payload fields are ignored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WalkthroughCompleted {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptPositionMessage {
    pub transcript_position: TranscriptPositionBody,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptPositionBody {
    pub read: Vec<String>,
    pub remaining: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfigMessage {
    pub agent_config: AgentConfig,
    pub user_id: Option<String>,
    pub brdge_id: String,
}

/// A raw frame as delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPacket {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl DataPacket {
    pub fn new(topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }
}
