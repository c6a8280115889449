use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persona and knowledge the server-side conversational agent runs with
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub personality: String,
    #[serde(default)]
    pub agent_personality: Persona,
    #[serde(default)]
    pub knowledge_base: Vec<KnowledgeEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub expertise: Vec<String>,
    #[serde(default)]
    pub knowledge_areas: Vec<String>,
    #[serde(default)]
    pub background: String,
    /// Situation (greeting, clarification, ...) → template text
    #[serde(default)]
    pub response_templates: BTreeMap<String, String>,
    #[serde(default)]
    pub communication_style: String,
    #[serde(default)]
    pub voice_characteristics: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub content: String,
}

impl KnowledgeEntry {
    pub fn new(kind: impl Into<String>, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: format!("kb_{}", uuid::Uuid::new_v4().simple()),
            kind: kind.into(),
            name: name.into(),
            content: content.into(),
        }
    }
}
