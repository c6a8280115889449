//! Conversational agent configuration

mod config;
mod store;

pub use config::{AgentConfig, KnowledgeEntry, Persona};
pub use store::AgentConfigStore;
