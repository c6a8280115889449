//! Backend REST API client
//!
//! The backend owns all persisted state (walkthrough records, generated
//! scripts, agent configuration, cloned voices). This module only talks to it.

mod client;
mod models;

pub use client::{HttpBackend, WalkthroughBackend};
pub use models::{
    EntityMetadata, ScriptEntry, ScriptMap, ScriptMetadata, ScriptsSnapshot, Voice, VoiceStatus,
    Walkthrough, WalkthroughId,
};
