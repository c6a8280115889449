//! Walkthrough session orchestration
//!
//! This module provides the `WalkthroughSession` that ties together:
//! - Session parameters and participant role
//! - Room connection and slide/transcript position sync
//! - Walkthrough discovery and script editing
//! - The recording → generating → reviewing → sharing workflow

mod engine;
mod guard;
mod params;
mod status;
mod workflow;

pub use engine::{ConnectOutcome, GenerateOutcome, SessionSettings, WalkthroughSession};
pub use guard::{Epoch, SessionGuard};
pub use params::{AgentRole, SessionParams};
pub use status::SessionStatus;
pub use workflow::{AffordanceInputs, Affordances, Workflow, WorkflowChange, WorkflowEvent, WorkflowState};
