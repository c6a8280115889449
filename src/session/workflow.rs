use serde::Serialize;
use tracing::{debug, info};

use super::params::AgentRole;
use crate::channel::ConnectionState;

/// Top-level walkthrough workflow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowState {
    #[default]
    Idle,
    Recording,
    Generating,
    Reviewing,
    Sharing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowEvent {
    StartWalkthrough,
    StopWalkthrough,
    ConnectionLost,
    Generate { has_selection: bool },
    GenerationSucceeded,
    GenerationFailed,
    Share,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowChange {
    pub from: WorkflowState,
    pub to: WorkflowState,
}

/// Pure state machine; events that do not apply in the current state are
/// ignored rather than rejected
#[derive(Debug, Clone, Default)]
pub struct Workflow {
    state: WorkflowState,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn apply(&mut self, event: WorkflowEvent) -> Option<WorkflowChange> {
        use WorkflowEvent::*;
        use WorkflowState::*;

        let next = match (self.state, event) {
            (Idle, StartWalkthrough) => Recording,
            (Recording, StopWalkthrough | ConnectionLost) => Idle,
            (Idle | Recording | Reviewing, Generate { has_selection: true }) => Generating,
            (Generating, GenerationSucceeded) => Reviewing,
            (Generating, GenerationFailed) => Idle,
            (Reviewing, Share) => Sharing,
            (state, event) => {
                debug!("Ignoring {:?} in {:?}", event, state);
                return None;
            }
        };

        let change = WorkflowChange {
            from: self.state,
            to: next,
        };
        info!("Workflow: {:?} -> {:?}", change.from, change.to);
        self.state = next;
        Some(change)
    }
}

/// Inputs that decide which user actions are available
#[derive(Debug, Clone, Copy)]
pub struct AffordanceInputs {
    pub state: WorkflowState,
    pub connection: ConnectionState,
    pub role: AgentRole,
    pub has_selection: bool,
    pub has_scripts: bool,
    pub scripts_dirty: bool,
    pub current_slide: u32,
    pub num_slides: u32,
}

/// Which actions the UI may offer right now
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Affordances {
    pub start_walkthrough: bool,
    pub stop_walkthrough: bool,
    pub generate: bool,
    pub share: bool,
    pub play: bool,
    pub toggle_microphone: bool,
    pub previous_slide: bool,
    pub next_slide: bool,
    pub edit_scripts: bool,
    pub save_scripts: bool,
}

impl Affordances {
    pub fn from_inputs(inputs: &AffordanceInputs) -> Self {
        use WorkflowState::*;

        let generating = inputs.state == Generating;
        let connected = inputs.connection == ConnectionState::Connected;

        Self {
            start_walkthrough: inputs.state == Idle
                && inputs.role == AgentRole::Edit
                && inputs.connection == ConnectionState::Disconnected,
            stop_walkthrough: inputs.state == Recording
                && inputs.connection != ConnectionState::Disconnected,
            generate: inputs.has_selection && matches!(inputs.state, Idle | Recording | Reviewing),
            share: inputs.state == Reviewing,
            play: inputs.has_scripts && inputs.state != Recording && !generating,
            toggle_microphone: connected,
            previous_slide: inputs.current_slide > 1,
            next_slide: inputs.current_slide < inputs.num_slides,
            edit_scripts: inputs.has_scripts && !generating,
            save_scripts: inputs.scripts_dirty && !generating,
        }
    }
}
