use serde::Serialize;

use super::params::AgentRole;
use super::workflow::{Affordances, WorkflowState};
use crate::backend::{ScriptMap, Voice, WalkthroughId};
use crate::channel::ConnectionState;
use crate::voice::MediaOwner;
use crate::walkthrough::WalkthroughEntry;

/// Snapshot of a walkthrough session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub brdge_id: String,

    /// Presentation name, or the id when the backend has none
    pub display_name: String,

    pub num_slides: u32,

    /// 1-based slide currently shown
    pub current_slide: u32,

    pub slide_url: String,

    pub user_id: String,

    pub role: AgentRole,

    pub connection: ConnectionState,

    pub microphone_enabled: bool,

    /// Flow currently holding the capture device, if any
    pub media_owner: Option<MediaOwner>,

    /// The info overlay is shown while no agent is connected
    pub info_overlay_visible: bool,

    pub workflow: WorkflowState,

    pub affordances: Affordances,

    /// Newest first
    pub walkthroughs: Vec<WalkthroughEntry>,

    pub selected_walkthrough: Option<WalkthroughId>,

    /// Persisted scripts with local edits applied
    pub scripts: ScriptMap,

    pub scripts_dirty: bool,

    /// A remote update arrived while local edits were pending
    pub scripts_conflict: bool,

    pub generating: bool,

    pub voices: Vec<Voice>,

    pub selected_voice: Option<String>,

    /// CSS custom properties for the accent colour
    pub theme: Vec<(&'static str, String)>,
}
