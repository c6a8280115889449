pub mod agent;
pub mod backend;
pub mod channel;
pub mod config;
pub mod connection;
pub mod http;
pub mod identity;
pub mod scripts;
pub mod session;
pub mod sync;
pub mod theme;
pub mod voice;
pub mod walkthrough;

pub use agent::{AgentConfig, AgentConfigStore, KnowledgeEntry, Persona};
pub use backend::{HttpBackend, ScriptEntry, ScriptMap, Voice, Walkthrough, WalkthroughBackend};
pub use channel::{
    ConnectionState, DataPacket, Envelope, LoopbackTransport, NatsRoomTransport, RoomTransport,
};
pub use config::Config;
pub use connection::ConnectionTracker;
pub use http::{create_router, AppState};
pub use scripts::ScriptEditCoordinator;
pub use session::{
    AgentRole, SessionParams, SessionSettings, SessionStatus, WalkthroughSession, WorkflowState,
};
pub use sync::{SlideSynchronizer, TranscriptSegment, TranscriptSynchronizer};
pub use theme::{Theme, ThemeColor};
pub use walkthrough::{DiscoveryPoller, WalkthroughCatalog};
