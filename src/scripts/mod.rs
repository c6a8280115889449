//! Per-slide narration scripts: editing, persistence and generation

mod coordinator;

pub use coordinator::{CommitOutcome, RemoteUpdateOutcome, ScriptEditCoordinator};
