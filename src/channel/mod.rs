//! Realtime room data channel
//!
//! - `messages`: the closed set of envelopes and their wire shapes
//! - `codec`: JSON encode/decode with central rejection of bad frames
//! - `transport`: the room transport trait and connection states
//! - `nats` / `loopback`: transport implementations

pub mod codec;
pub mod loopback;
pub mod messages;
pub mod nats;
pub mod transport;

pub use codec::{decode, decode_or_drop, decode_packet, encode, DecodeError};
pub use loopback::LoopbackTransport;
pub use messages::{
    AgentConfigMessage, DataPacket, Envelope, ScriptsUpdated, SlideUpdate,
    TranscriptPositionBody, TranscriptPositionMessage, WalkthroughCompleted,
};
pub use nats::NatsRoomTransport;
pub use transport::{ConnectionState, JoinRequest, RoomTransport};
