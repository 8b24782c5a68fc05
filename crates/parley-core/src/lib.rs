//! Parley Core
//!
//! Shared types for the Parley session-event router: identifiers, the closed
//! event model produced by protocol sessions, the session collaborator seam,
//! the file-transfer wire data model, errors and configuration.

pub mod config;
pub mod errors;
pub mod event;
pub mod file_transfer;
pub mod session;
pub mod types;

// ----------------------------------------------------------------------------
// Public API Re-exports
// ----------------------------------------------------------------------------

pub use config::{ChannelConfig, ReconnectConfig, RouterConfig};
pub use errors::{CodecError, CodecResult, ParleyError, ParleyResult, SessionError};
pub use event::{
    AuthHandshakeEvent, EventCategory, EventKind, LifecycleEvent, LogLevel, PeerEventKind,
    PresenceUpdate, ReceivedMessage, SessionEvent,
};
pub use file_transfer::{
    FileOffer, FileRange, FileTransferElement, IbbClose, IbbData, IbbElement, IbbOpen, IbbSender,
    IbbSessions, Inbound, SequenceCheck, StanzaKind, MAX_STREAMS_PER_PEER,
};
pub use session::{PeerSecurity, RosterEntry, Session, SessionConfig, SessionRef};
pub use types::{AccountId, Jid, SessionId, Timestamp};
