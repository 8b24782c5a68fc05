//! Session events
//!
//! The closed set of events a protocol session can report to the router.
//! Every event carries a [`SessionRef`] to its origin; the payload types are
//! serializable so that event scripts can be replayed.

use serde::{Deserialize, Serialize};

use crate::session::SessionRef;
use crate::types::{Jid, Timestamp};

// ----------------------------------------------------------------------------
// Event Envelope
// ----------------------------------------------------------------------------

/// An event together with the session that produced it
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub session: SessionRef,
    pub kind: EventKind,
}

impl SessionEvent {
    pub fn new(session: SessionRef, kind: EventKind) -> Self {
        Self { session, kind }
    }
}

// ----------------------------------------------------------------------------
// Event Kinds
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    Lifecycle {
        event: LifecycleEvent,
    },
    Peer {
        event: PeerEventKind,
        from: Jid,
    },
    Presence(PresenceUpdate),
    Message(ReceivedMessage),
    Notification {
        peer: Jid,
        text: String,
    },
    DelayedMessageSent {
        peer: Jid,
        tracer: u64,
    },
    AuthHandshake {
        peer: Jid,
        event: AuthHandshakeEvent,
    },
    Log {
        level: LogLevel,
        message: String,
    },
    /// A file-transfer wire element (negotiation offer or in-band bytestream)
    FileTransfer {
        peer: Jid,
        payload: String,
    },
    /// An event kind the router has no handler for
    Unsupported {
        kind: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    Connected,
    Disconnected,
    ConnectionLost,
    RosterReceived,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerEventKind {
    IqReceived,
    ConversationEnded,
    NewKeysEstablished,
    KeysRenewed,
    SubscriptionRequest,
    Subscribed,
    Unsubscribe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceUpdate {
    pub from: Jid,
    #[serde(default)]
    pub to: Option<Jid>,
    #[serde(default)]
    pub show: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub gone: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedMessage {
    pub from: Jid,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default = "Timestamp::now")]
    pub timestamp: Timestamp,
    #[serde(default)]
    pub encrypted: bool,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AuthHandshakeEvent {
    /// The peer started a handshake; `question` is the prompt they attached
    SecretNeeded {
        #[serde(default)]
        question: Option<String>,
    },
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warn,
    Alert,
}

// ----------------------------------------------------------------------------
// Categories
// ----------------------------------------------------------------------------

/// Handler category an event is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Lifecycle,
    Peer,
    Presence,
    Message,
    Notification,
    DelayedMessage,
    AuthHandshake,
    Log,
    FileTransfer,
}

impl EventCategory {
    pub const ALL: [EventCategory; 9] = [
        EventCategory::Lifecycle,
        EventCategory::Peer,
        EventCategory::Presence,
        EventCategory::Message,
        EventCategory::Notification,
        EventCategory::DelayedMessage,
        EventCategory::AuthHandshake,
        EventCategory::Log,
        EventCategory::FileTransfer,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventCategory::Lifecycle => "lifecycle",
            EventCategory::Peer => "peer",
            EventCategory::Presence => "presence",
            EventCategory::Message => "message",
            EventCategory::Notification => "notification",
            EventCategory::DelayedMessage => "delayed_message",
            EventCategory::AuthHandshake => "auth_handshake",
            EventCategory::Log => "log",
            EventCategory::FileTransfer => "file_transfer",
        }
    }
}

impl EventKind {
    /// The handler category, or `None` when no handler exists
    pub fn category(&self) -> Option<EventCategory> {
        match self {
            EventKind::Lifecycle { .. } => Some(EventCategory::Lifecycle),
            EventKind::Peer { .. } => Some(EventCategory::Peer),
            EventKind::Presence(_) => Some(EventCategory::Presence),
            EventKind::Message(_) => Some(EventCategory::Message),
            EventKind::Notification { .. } => Some(EventCategory::Notification),
            EventKind::DelayedMessageSent { .. } => Some(EventCategory::DelayedMessage),
            EventKind::AuthHandshake { .. } => Some(EventCategory::AuthHandshake),
            EventKind::Log { .. } => Some(EventCategory::Log),
            EventKind::FileTransfer { .. } => Some(EventCategory::FileTransfer),
            EventKind::Unsupported { .. } => None,
        }
    }

    /// Stable name for logging
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Lifecycle { event } => match event {
                LifecycleEvent::Connected => "connected",
                LifecycleEvent::Disconnected => "disconnected",
                LifecycleEvent::ConnectionLost => "connection_lost",
                LifecycleEvent::RosterReceived => "roster_received",
            },
            EventKind::Peer { event, .. } => match event {
                PeerEventKind::IqReceived => "iq_received",
                PeerEventKind::ConversationEnded => "conversation_ended",
                PeerEventKind::NewKeysEstablished => "new_keys_established",
                PeerEventKind::KeysRenewed => "keys_renewed",
                PeerEventKind::SubscriptionRequest => "subscription_request",
                PeerEventKind::Subscribed => "subscribed",
                PeerEventKind::Unsubscribe => "unsubscribe",
            },
            EventKind::Presence(_) => "presence",
            EventKind::Message(_) => "message",
            EventKind::Notification { .. } => "notification",
            EventKind::DelayedMessageSent { .. } => "delayed_message_sent",
            EventKind::AuthHandshake { event, .. } => match event {
                AuthHandshakeEvent::SecretNeeded { .. } => "auth_secret_needed",
                AuthHandshakeEvent::Success => "auth_success",
                AuthHandshakeEvent::Failure => "auth_failure",
            },
            EventKind::Log { .. } => "log",
            EventKind::FileTransfer { .. } => "file_transfer",
            EventKind::Unsupported { .. } => "unsupported",
        }
    }
}
