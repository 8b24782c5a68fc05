//! Category handlers
//!
//! Handler bodies run on the UI context. Each one resolves the event's session
//! to its account and applies the event to the account's roster or
//! conversations. Events whose session resolves to nothing are logged,
//! counted and otherwise ignored.

mod auth;
mod file_transfer;
mod lifecycle;
mod message;
mod peer;
mod presence;

use parley_core::{Jid, LogLevel, PeerSecurity, SessionRef};
use tracing::{error, info, warn};

/// Handlers for every event category
pub struct EventHandlers;

impl EventHandlers {
    /// Route a session log line to the process log
    pub fn handle_log(level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => info!(">>> INFO {}", message),
            LogLevel::Warn => warn!(">>> WARN {}", message),
            LogLevel::Alert => error!(">>> ALERT {}", message),
        }
    }
}

/// Security state of `peer`, read from the session when this is called
pub(crate) fn current_security(session: &SessionRef, peer: &Jid) -> PeerSecurity {
    session
        .upgrade()
        .map(|live| live.peer_security(peer))
        .unwrap_or_default()
}
