//! Session collaborator seam
//!
//! A protocol session is owned by the account/connection layer. Events only
//! carry a [`SessionRef`], which never keeps the session alive.

use core::fmt;
use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};

use crate::errors::ParleyResult;
use crate::types::{Jid, SessionId};

// ----------------------------------------------------------------------------
// Session Trait
// ----------------------------------------------------------------------------

/// One live protocol session for an account
pub trait Session: Send + Sync {
    fn id(&self) -> SessionId;

    fn config(&self) -> &SessionConfig;

    /// Current roster snapshot as known by the session
    fn roster(&self) -> Vec<RosterEntry>;

    /// Security state of the conversation with `peer`, read at the time of
    /// the call
    fn peer_security(&self, peer: &Jid) -> PeerSecurity;

    /// Send an approve or deny response to a subscription request
    fn respond_to_subscription(&self, peer: &Jid, approve: bool) -> ParleyResult<()>;
}

// ----------------------------------------------------------------------------
// Session Data
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub account: Jid,
    /// Presence changes from peers are not shown
    #[serde(default)]
    pub hide_status_updates: bool,
}

impl SessionConfig {
    pub fn new(account: Jid) -> Self {
        Self {
            account,
            hide_status_updates: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerSecurity {
    pub encrypted: bool,
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub jid: Jid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_subscription")]
    pub subscription: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

fn default_subscription() -> String {
    "none".to_string()
}

impl RosterEntry {
    pub fn new(jid: Jid) -> Self {
        Self {
            jid,
            name: None,
            subscription: default_subscription(),
            groups: Vec::new(),
        }
    }
}

// ----------------------------------------------------------------------------
// Session Reference
// ----------------------------------------------------------------------------

/// Non-owning handle to the session an event came from
#[derive(Clone)]
pub struct SessionRef {
    id: SessionId,
    session: Weak<dyn Session>,
}

impl SessionRef {
    pub fn new(session: &Arc<dyn Session>) -> Self {
        Self {
            id: session.id(),
            session: Arc::downgrade(session),
        }
    }

    /// Build a reference from a concrete session type
    pub fn from_arc<S: Session + 'static>(session: &Arc<S>) -> Self {
        let session: Arc<dyn Session> = session.clone();
        Self::new(&session)
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The session, unless it has been torn down
    pub fn upgrade(&self) -> Option<Arc<dyn Session>> {
        self.session.upgrade()
    }

    pub fn is_alive(&self) -> bool {
        self.session.strong_count() > 0
    }
}

impl fmt::Debug for SessionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionRef")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}
