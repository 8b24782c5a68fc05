//! Accounts and session resolution
//!
//! An [`Account`] is one configured identity with its roster, conversation
//! views and in-band transfers. The [`AccountRegistry`] maps the session an
//! event came from back to its account.

use std::collections::{BTreeMap, HashMap};

use parley_core::{
    AccountId, IbbSessions, Jid, ParleyError, ParleyResult, RosterEntry, SessionError, SessionId,
    SessionRef,
};
use tokio::task::AbortHandle;
use tracing::{debug, info};

use crate::conversation::ConversationBinder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Disconnected,
    Connected,
}

// ----------------------------------------------------------------------------
// Roster
// ----------------------------------------------------------------------------

/// Last presence seen from a peer
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PeerPresence {
    pub show: String,
    pub status: String,
    pub online: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: BTreeMap<Jid, RosterEntry>,
    presence: HashMap<Jid, PeerPresence>,
}

impl Roster {
    /// Replace the contact list with `snapshot`, keyed by bare address.
    /// Known presence is kept for contacts that remain.
    pub fn apply_snapshot(&mut self, snapshot: Vec<RosterEntry>) {
        self.entries = snapshot
            .into_iter()
            .map(|mut entry| {
                entry.jid = entry.jid.bare();
                (entry.jid.clone(), entry)
            })
            .collect();
        let entries = &self.entries;
        self.presence.retain(|jid, _| entries.contains_key(jid));
    }

    pub fn update_presence(&mut self, peer: &Jid, show: &str, status: &str, gone: bool) {
        self.presence.insert(
            peer.bare(),
            PeerPresence {
                show: show.to_string(),
                status: status.to_string(),
                online: !gone,
            },
        );
    }

    pub fn get(&self, peer: &Jid) -> Option<&RosterEntry> {
        self.entries.get(&peer.bare())
    }

    pub fn presence(&self, peer: &Jid) -> Option<&PeerPresence> {
        self.presence.get(&peer.bare())
    }

    pub fn entries(&self) -> impl Iterator<Item = &RosterEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ----------------------------------------------------------------------------
// Account
// ----------------------------------------------------------------------------

pub struct Account {
    pub id: AccountId,
    pub jid: Jid,
    pub session: Option<SessionId>,
    pub state: LifecycleState,
    pub roster: Roster,
    pub conversations: ConversationBinder,
    pub transfers: IbbSessions,
    pending_reconnect: Option<AbortHandle>,
}

impl Account {
    pub fn new(jid: Jid) -> Self {
        Self {
            id: AccountId::from(&jid),
            jid,
            session: None,
            state: LifecycleState::default(),
            roster: Roster::default(),
            conversations: ConversationBinder::new(),
            transfers: IbbSessions::new(),
            pending_reconnect: None,
        }
    }

    /// Track a scheduled reconnection, cancelling any earlier one
    pub fn set_pending_reconnect(&mut self, handle: AbortHandle) {
        if let Some(previous) = self.pending_reconnect.replace(handle) {
            if !previous.is_finished() {
                debug!("Replacing pending reconnect for {}", self.id);
                previous.abort();
            }
        }
    }

    pub fn has_pending_reconnect(&self) -> bool {
        self.pending_reconnect
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn cancel_pending_reconnect(&mut self) {
        if let Some(handle) = self.pending_reconnect.take() {
            handle.abort();
        }
    }

    /// Release everything the account owns
    pub fn teardown(&mut self) {
        self.cancel_pending_reconnect();
        self.conversations.clear();
        self.transfers.clear();
        self.session = None;
        self.state = LifecycleState::Disconnected;
    }
}

impl Drop for Account {
    fn drop(&mut self) {
        self.cancel_pending_reconnect();
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("session", &self.session)
            .field("state", &self.state)
            .field("conversations", &self.conversations.len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Account Registry
// ----------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct AccountRegistry {
    accounts: Vec<Account>,
}

impl AccountRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, account: Account) -> ParleyResult<()> {
        if self.get(&account.id).is_some() {
            return Err(ParleyError::config_error(format!(
                "account {} is already configured",
                account.id
            )));
        }
        info!("Added account {}", account.id);
        self.accounts.push(account);
        Ok(())
    }

    /// Remove an account and tear it down
    pub fn remove(&mut self, id: &AccountId) -> Option<Account> {
        let index = self.accounts.iter().position(|a| &a.id == id)?;
        let mut account = self.accounts.remove(index);
        account.teardown();
        info!("Removed account {}", id);
        Some(account)
    }

    /// Bind a live session to an account. A session belongs to at most one
    /// account.
    pub fn attach_session(&mut self, id: &AccountId, session: SessionId) -> ParleyResult<()> {
        if let Some(owner) = self
            .accounts
            .iter()
            .find(|a| a.session == Some(session) && &a.id != id)
        {
            return Err(SessionError::AlreadyAttached {
                session_id: session,
                account: owner.id.to_string(),
            }
            .into());
        }
        let account = self.get_mut(id).ok_or_else(|| SessionError::AccountNotFound {
            account: id.to_string(),
        })?;
        account.session = Some(session);
        debug!("Attached session {} to {}", session, id);
        Ok(())
    }

    pub fn detach_session(&mut self, id: &AccountId) -> Option<SessionId> {
        self.get_mut(id).and_then(|account| account.session.take())
    }

    /// Owning account of a session that is still alive
    pub fn resolve(&mut self, session: &SessionRef) -> Option<&mut Account> {
        if !session.is_alive() {
            return None;
        }
        let id = session.id();
        self.accounts.iter_mut().find(|a| a.session == Some(id))
    }

    pub fn get(&self, id: &AccountId) -> Option<&Account> {
        self.accounts.iter().find(|a| &a.id == id)
    }

    pub fn get_mut(&mut self, id: &AccountId) -> Option<&mut Account> {
        self.accounts.iter_mut().find(|a| &a.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
