//! Conversation views and lazy binding
//!
//! A [`ConversationView`] is the per-peer state behind a conversation window.
//! The [`ConversationBinder`] owns an account's views and defers work aimed at
//! a peer whose view does not exist yet.

use std::collections::{HashMap, VecDeque};

use parley_core::{FileOffer, Jid, PeerSecurity};
use tracing::debug;

use crate::ui::ConversationPresenter;

/// Work waiting for a peer's view to be created
pub type Continuation = Box<dyn FnOnce(&mut ConversationView) + Send + 'static>;

/// A message queued for sending before the private channel existed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDelayed {
    pub tracer: u64,
    pub body: String,
}

// ----------------------------------------------------------------------------
// Conversation View
// ----------------------------------------------------------------------------

pub struct ConversationView {
    peer: Jid,
    presenter: Box<dyn ConversationPresenter>,
    enabled: bool,
    focused: bool,
    security_warning: bool,
    identity_warning: bool,
    private_started_shown: bool,
    private_ended_shown: bool,
    pending_delayed: Vec<PendingDelayed>,
    delayed_tracers: Vec<u64>,
}

impl ConversationView {
    pub fn new(peer: Jid, presenter: Box<dyn ConversationPresenter>, enabled: bool) -> Self {
        Self {
            peer,
            presenter,
            enabled,
            focused: false,
            security_warning: false,
            identity_warning: false,
            private_started_shown: false,
            private_ended_shown: false,
            pending_delayed: Vec::new(),
            delayed_tracers: Vec::new(),
        }
    }

    pub fn peer(&self) -> &Jid {
        &self.peer
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn security_warning(&self) -> bool {
        self.security_warning
    }

    pub fn identity_warning(&self) -> bool {
        self.identity_warning
    }

    pub fn private_started_shown(&self) -> bool {
        self.private_started_shown
    }

    pub fn private_ended_shown(&self) -> bool {
        self.private_ended_shown
    }

    pub fn pending_delayed(&self) -> &[PendingDelayed] {
        &self.pending_delayed
    }

    pub fn delayed_tracers(&self) -> &[u64] {
        &self.delayed_tracers
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.presenter.enabled(enabled);
    }

    pub fn focus(&mut self) {
        self.focused = true;
        self.presenter.focus();
    }

    pub fn display_notification(&mut self, text: &str) {
        self.presenter.notification(text);
    }

    /// Show `verified` or `unverified` depending on the peer's current state
    pub fn display_verified_or_not(
        &mut self,
        security: PeerSecurity,
        verified: &str,
        unverified: &str,
    ) {
        let text = if security.verified { verified } else { unverified };
        self.presenter.notification(text);
    }

    /// Recompute the "not private" warning from the peer's current state
    pub fn update_security_warning(&mut self, security: PeerSecurity) {
        self.security_warning = !security.encrypted;
        self.presenter.security_warning(self.security_warning);
    }

    pub fn remove_identity_warning(&mut self) {
        self.identity_warning = false;
        self.presenter.identity_warning(false);
    }

    /// Warn about an unverified identity on a private conversation
    pub fn show_identity_warning(&mut self, security: PeerSecurity) {
        if security.encrypted && !security.verified {
            self.identity_warning = true;
            self.presenter.identity_warning(true);
        }
    }

    pub fn mark_private_started_shown(&mut self) {
        self.private_started_shown = true;
        self.private_ended_shown = false;
    }

    pub fn mark_private_ended_shown(&mut self) {
        self.private_ended_shown = true;
        self.private_started_shown = false;
    }

    pub fn queue_delayed(&mut self, tracer: u64, body: impl Into<String>) {
        self.pending_delayed.push(PendingDelayed {
            tracer,
            body: body.into(),
        });
    }

    /// Hand every queued delayed message to the presenter and clear the queue
    pub fn append_pending_delayed(&mut self) {
        if self.pending_delayed.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending_delayed);
        self.presenter.pending_delayed_flushed(&pending);
    }

    pub fn delayed_message_sent(&mut self, tracer: u64) {
        self.pending_delayed.retain(|p| p.tracer != tracer);
        self.delayed_tracers.push(tracer);
        self.presenter.delayed_message_sent(tracer);
    }

    pub fn show_auth_secret_prompt(&mut self, question: Option<&str>) {
        self.presenter.auth_secret_prompt(question);
    }

    pub fn show_auth_success(&mut self) {
        self.presenter.auth_succeeded();
    }

    pub fn show_auth_failure(&mut self) {
        self.presenter.auth_failed();
    }

    pub fn file_transfer_offered(&mut self, offer: &FileOffer) {
        self.presenter.file_transfer_offered(offer);
    }

    pub fn file_transfer_progress(&mut self, sid: &str, received: u64) {
        self.presenter.file_transfer_progress(sid, received);
    }

    pub fn file_transfer_closed(&mut self, sid: &str, received: u64) {
        self.presenter.file_transfer_closed(sid, received);
    }
}

impl std::fmt::Debug for ConversationView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationView")
            .field("peer", &self.peer)
            .field("enabled", &self.enabled)
            .field("security_warning", &self.security_warning)
            .field("identity_warning", &self.identity_warning)
            .field("pending_delayed", &self.pending_delayed.len())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Conversation Binder
// ----------------------------------------------------------------------------

/// Per-account conversation views keyed by bare peer address, plus the
/// continuations waiting for views that do not exist yet
pub struct ConversationBinder {
    views: HashMap<Jid, ConversationView>,
    pending: HashMap<Jid, VecDeque<Continuation>>,
    enabled: bool,
}

impl Default for ConversationBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationBinder {
    pub fn new() -> Self {
        Self {
            views: HashMap::new(),
            pending: HashMap::new(),
            enabled: false,
        }
    }

    /// Run `continuation` on the peer's view now, or once the view exists
    pub fn now_or_later(&mut self, peer: &Jid, continuation: Continuation) {
        let peer = peer.bare();
        match self.views.get_mut(&peer) {
            Some(view) => continuation(view),
            None => {
                debug!("Deferring action until a conversation with {} exists", peer);
                self.pending.entry(peer).or_default().push_back(continuation);
            }
        }
    }

    /// Get the peer's view, creating it with `presenter` if absent. A new
    /// view first runs every continuation registered for the peer.
    pub fn open<F>(&mut self, peer: &Jid, focus: bool, presenter: F) -> &mut ConversationView
    where
        F: FnOnce() -> Box<dyn ConversationPresenter>,
    {
        let peer = peer.bare();
        let enabled = self.enabled;
        let pending = &mut self.pending;
        let view = self.views.entry(peer.clone()).or_insert_with(|| {
            let mut view = ConversationView::new(peer.clone(), presenter(), enabled);
            if let Some(queued) = pending.remove(&peer) {
                debug!("Running {} deferred actions for {}", queued.len(), peer);
                for continuation in queued {
                    continuation(&mut view);
                }
            }
            view
        });
        if focus {
            view.focus();
        }
        view
    }

    pub fn get(&self, peer: &Jid) -> Option<&ConversationView> {
        self.views.get(&peer.bare())
    }

    pub fn get_mut(&mut self, peer: &Jid) -> Option<&mut ConversationView> {
        self.views.get_mut(&peer.bare())
    }

    pub fn contains(&self, peer: &Jid) -> bool {
        self.views.contains_key(&peer.bare())
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Continuations still waiting for the peer's view
    pub fn pending_for(&self, peer: &Jid) -> usize {
        self.pending.get(&peer.bare()).map_or(0, VecDeque::len)
    }

    /// Enable or disable every existing view; views created later inherit it
    pub fn set_all_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        for view in self.views.values_mut() {
            view.set_enabled(enabled);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversationView> {
        self.views.values()
    }

    /// Close all views and drop every deferred continuation
    pub fn clear(&mut self) {
        self.views.clear();
        self.pending.clear();
    }
}
