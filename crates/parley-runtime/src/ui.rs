//! UI collaborator traits
//!
//! The router never draws anything. It drives a [`UiSurface`] (roster view,
//! dialogs, conversation factory) and one [`ConversationPresenter`] per open
//! conversation. Both are only called from the serialized UI context.

use async_trait::async_trait;
use parley_core::{AccountId, FileOffer, Jid, ParleyResult, PresenceUpdate, ReceivedMessage};

use crate::account::Roster;
use crate::conversation::PendingDelayed;

/// Answer from the subscription confirmation dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionResponse {
    Approve,
    Deny,
    /// Closed without an answer; the request stays pending
    Dismissed,
}

pub trait UiSurface: Send {
    /// Redraw the roster view
    fn refresh_roster(&mut self);

    /// An account's roster was replaced with a fresh snapshot
    fn roster_replaced(&mut self, account: &AccountId, roster: &Roster);

    /// `peer` is a bare address
    fn presence_updated(&mut self, account: &AccountId, peer: &Jid, update: &PresenceUpdate);

    fn message_received(&mut self, account: &AccountId, message: &ReceivedMessage);

    fn connection_failure(&mut self, account: &AccountId, reason: &str);

    /// Blocking modal asking whether `peer` may see our presence
    fn confirm_subscription(&mut self, account: &AccountId, peer: &Jid) -> SubscriptionResponse;

    /// Create the presenter for a new conversation view
    fn conversation_presenter(
        &mut self,
        account: &AccountId,
        peer: &Jid,
        focus: bool,
    ) -> Box<dyn ConversationPresenter>;

    fn localize(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Presentational calls for one conversation view
pub trait ConversationPresenter: Send {
    fn notification(&mut self, text: &str);
    fn security_warning(&mut self, visible: bool);
    fn identity_warning(&mut self, visible: bool);

    fn auth_secret_prompt(&mut self, question: Option<&str>);
    fn auth_succeeded(&mut self);
    fn auth_failed(&mut self);

    fn delayed_message_sent(&mut self, tracer: u64);
    fn pending_delayed_flushed(&mut self, messages: &[PendingDelayed]);

    fn enabled(&mut self, enabled: bool);
    fn focus(&mut self) {}

    fn file_transfer_offered(&mut self, offer: &FileOffer);
    fn file_transfer_progress(&mut self, sid: &str, received: u64);
    fn file_transfer_closed(&mut self, sid: &str, received: u64);
}

/// Re-establishes an account's connection after it was lost
#[async_trait]
pub trait AccountConnector: Send + Sync {
    async fn reconnect(&self, account: AccountId) -> ParleyResult<()>;
}
