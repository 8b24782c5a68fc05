//! Console UI and scripted sessions
//!
//! The router needs a UI surface, a reconnect connector and live sessions.
//! The console supplies all three: the surface and presenters write one line
//! per UI action to a [`Transcript`], and sessions answer from account
//! configuration instead of a network connection.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use parley_core::{
    AccountId, FileOffer, Jid, ParleyResult, PeerSecurity, PresenceUpdate, ReceivedMessage,
    RosterEntry, Session, SessionConfig, SessionId, SessionRef,
};
use parley_runtime::{
    AccountConnector, ConversationPresenter, PendingDelayed, Roster, SubscriptionResponse,
    UiSurface,
};
use tracing::info;

use crate::config::AccountConfig;

// ----------------------------------------------------------------------------
// Transcript
// ----------------------------------------------------------------------------

/// Shared record of console output, optionally echoed to stdout
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Arc<Mutex<Vec<String>>>,
    echo: bool,
}

impl Transcript {
    pub fn new(echo: bool) -> Self {
        Self {
            lines: Arc::default(),
            echo,
        }
    }

    pub fn line(&self, line: impl Into<String>) {
        let line = line.into();
        if self.echo {
            println!("{}", line);
        }
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

// ----------------------------------------------------------------------------
// Scripted Session
// ----------------------------------------------------------------------------

/// A session whose roster and peer security come from configuration
pub struct ScriptedSession {
    id: SessionId,
    config: SessionConfig,
    account: AccountConfig,
    transcript: Transcript,
}

impl ScriptedSession {
    pub fn new(account: AccountConfig, transcript: Transcript) -> Arc<Self> {
        let mut config = SessionConfig::new(account.jid.clone());
        config.hide_status_updates = account.hide_status_updates;
        Arc::new(Self {
            id: SessionId::generate(),
            config,
            account,
            transcript,
        })
    }

    pub fn account_id(&self) -> AccountId {
        self.account.id()
    }

    pub fn reference(self: &Arc<Self>) -> SessionRef {
        SessionRef::from_arc(self)
    }
}

impl Session for ScriptedSession {
    fn id(&self) -> SessionId {
        self.id
    }

    fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn roster(&self) -> Vec<RosterEntry> {
        self.account.roster.clone()
    }

    fn peer_security(&self, peer: &Jid) -> PeerSecurity {
        self.account.security_for(peer)
    }

    fn respond_to_subscription(&self, peer: &Jid, approve: bool) -> ParleyResult<()> {
        let answer = if approve { "approved" } else { "denied" };
        self.transcript.line(format!(
            "[{}] subscription from {} {}",
            self.account.jid, peer, answer
        ));
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Console Surface
// ----------------------------------------------------------------------------

pub struct ConsoleSurface {
    transcript: Transcript,
    subscription_response: SubscriptionResponse,
}

impl ConsoleSurface {
    pub fn new(transcript: Transcript, subscription_response: SubscriptionResponse) -> Self {
        Self {
            transcript,
            subscription_response,
        }
    }
}

impl UiSurface for ConsoleSurface {
    fn refresh_roster(&mut self) {}

    fn roster_replaced(&mut self, account: &AccountId, roster: &Roster) {
        self.transcript
            .line(format!("[{}] roster: {} contacts", account, roster.len()));
    }

    fn presence_updated(&mut self, account: &AccountId, peer: &Jid, update: &PresenceUpdate) {
        let state = if update.gone {
            "offline".to_string()
        } else if update.show.is_empty() {
            "available".to_string()
        } else {
            update.show.clone()
        };
        let mut line = format!("[{}] {} is {}", account, peer, state);
        if !update.status.is_empty() {
            line.push_str(&format!(" ({})", update.status));
        }
        self.transcript.line(line);
    }

    fn message_received(&mut self, account: &AccountId, message: &ReceivedMessage) {
        let lock = if message.encrypted { "*" } else { " " };
        self.transcript.line(format!(
            "[{}] {}{}: {}",
            account, lock, message.from, message.body
        ));
    }

    fn connection_failure(&mut self, account: &AccountId, reason: &str) {
        self.transcript.line(format!("[{}] {}", account, reason));
    }

    fn confirm_subscription(&mut self, account: &AccountId, peer: &Jid) -> SubscriptionResponse {
        self.transcript.line(format!(
            "[{}] {} wants to see your presence: {:?}",
            account, peer, self.subscription_response
        ));
        self.subscription_response
    }

    fn conversation_presenter(
        &mut self,
        account: &AccountId,
        peer: &Jid,
        focus: bool,
    ) -> Box<dyn ConversationPresenter> {
        let prefix = format!("[{} <> {}]", account, peer);
        if focus {
            self.transcript.line(format!("{} conversation opened", prefix));
        }
        Box::new(ConsolePresenter {
            prefix,
            transcript: self.transcript.clone(),
        })
    }
}

// ----------------------------------------------------------------------------
// Console Presenter
// ----------------------------------------------------------------------------

pub struct ConsolePresenter {
    prefix: String,
    transcript: Transcript,
}

impl ConsolePresenter {
    fn say(&self, text: impl std::fmt::Display) {
        self.transcript.line(format!("{} {}", self.prefix, text));
    }
}

impl ConversationPresenter for ConsolePresenter {
    fn notification(&mut self, text: &str) {
        self.say(text);
    }

    fn security_warning(&mut self, visible: bool) {
        if visible {
            self.say("warning: this conversation is not private");
        }
    }

    fn identity_warning(&mut self, visible: bool) {
        if visible {
            self.say("warning: peer identity is not verified");
        }
    }

    fn auth_secret_prompt(&mut self, question: Option<&str>) {
        match question {
            Some(question) => self.say(format!("peer asks: {}", question)),
            None => self.say("peer wants to authenticate with a shared secret"),
        }
    }

    fn auth_succeeded(&mut self) {
        self.say("authentication succeeded");
    }

    fn auth_failed(&mut self) {
        self.say("authentication failed");
    }

    fn delayed_message_sent(&mut self, tracer: u64) {
        self.say(format!("delayed message {} sent", tracer));
    }

    fn pending_delayed_flushed(&mut self, messages: &[PendingDelayed]) {
        for message in messages {
            self.say(format!("sending delayed: {}", message.body));
        }
    }

    fn enabled(&mut self, enabled: bool) {
        self.say(if enabled { "online" } else { "offline" });
    }

    fn file_transfer_offered(&mut self, offer: &FileOffer) {
        let name = offer.name.as_deref().unwrap_or("unnamed file");
        match offer.size {
            Some(size) => self.say(format!("offers {} ({} bytes)", name, size)),
            None => self.say(format!("offers {}", name)),
        }
    }

    fn file_transfer_progress(&mut self, sid: &str, received: u64) {
        self.say(format!("transfer {}: {} bytes", sid, received));
    }

    fn file_transfer_closed(&mut self, sid: &str, received: u64) {
        self.say(format!("transfer {} finished after {} bytes", sid, received));
    }
}

// ----------------------------------------------------------------------------
// Connector
// ----------------------------------------------------------------------------

/// Reconnects by announcing the attempt
pub struct ConsoleConnector {
    transcript: Transcript,
}

impl ConsoleConnector {
    pub fn new(transcript: Transcript) -> Self {
        Self { transcript }
    }
}

#[async_trait]
impl AccountConnector for ConsoleConnector {
    async fn reconnect(&self, account: AccountId) -> ParleyResult<()> {
        info!("Reconnecting {}", account);
        self.transcript.line(format!("[{}] reconnecting", account));
        Ok(())
    }
}
