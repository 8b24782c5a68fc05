//! Shared helpers for router integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use parley_core::{
    AccountId, FileOffer, Jid, ParleyResult, PeerSecurity, PresenceUpdate, ReceivedMessage,
    RosterEntry, Session, SessionConfig, SessionId, SessionRef,
};
use parley_runtime::{
    Account, AccountConnector, ConversationPresenter, PendingDelayed, Roster, RouterBuilder,
    RouterConfig, RouterHandle, SubscriptionResponse, UiSurface,
};

// ----------------------------------------------------------------------------
// Session
// ----------------------------------------------------------------------------

pub struct ScriptedSession {
    id: SessionId,
    config: SessionConfig,
    pub roster: Mutex<Vec<RosterEntry>>,
    pub security: Mutex<HashMap<Jid, PeerSecurity>>,
    pub responses: Mutex<Vec<(Jid, bool)>>,
}

impl ScriptedSession {
    pub fn new(account: &str) -> Arc<Self> {
        Arc::new(Self {
            id: SessionId::generate(),
            config: SessionConfig::new(Jid::new(account)),
            roster: Mutex::new(Vec::new()),
            security: Mutex::new(HashMap::new()),
            responses: Mutex::new(Vec::new()),
        })
    }

    pub fn reference(self: &Arc<Self>) -> SessionRef {
        SessionRef::from_arc(self)
    }

    pub fn responses(&self) -> Vec<(Jid, bool)> {
        self.responses.lock().unwrap().clone()
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
        self.roster.lock().unwrap().clone()
    }

    fn peer_security(&self, peer: &Jid) -> PeerSecurity {
        self.security
            .lock()
            .unwrap()
            .get(&peer.bare())
            .copied()
            .unwrap_or_default()
    }

    fn respond_to_subscription(&self, peer: &Jid, approve: bool) -> ParleyResult<()> {
        self.responses.lock().unwrap().push((peer.clone(), approve));
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Recording UI
// ----------------------------------------------------------------------------

/// Everything the UI saw, tagged with the conversation it went to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCall {
    RefreshRoster,
    RosterReplaced(AccountId, usize),
    Presence(AccountId, Jid),
    Message(AccountId, String),
    ConnectionFailure(AccountId),
    ConfirmSubscription(Jid),
    Conversation(Jid, ViewCall),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCall {
    Opened,
    Notification(String),
    SecurityWarning(bool),
    IdentityWarning(bool),
    AuthPrompt(Option<String>),
    AuthSuccess,
    AuthFailure,
    DelayedSent(u64),
    PendingFlushed(usize),
    Enabled(bool),
    TransferOffered,
    TransferProgress(u64),
    TransferClosed(u64),
}

#[derive(Clone, Default)]
pub struct UiLog {
    calls: Arc<Mutex<Vec<UiCall>>>,
}

impl UiLog {
    pub fn calls(&self) -> Vec<UiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn view_calls(&self, peer: &str) -> Vec<ViewCall> {
        let peer = Jid::new(peer);
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                UiCall::Conversation(jid, view) if jid == peer => Some(view),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&UiCall) -> bool) -> usize {
        self.calls().iter().filter(|c| predicate(c)).count()
    }

    fn push(&self, call: UiCall) {
        self.calls.lock().unwrap().push(call);
    }
}

pub struct RecordingSurface {
    log: UiLog,
    response: SubscriptionResponse,
}

impl RecordingSurface {
    pub fn new(log: UiLog, response: SubscriptionResponse) -> Self {
        Self { log, response }
    }
}

impl UiSurface for RecordingSurface {
    fn refresh_roster(&mut self) {
        self.log.push(UiCall::RefreshRoster);
    }

    fn roster_replaced(&mut self, account: &AccountId, roster: &Roster) {
        self.log
            .push(UiCall::RosterReplaced(account.clone(), roster.len()));
    }

    fn presence_updated(&mut self, account: &AccountId, peer: &Jid, _update: &PresenceUpdate) {
        self.log.push(UiCall::Presence(account.clone(), peer.clone()));
    }

    fn message_received(&mut self, account: &AccountId, message: &ReceivedMessage) {
        self.log
            .push(UiCall::Message(account.clone(), message.body.clone()));
    }

    fn connection_failure(&mut self, account: &AccountId, _reason: &str) {
        self.log.push(UiCall::ConnectionFailure(account.clone()));
    }

    fn confirm_subscription(&mut self, _account: &AccountId, peer: &Jid) -> SubscriptionResponse {
        self.log.push(UiCall::ConfirmSubscription(peer.clone()));
        self.response
    }

    fn conversation_presenter(
        &mut self,
        _account: &AccountId,
        peer: &Jid,
        _focus: bool,
    ) -> Box<dyn ConversationPresenter> {
        self.log
            .push(UiCall::Conversation(peer.clone(), ViewCall::Opened));
        Box::new(RecordingPresenter {
            peer: peer.clone(),
            log: self.log.clone(),
        })
    }
}

struct RecordingPresenter {
    peer: Jid,
    log: UiLog,
}

impl RecordingPresenter {
    fn push(&self, call: ViewCall) {
        self.log.push(UiCall::Conversation(self.peer.clone(), call));
    }
}

impl ConversationPresenter for RecordingPresenter {
    fn notification(&mut self, text: &str) {
        self.push(ViewCall::Notification(text.to_string()));
    }

    fn security_warning(&mut self, visible: bool) {
        self.push(ViewCall::SecurityWarning(visible));
    }

    fn identity_warning(&mut self, visible: bool) {
        self.push(ViewCall::IdentityWarning(visible));
    }

    fn auth_secret_prompt(&mut self, question: Option<&str>) {
        self.push(ViewCall::AuthPrompt(question.map(str::to_string)));
    }

    fn auth_succeeded(&mut self) {
        self.push(ViewCall::AuthSuccess);
    }

    fn auth_failed(&mut self) {
        self.push(ViewCall::AuthFailure);
    }

    fn delayed_message_sent(&mut self, tracer: u64) {
        self.push(ViewCall::DelayedSent(tracer));
    }

    fn pending_delayed_flushed(&mut self, messages: &[PendingDelayed]) {
        self.push(ViewCall::PendingFlushed(messages.len()));
    }

    fn enabled(&mut self, enabled: bool) {
        self.push(ViewCall::Enabled(enabled));
    }

    fn file_transfer_offered(&mut self, _offer: &FileOffer) {
        self.push(ViewCall::TransferOffered);
    }

    fn file_transfer_progress(&mut self, _sid: &str, received: u64) {
        self.push(ViewCall::TransferProgress(received));
    }

    fn file_transfer_closed(&mut self, _sid: &str, received: u64) {
        self.push(ViewCall::TransferClosed(received));
    }
}

// ----------------------------------------------------------------------------
// Connector
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingConnector {
    calls: Mutex<Vec<AccountId>>,
}

impl RecordingConnector {
    pub fn calls(&self) -> Vec<AccountId> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccountConnector for RecordingConnector {
    async fn reconnect(&self, account: AccountId) -> ParleyResult<()> {
        self.calls.lock().unwrap().push(account);
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Router
// ----------------------------------------------------------------------------

pub struct TestRouter {
    pub handle: RouterHandle,
    pub log: UiLog,
    pub connector: Arc<RecordingConnector>,
}

/// Start a router with one account per session, each session attached
pub async fn start_router(
    sessions: &[&Arc<ScriptedSession>],
    response: SubscriptionResponse,
) -> TestRouter {
    start_router_with(RouterConfig::testing(), sessions, response).await
}

pub async fn start_router_with(
    config: RouterConfig,
    sessions: &[&Arc<ScriptedSession>],
    response: SubscriptionResponse,
) -> TestRouter {
    let log = UiLog::default();
    let connector = Arc::new(RecordingConnector::default());
    let mut builder = RouterBuilder::new()
        .with_config(config)
        .with_surface(Box::new(RecordingSurface::new(log.clone(), response)))
        .with_connector(connector.clone());
    for session in sessions {
        builder = builder.add_account(Account::new(session.config().account.clone()));
    }
    let handle = builder.start().expect("router should start");

    let attachments: Vec<(AccountId, SessionId)> = sessions
        .iter()
        .map(|s| (AccountId::from(&s.config().account), s.id()))
        .collect();
    handle
        .with_context(move |ctx| {
            for (account, session) in attachments {
                ctx.accounts.attach_session(&account, session).unwrap();
            }
        })
        .await
        .unwrap();

    TestRouter {
        handle,
        log,
        connector,
    }
}

pub fn create_test_jid(name: &str) -> Jid {
    Jid::new(format!("{}@example.org", name))
}
