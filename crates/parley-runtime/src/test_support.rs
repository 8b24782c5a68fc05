//! Recording doubles for unit tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use parley_core::{
    AccountId, FileOffer, Jid, ParleyResult, PeerSecurity, PresenceUpdate, ReceivedMessage,
    ReconnectConfig, RosterEntry, Session, SessionConfig, SessionId, SessionRef,
};
use tokio::sync::Notify;

use crate::account::{Account, AccountRegistry, Roster};
use crate::context::UiContext;
use crate::conversation::{ConversationView, PendingDelayed};
use crate::reconnect::Reconnector;
use crate::ui::{AccountConnector, ConversationPresenter, SubscriptionResponse, UiSurface};

// ----------------------------------------------------------------------------
// Session
// ----------------------------------------------------------------------------

pub struct TestSession {
    id: SessionId,
    config: SessionConfig,
    roster: Mutex<Vec<RosterEntry>>,
    security: Mutex<HashMap<Jid, PeerSecurity>>,
    responses: Mutex<Vec<(Jid, bool)>>,
}

impl TestSession {
    pub fn new(account: &str) -> Self {
        Self {
            id: SessionId::generate(),
            config: SessionConfig::new(Jid::new(account)),
            roster: Mutex::new(Vec::new()),
            security: Mutex::new(HashMap::new()),
            responses: Mutex::new(Vec::new()),
        }
    }

    pub fn arc(account: &str) -> Arc<Self> {
        Arc::new(Self::new(account))
    }

    pub fn with_hidden_status(account: &str) -> Arc<Self> {
        let mut session = Self::new(account);
        session.config.hide_status_updates = true;
        Arc::new(session)
    }

    pub fn session_id(&self) -> SessionId {
        self.id
    }

    pub fn set_roster(&self, roster: Vec<RosterEntry>) {
        *self.roster.lock().unwrap() = roster;
    }

    pub fn set_security(&self, peer: &Jid, security: PeerSecurity) {
        self.security.lock().unwrap().insert(peer.bare(), security);
    }

    pub fn responses(&self) -> Vec<(Jid, bool)> {
        self.responses.lock().unwrap().clone()
    }
}

impl Session for TestSession {
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

/// A reference whose session is already gone
pub fn detached_session_ref(id: SessionId) -> SessionRef {
    let mut session = TestSession::new("detached@example.org");
    session.id = id;
    SessionRef::from_arc(&Arc::new(session))
}

// ----------------------------------------------------------------------------
// UI
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    RefreshRoster,
    RosterReplaced(AccountId, usize),
    Presence(AccountId, Jid, PresenceUpdate),
    Message(AccountId, ReceivedMessage),
    ConnectionFailure(AccountId),
    ConfirmSubscription(Jid),
    PresenterCreated(Jid, bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterCall {
    Notification(String),
    SecurityWarning(bool),
    IdentityWarning(bool),
    AuthPrompt(Option<String>),
    AuthSuccess,
    AuthFailure,
    DelayedSent(u64),
    PendingFlushed(Vec<u64>),
    Enabled(bool),
    Focus,
    TransferOffered(Option<String>),
    TransferProgress(String, u64),
    TransferClosed(String, u64),
}

pub struct RecordingPresenter {
    log: Arc<Mutex<Vec<PresenterCall>>>,
}

impl RecordingPresenter {
    pub fn new(log: Arc<Mutex<Vec<PresenterCall>>>) -> Self {
        Self { log }
    }

    fn push(&self, call: PresenterCall) {
        self.log.lock().unwrap().push(call);
    }
}

impl ConversationPresenter for RecordingPresenter {
    fn notification(&mut self, text: &str) {
        self.push(PresenterCall::Notification(text.to_string()));
    }

    fn security_warning(&mut self, visible: bool) {
        self.push(PresenterCall::SecurityWarning(visible));
    }

    fn identity_warning(&mut self, visible: bool) {
        self.push(PresenterCall::IdentityWarning(visible));
    }

    fn auth_secret_prompt(&mut self, question: Option<&str>) {
        self.push(PresenterCall::AuthPrompt(question.map(str::to_string)));
    }

    fn auth_succeeded(&mut self) {
        self.push(PresenterCall::AuthSuccess);
    }

    fn auth_failed(&mut self) {
        self.push(PresenterCall::AuthFailure);
    }

    fn delayed_message_sent(&mut self, tracer: u64) {
        self.push(PresenterCall::DelayedSent(tracer));
    }

    fn pending_delayed_flushed(&mut self, messages: &[PendingDelayed]) {
        self.push(PresenterCall::PendingFlushed(
            messages.iter().map(|m| m.tracer).collect(),
        ));
    }

    fn enabled(&mut self, enabled: bool) {
        self.push(PresenterCall::Enabled(enabled));
    }

    fn focus(&mut self) {
        self.push(PresenterCall::Focus);
    }

    fn file_transfer_offered(&mut self, offer: &FileOffer) {
        self.push(PresenterCall::TransferOffered(offer.name.clone()));
    }

    fn file_transfer_progress(&mut self, sid: &str, received: u64) {
        self.push(PresenterCall::TransferProgress(sid.to_string(), received));
    }

    fn file_transfer_closed(&mut self, sid: &str, received: u64) {
        self.push(PresenterCall::TransferClosed(sid.to_string(), received));
    }
}

type PresenterLogs = Arc<Mutex<HashMap<Jid, Arc<Mutex<Vec<PresenterCall>>>>>>;

struct RecordingSurface {
    calls: Arc<Mutex<Vec<SurfaceCall>>>,
    presenters: PresenterLogs,
    subscription_response: Arc<Mutex<SubscriptionResponse>>,
}

impl RecordingSurface {
    fn push(&self, call: SurfaceCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl UiSurface for RecordingSurface {
    fn refresh_roster(&mut self) {
        self.push(SurfaceCall::RefreshRoster);
    }

    fn roster_replaced(&mut self, account: &AccountId, roster: &Roster) {
        self.push(SurfaceCall::RosterReplaced(account.clone(), roster.len()));
    }

    fn presence_updated(&mut self, account: &AccountId, peer: &Jid, update: &PresenceUpdate) {
        self.push(SurfaceCall::Presence(
            account.clone(),
            peer.clone(),
            update.clone(),
        ));
    }

    fn message_received(&mut self, account: &AccountId, message: &ReceivedMessage) {
        self.push(SurfaceCall::Message(account.clone(), message.clone()));
    }

    fn connection_failure(&mut self, account: &AccountId, _reason: &str) {
        self.push(SurfaceCall::ConnectionFailure(account.clone()));
    }

    fn confirm_subscription(&mut self, _account: &AccountId, peer: &Jid) -> SubscriptionResponse {
        self.push(SurfaceCall::ConfirmSubscription(peer.clone()));
        *self.subscription_response.lock().unwrap()
    }

    fn conversation_presenter(
        &mut self,
        _account: &AccountId,
        peer: &Jid,
        focus: bool,
    ) -> Box<dyn ConversationPresenter> {
        self.push(SurfaceCall::PresenterCreated(peer.clone(), focus));
        let log = self
            .presenters
            .lock()
            .unwrap()
            .entry(peer.bare())
            .or_default()
            .clone();
        Box::new(RecordingPresenter::new(log))
    }
}

/// Read side of a recording surface
pub struct Recorder {
    calls: Arc<Mutex<Vec<SurfaceCall>>>,
    presenters: PresenterLogs,
    subscription_response: Arc<Mutex<SubscriptionResponse>>,
}

impl Recorder {
    pub fn surface_calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn presenter_calls(&self, peer: &Jid) -> Vec<PresenterCall> {
        self.presenters
            .lock()
            .unwrap()
            .get(&peer.bare())
            .map(|log| log.lock().unwrap().clone())
            .unwrap_or_default()
    }

    pub fn set_subscription_response(&self, response: SubscriptionResponse) {
        *self.subscription_response.lock().unwrap() = response;
    }
}

// ----------------------------------------------------------------------------
// Connector
// ----------------------------------------------------------------------------

#[derive(Default)]
pub struct CountingConnector {
    calls: Mutex<Vec<AccountId>>,
    notify: Notify,
}

impl CountingConnector {
    pub fn calls(&self) -> Vec<AccountId> {
        self.calls.lock().unwrap().clone()
    }

    pub async fn wait_for(&self, count: usize) {
        loop {
            let notified = self.notify.notified();
            if self.calls.lock().unwrap().len() >= count {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl AccountConnector for CountingConnector {
    async fn reconnect(&self, account: AccountId) -> ParleyResult<()> {
        self.calls.lock().unwrap().push(account);
        self.notify.notify_waiters();
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Context
// ----------------------------------------------------------------------------

/// A context with a recording surface. Needs a tokio runtime.
pub fn create_recorded_context() -> (UiContext, Recorder) {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let presenters: PresenterLogs = Arc::new(Mutex::new(HashMap::new()));
    let subscription_response = Arc::new(Mutex::new(SubscriptionResponse::Dismissed));
    let surface = RecordingSurface {
        calls: calls.clone(),
        presenters: presenters.clone(),
        subscription_response: subscription_response.clone(),
    };
    let reconnector = Reconnector::new(
        ReconnectConfig::fixed(5),
        Arc::new(CountingConnector::default()),
        tokio::runtime::Handle::current(),
    );
    let context = UiContext::new(AccountRegistry::new(), Box::new(surface), reconnector);
    (
        context,
        Recorder {
            calls,
            presenters,
            subscription_response,
        },
    )
}

pub fn create_test_context() -> UiContext {
    create_recorded_context().0
}

/// Add an account for the session's configured address and attach the session
pub fn attach_test_account(ctx: &mut UiContext, session: &Arc<TestSession>) -> SessionRef {
    let account = Account::new(session.config().account.clone());
    let id = account.id.clone();
    ctx.accounts.add(account).unwrap();
    ctx.accounts.attach_session(&id, session.session_id()).unwrap();
    SessionRef::from_arc(session)
}

/// Open an unfocused view on `account` for `peer`
pub fn open_test_view<'a>(
    ctx: &'a mut UiContext,
    account: &str,
    peer: &Jid,
) -> &'a mut ConversationView {
    let UiContext {
        accounts, surface, ..
    } = ctx;
    let account = accounts.get_mut(&AccountId::new(account)).unwrap();
    let id = account.id.clone();
    account
        .conversations
        .open(peer, false, || surface.conversation_presenter(&id, peer, false))
}
