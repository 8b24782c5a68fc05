//! Dispatch loop
//!
//! Single consumer of the event queue. Each event is matched to its handler
//! and the handler is submitted to the UI executor; the loop moves on without
//! waiting for the handler to run. If the UI loop has gone away, events are
//! still drained and counted as dropped so producers never block on a queue
//! nobody reads.

use parley_core::{EventCategory, EventKind, ParleyResult, SessionEvent};
use tracing::{debug, error, info, warn};

use crate::context::UiContext;
use crate::executor::UiExecutor;
use crate::handlers::EventHandlers;
use crate::queue::EventReceiver;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub received: u64,
    pub scheduled: u64,
    pub unsupported: u64,
    /// Events whose handler could not be submitted
    pub dropped: u64,
}

pub struct Dispatcher {
    receiver: EventReceiver,
    executor: UiExecutor,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new(receiver: EventReceiver, executor: UiExecutor) -> Self {
        Self {
            receiver,
            executor,
            stats: DispatchStats::default(),
        }
    }

    /// Dispatch until every producer has dropped its sender
    pub async fn run(mut self) -> DispatchStats {
        info!("Dispatcher starting");

        while let Some(event) = self.receiver.recv().await {
            self.stats.received += 1;
            let name = event.kind.name();
            let session_id = event.session.id();
            debug!("Dispatching {} from session {}", name, session_id);

            match self.dispatch(event) {
                Ok(true) => self.stats.scheduled += 1,
                Ok(false) => self.stats.unsupported += 1,
                Err(e) => {
                    self.stats.dropped += 1;
                    error!("Dropping {} event from session {}: {}", name, session_id, e);
                }
            }
        }

        info!(
            "Dispatcher stopped: {} received, {} scheduled, {} unsupported, {} dropped",
            self.stats.received, self.stats.scheduled, self.stats.unsupported, self.stats.dropped
        );
        self.stats
    }

    /// Submit the handler for `event`. Returns `false` for events without a
    /// handler.
    fn dispatch(&self, event: SessionEvent) -> ParleyResult<bool> {
        let SessionEvent { session, kind } = event;
        match kind {
            EventKind::Lifecycle { event } => {
                self.schedule(EventCategory::Lifecycle, move |ctx| {
                    EventHandlers::handle_lifecycle(ctx, &session, event)
                })
            }
            EventKind::Peer { event, from } => self.schedule(EventCategory::Peer, move |ctx| {
                EventHandlers::handle_peer(ctx, &session, event, from)
            }),
            EventKind::Presence(update) => {
                self.schedule(EventCategory::Presence, move |ctx| {
                    EventHandlers::handle_presence(ctx, &session, update)
                })
            }
            EventKind::Message(message) => self.schedule(EventCategory::Message, move |ctx| {
                EventHandlers::handle_message(ctx, &session, message)
            }),
            EventKind::Notification { peer, text } => {
                self.schedule(EventCategory::Notification, move |ctx| {
                    EventHandlers::handle_notification(ctx, &session, peer, &text)
                })
            }
            EventKind::DelayedMessageSent { peer, tracer } => {
                self.schedule(EventCategory::DelayedMessage, move |ctx| {
                    EventHandlers::handle_delayed_message_sent(ctx, &session, peer, tracer)
                })
            }
            EventKind::AuthHandshake { peer, event } => {
                self.schedule(EventCategory::AuthHandshake, move |ctx| {
                    EventHandlers::handle_auth_handshake(ctx, &session, peer, event)
                })
            }
            EventKind::Log { level, message } => self.schedule(EventCategory::Log, move |_ctx| {
                EventHandlers::handle_log(level, &message)
            }),
            EventKind::FileTransfer { peer, payload } => {
                self.schedule(EventCategory::FileTransfer, move |ctx| {
                    EventHandlers::handle_file_transfer(ctx, &session, peer, &payload)
                })
            }
            EventKind::Unsupported { kind } => {
                warn!("Unsupported event '{}' from session {}", kind, session.id());
                Ok(false)
            }
        }
    }

    fn schedule<F>(&self, category: EventCategory, job: F) -> ParleyResult<bool>
    where
        F: FnOnce(&mut UiContext) + Send + 'static,
    {
        self.executor.submit(category, job)?;
        Ok(true)
    }
}
