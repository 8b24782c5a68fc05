//! Event Queue
//!
//! Bounded multi-producer, single-consumer channel from protocol sessions to
//! the dispatcher. Producers wait for capacity; the queue never drops events.

use parley_core::{ChannelConfig, EventKind, ParleyError, ParleyResult, SessionEvent, SessionRef};
use tokio::sync::mpsc;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel buffer is full")]
    ChannelFull,
    #[error("Channel is closed")]
    ChannelClosed,
}

impl From<ChannelError> for ParleyError {
    fn from(err: ChannelError) -> Self {
        ParleyError::channel_error(err.to_string())
    }
}

pub type EventReceiver = mpsc::Receiver<SessionEvent>;

/// Producer side of the event queue; clone one per session
#[derive(Debug, Clone)]
pub struct EventSender {
    inner: mpsc::Sender<SessionEvent>,
}

impl EventSender {
    /// Enqueue an event, waiting for room if the queue is full
    pub async fn send(&self, event: SessionEvent) -> ParleyResult<()> {
        self.inner
            .send(event)
            .await
            .map_err(|_| ChannelError::ChannelClosed.into())
    }

    /// Enqueue `kind` on behalf of `session`
    pub async fn emit(&self, session: &SessionRef, kind: EventKind) -> ParleyResult<()> {
        self.send(SessionEvent::new(session.clone(), kind)).await
    }

    /// Enqueue without waiting; fails if the queue is full
    pub fn try_send(&self, event: SessionEvent) -> Result<(), ChannelError> {
        self.inner.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => ChannelError::ChannelFull,
            mpsc::error::TrySendError::Closed(_) => ChannelError::ChannelClosed,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }
}

/// Create the bounded session → dispatcher queue
pub fn create_event_queue(config: &ChannelConfig) -> (EventSender, EventReceiver) {
    let (inner, receiver) = mpsc::channel(config.event_buffer_size);
    (EventSender { inner }, receiver)
}
