//! Parley Runtime
//!
//! The session-event router:
//! - `queue`: ordered multi-producer event queue
//! - `dispatch`: the single consumer that routes each event to its handler
//! - `executor`: the serialized UI context handler bodies run on
//! - `handlers`: per-category event handling
//! - `account` and `conversation`: the state handlers mutate
//! - `router`: builder and handle tying it all together

pub mod account;
pub mod context;
pub mod conversation;
pub mod dispatch;
pub mod executor;
pub mod handlers;
pub mod queue;
pub mod reconnect;
pub mod router;
pub mod ui;

#[cfg(test)]
pub(crate) mod test_support;

pub use account::{Account, AccountRegistry, LifecycleState, PeerPresence, Roster};
pub use context::{HandlerStats, UiContext};
pub use conversation::{Continuation, ConversationBinder, ConversationView, PendingDelayed};
pub use dispatch::{DispatchStats, Dispatcher};
pub use executor::{create_ui_executor, UiExecutor, UiJob, UiLoop};
pub use handlers::EventHandlers;
pub use queue::{create_event_queue, ChannelError, EventReceiver, EventSender};
pub use reconnect::{jittered_delay, Reconnector};
pub use router::{RouterBuilder, RouterHandle};
pub use ui::{AccountConnector, ConversationPresenter, SubscriptionResponse, UiSurface};

// Re-export core types for convenience
pub use parley_core::{
    AccountId, EventCategory, EventKind, Jid, ParleyError, ParleyResult, RouterConfig,
    SessionEvent, SessionRef,
};
