use parley_core::{LifecycleEvent, SessionRef};
use tracing::{debug, info};

use super::EventHandlers;
use crate::account::LifecycleState;
use crate::context::UiContext;

const CONNECTION_LOST: &str = "We lost connection to the server for unknown reasons.";

impl EventHandlers {
    /// Connection state changes. The roster view is refreshed whatever
    /// happens.
    pub fn handle_lifecycle(ctx: &mut UiContext, session: &SessionRef, event: LifecycleEvent) {
        match ctx.accounts.resolve(session) {
            Some(account) => match event {
                LifecycleEvent::Connected => {
                    info!("{} connected", account.id);
                    account.state = LifecycleState::Connected;
                    account.conversations.set_all_enabled(true);
                }
                LifecycleEvent::Disconnected => {
                    info!("{} disconnected", account.id);
                    account.state = LifecycleState::Disconnected;
                    account.conversations.set_all_enabled(false);
                }
                LifecycleEvent::ConnectionLost => {
                    let reason = ctx.surface.localize(CONNECTION_LOST);
                    ctx.surface.connection_failure(&account.id, &reason);
                    let handle = ctx.reconnector.schedule(account.id.clone());
                    account.set_pending_reconnect(handle);
                }
                LifecycleEvent::RosterReceived => {
                    if let Some(live) = session.upgrade() {
                        account.roster.apply_snapshot(live.roster());
                        debug!(
                            "{} roster replaced with {} contacts",
                            account.id,
                            account.roster.len()
                        );
                        ctx.surface.roster_replaced(&account.id, &account.roster);
                    }
                }
            },
            None => ctx.stats.record_unresolved(session, lifecycle_name(event)),
        }

        ctx.surface.refresh_roster();
    }
}

fn lifecycle_name(event: LifecycleEvent) -> &'static str {
    match event {
        LifecycleEvent::Connected => "connected",
        LifecycleEvent::Disconnected => "disconnected",
        LifecycleEvent::ConnectionLost => "connection_lost",
        LifecycleEvent::RosterReceived => "roster_received",
    }
}
