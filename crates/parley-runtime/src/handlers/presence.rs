use parley_core::{PresenceUpdate, SessionRef};
use tracing::info;

use super::EventHandlers;
use crate::context::UiContext;

impl EventHandlers {
    /// Presence change from a contact. Ignored entirely when the session hides
    /// status updates.
    pub fn handle_presence(ctx: &mut UiContext, session: &SessionRef, update: PresenceUpdate) {
        let Some(live) = session.upgrade() else {
            ctx.stats.record_unresolved(session, "presence");
            return;
        };
        if live.config().hide_status_updates {
            return;
        }

        info!(
            "[{}] Presence from {}: show: {} status: {} gone: {}",
            update
                .to
                .as_ref()
                .map(|to| to.to_string())
                .unwrap_or_default(),
            update.from,
            update.show,
            update.status,
            update.gone
        );
        ctx.surface.refresh_roster();

        let Some(account) = ctx.accounts.resolve(session) else {
            ctx.stats.record_unresolved(session, "presence");
            return;
        };
        let peer = update.from.bare();
        account
            .roster
            .update_presence(&peer, &update.show, &update.status, update.gone);
        ctx.surface.presence_updated(&account.id, &peer, &update);
    }
}
