use parley_core::{Jid, ReceivedMessage, SessionRef};

use super::EventHandlers;
use crate::context::UiContext;
use crate::conversation::ConversationView;

impl EventHandlers {
    pub fn handle_message(ctx: &mut UiContext, session: &SessionRef, message: ReceivedMessage) {
        match ctx.accounts.resolve(session) {
            Some(account) => ctx.surface.message_received(&account.id, &message),
            None => ctx.stats.record_unresolved(session, "message"),
        }
    }

    /// Show a session notification in the peer's conversation, opening an
    /// unfocused one if needed
    pub fn handle_notification(ctx: &mut UiContext, session: &SessionRef, peer: Jid, text: &str) {
        let text = ctx.surface.localize(text);
        if let Some(view) = Self::open_conversation(ctx, session, &peer, "notification") {
            view.display_notification(&text);
        }
    }

    pub fn handle_delayed_message_sent(
        ctx: &mut UiContext,
        session: &SessionRef,
        peer: Jid,
        tracer: u64,
    ) {
        if let Some(view) = Self::open_conversation(ctx, session, &peer, "delayed_message_sent") {
            view.delayed_message_sent(tracer);
        }
    }

    /// Open-or-create the unfocused conversation with `peer` on the session's
    /// account
    pub(crate) fn open_conversation<'a>(
        ctx: &'a mut UiContext,
        session: &SessionRef,
        peer: &Jid,
        event: &str,
    ) -> Option<&'a mut ConversationView> {
        let UiContext {
            accounts,
            surface,
            stats,
            ..
        } = ctx;
        match accounts.resolve(session) {
            Some(account) => {
                let id = &account.id;
                Some(
                    account
                        .conversations
                        .open(peer, false, || surface.conversation_presenter(id, peer, false)),
                )
            }
            None => {
                stats.record_unresolved(session, event);
                None
            }
        }
    }
}
